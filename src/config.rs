use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub call: CallConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Credentials and token policy for the backing real-time service
#[derive(Clone, Deserialize)]
pub struct StreamConfig {
    /// Server-side API key (`STREAM_API_KEY`)
    pub api_key: Option<String>,

    /// Server-side API secret (`STREAM_API_SECRET`), never logged
    pub api_secret: Option<String>,

    /// Key handed to clients; falls back to `api_key`
    pub public_api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Role assigned to every upserted user
    #[serde(default = "default_role")]
    pub default_role: String,

    #[serde(default = "default_token_validity")]
    pub token_validity_secs: u64,

    /// How far issued-at is backdated to absorb clock skew
    #[serde(default = "default_clock_skew")]
    pub clock_skew_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallConfig {
    #[serde(default = "default_call_type")]
    pub call_type: String,
    #[serde(default = "default_caption_language")]
    pub caption_language: String,
    #[serde(default = "default_join_timeout")]
    pub join_timeout_secs: u64,
    #[serde(default = "default_leave_timeout")]
    pub leave_timeout_secs: u64,
    /// Room the landing flow joins when none is given (`CALL_ID`)
    pub default_room_id: Option<String>,
}

fn default_service_name() -> String {
    "meeting-room".to_string()
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_base_url() -> String {
    "https://chat.stream-io-api.com".to_string()
}

fn default_role() -> String {
    "user".to_string()
}

fn default_token_validity() -> u64 {
    60 * 60 * 24
}

fn default_clock_skew() -> u64 {
    60
}

fn default_call_type() -> String {
    "default".to_string()
}

fn default_caption_language() -> String {
    "en".to_string()
}

fn default_join_timeout() -> u64 {
    30
}

fn default_leave_timeout() -> u64 {
    10
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            public_api_key: None,
            base_url: default_base_url(),
            default_role: default_role(),
            token_validity_secs: default_token_validity(),
            clock_skew_secs: default_clock_skew(),
        }
    }
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            call_type: default_call_type(),
            caption_language: default_caption_language(),
            join_timeout_secs: default_join_timeout(),
            leave_timeout_secs: default_leave_timeout(),
            default_room_id: None,
        }
    }
}

impl fmt::Debug for StreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[REDACTED]"))
            .field("public_api_key", &self.public_api_key)
            .field("base_url", &self.base_url)
            .field("default_role", &self.default_role)
            .field("token_validity_secs", &self.token_validity_secs)
            .field("clock_skew_secs", &self.clock_skew_secs)
            .finish()
    }
}

impl StreamConfig {
    /// Key exposed to clients
    pub fn client_api_key(&self) -> Option<&str> {
        self.public_api_key
            .as_deref()
            .or(self.api_key.as_deref())
            .filter(|key| !key.is_empty())
    }
}

impl CallConfig {
    /// Configured default room, or a fresh `meeting-xxxxxxxx` id
    pub fn room_id_or_generate(&self) -> String {
        match &self.default_room_id {
            Some(id) if !id.trim().is_empty() => id.clone(),
            _ => {
                let simple = uuid::Uuid::new_v4().simple().to_string();
                format!("meeting-{}", &simple[..8])
            }
        }
    }
}

impl Config {
    /// Load from an optional config file, `MEETING_ROOM__*` overrides and
    /// the conventional `STREAM_API_KEY` / `STREAM_API_SECRET` / `CALL_ID`
    /// variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("MEETING_ROOM")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        let mut cfg: Config = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        cfg.apply_env(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("STREAM_API_KEY") {
            self.stream.api_key = Some(key);
        }
        if let Some(secret) = non_empty("STREAM_API_SECRET") {
            self.stream.api_secret = Some(secret);
        }
        if let Some(key) = non_empty("NEXT_PUBLIC_STREAM_API_KEY") {
            self.stream.public_api_key = Some(key);
        }
        if let Some(room) = non_empty("CALL_ID") {
            self.call.default_room_id = Some(room);
        }
    }
}
