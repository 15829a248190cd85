use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use meeting_room::{create_router, AppState, Config, CredentialIssuer, InMemoryUserDirectory};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meeting-room", version, about = "Token issuance for meeting rooms")]
struct Cli {
    /// Config file (without extension); missing files are ignored
    #[arg(long, global = true, default_value = "config/meeting-room")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the token endpoint
    Serve {
        /// Keep users in memory instead of upserting them upstream
        #[arg(long)]
        offline: bool,
    },
    /// Mint a token locally and print it
    Issue {
        user_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    match cli.command {
        Command::Serve { offline } => serve(cfg, offline).await,
        Command::Issue { user_id } => {
            let directory = Arc::new(InMemoryUserDirectory::new());
            let issuer = CredentialIssuer::with_directory(&cfg.stream, directory);
            let token = issuer
                .issue_token(&user_id)
                .await
                .with_context(|| format!("Failed to issue token for {}", user_id))?;
            println!("{}", token.as_str());
            Ok(())
        }
    }
}

async fn serve(cfg: Config, offline: bool) -> Result<()> {
    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {:?}", cfg.stream);
    info!("Default room: {}", cfg.call.room_id_or_generate());

    let issuer = if offline {
        info!("Offline mode: users are kept in memory");
        CredentialIssuer::with_directory(&cfg.stream, Arc::new(InMemoryUserDirectory::new()))
    } else {
        CredentialIssuer::from_config(&cfg.stream)
    };

    if !issuer.is_configured() {
        warn!("API key or secret not configured; token requests will fail");
    }

    let app = create_router(AppState::new(issuer));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}
