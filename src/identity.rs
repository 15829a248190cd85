use serde::{Deserialize, Serialize};

/// A participant's stable id and display name for one session attempt
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub display_name: String,
}

impl Identity {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    /// Derive an identity from what the participant typed.
    ///
    /// The id is the lowercased name with each whitespace run replaced by
    /// `-`. A blank name joins as `Anonymous` with id `anonymous`.
    pub fn from_display_name(name: &str) -> Self {
        let name = Self::display_name_or_default(name);
        let id = name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase();

        Self {
            id,
            display_name: name,
        }
    }

    /// Landing-form fallback: a blank entry joins as `Anonymous`
    pub fn display_name_or_default(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            "Anonymous".to_string()
        } else {
            trimmed.to_string()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }
}
