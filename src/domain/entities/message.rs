use chrono::{DateTime, Utc};

/// Message content after parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Free text, possibly a password attempt.
    Text(String),
    /// A `/command` token, prefix stripped.
    Command(String),
}

impl Content {
    pub fn text(&self) -> Option<&str> {
        match self {
            Content::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_command(&self) -> bool {
        matches!(self, Content::Command(_))
    }
}

/// An incoming event from a chat platform: who said what.
#[derive(Debug, Clone)]
pub struct Incoming {
    pub id: String,
    /// Opaque stable identifier for the conversation participant.
    pub identity: String,
    pub content: Content,
    pub timestamp: DateTime<Utc>,
    /// Raw platform payload, if the adapter kept it.
    pub raw: Option<serde_json::Value>,
}

impl Incoming {
    pub fn new(identity: impl Into<String>, content: Content) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            identity: identity.into(),
            content,
            timestamp: Utc::now(),
            raw: None,
        }
    }

    pub fn from_text(identity: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(identity, Content::Text(text.into()))
    }

    pub fn from_command(identity: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(identity, Content::Command(name.into()))
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }
}

/// An outbound reply routed back to the identity that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Ask the platform to drop any custom reply keyboard, so the user
    /// types the password on a plain input.
    pub clear_keyboard: bool,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            clear_keyboard: false,
        }
    }

    pub fn clearing_keyboard(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            clear_keyboard: true,
        }
    }
}
