use serde::{Deserialize, Serialize};

/// Durable authentication state for one chat identity.
///
/// A record exists iff the identity has completed registration, i.e. it
/// has supplied a password and the digest was stored. The raw password
/// is never kept, only its one-way hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Hex-encoded one-way digest of the chosen password.
    pub password_hash: String,
    /// True iff an active authenticated session exists.
    pub logged_in: bool,
    /// True iff the privileged command was completed while logged in.
    pub privileged: bool,
    /// True iff the next free-text message from this identity is a
    /// password attempt for login rather than an unknown command.
    pub awaiting_password: bool,
}

impl UserRecord {
    pub fn new(password_hash: impl Into<String>) -> Self {
        Self {
            password_hash: password_hash.into(),
            logged_in: false,
            privileged: false,
            awaiting_password: false,
        }
    }
}

/// Strongly-typed partial update for a [`UserRecord`].
///
/// Only the fields that are `Some` are written; everything else is left
/// untouched on merge, or takes its default on create.
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub password_hash: Option<String>,
    pub logged_in: Option<bool>,
    pub privileged: Option<bool>,
    pub awaiting_password: Option<bool>,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hash = Some(hash.into());
        self
    }

    pub fn with_logged_in(mut self, logged_in: bool) -> Self {
        self.logged_in = Some(logged_in);
        self
    }

    pub fn with_privileged(mut self, privileged: bool) -> Self {
        self.privileged = Some(privileged);
        self
    }

    pub fn with_awaiting_password(mut self, awaiting: bool) -> Self {
        self.awaiting_password = Some(awaiting);
        self
    }

    /// Merge this patch into an existing record.
    pub fn apply_to(&self, record: &mut UserRecord) {
        if let Some(ref hash) = self.password_hash {
            record.password_hash = hash.clone();
        }
        if let Some(logged_in) = self.logged_in {
            record.logged_in = logged_in;
        }
        if let Some(privileged) = self.privileged {
            record.privileged = privileged;
        }
        if let Some(awaiting) = self.awaiting_password {
            record.awaiting_password = awaiting;
        }
    }

    /// Materialize a fresh record from this patch, defaulting omitted fields.
    pub fn into_record(self) -> UserRecord {
        UserRecord {
            password_hash: self.password_hash.unwrap_or_default(),
            logged_in: self.logged_in.unwrap_or(false),
            privileged: self.privileged.unwrap_or(false),
            awaiting_password: self.awaiting_password.unwrap_or(false),
        }
    }
}
