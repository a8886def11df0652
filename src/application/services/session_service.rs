//! Session service - the authentication state machine
//!
//! Interprets each incoming event against the identity's durable record
//! and the transient pending-registration set, mutates the store, and
//! produces the reply to send back. Per-identity state is derived, never
//! stored as an enum:
//!
//! Anonymous -> PendingPassword -> Registered -> AwaitingLoginPassword
//! -> LoggedIn -> Privileged

use std::collections::HashSet;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::application::errors::BotError;
use crate::domain::entities::{Content, Incoming, RecordPatch, Reply};
use crate::domain::traits::UserStore;

const REPLY_START: &str = "Hi! I'm the gatekeeper bot.";
const REPLY_HELP: &str = "Commands:\n\n\
    /help - this message\n\
    /register - create an account\n\
    /login - sign in\n\
    /logout - sign out\n\
    /luxury - the privileged command";
const REPLY_ALREADY_REGISTERED: &str = "You are already registered.";
const REPLY_REGISTER_PROMPT: &str = "Enter a password to register:";
const REPLY_EMPTY_PASSWORD: &str = "Password cannot be empty. Enter a password:";
const REPLY_REGISTERED: &str = "Registration successful! Now sign in: /login";
const REPLY_NOT_REGISTERED: &str = "You are not registered. Use /register.";
const REPLY_ALREADY_LOGGED_IN: &str = "You are already logged in.";
const REPLY_LOGIN_PROMPT: &str = "Enter your password to sign in:";
const REPLY_LOGGED_IN: &str = "Signed in successfully!";
const REPLY_WRONG_PASSWORD: &str = "Wrong password.";
const REPLY_LOGGED_OUT: &str = "Signed out successfully.";
const REPLY_NOT_AUTHORIZED: &str = "You are not signed in.";
const REPLY_LUXURY_GRANTED: &str = "Heavy luxury granted.";
const REPLY_LOGIN_FIRST: &str = "Sign in first: /login";
const REPLY_UNKNOWN: &str = "Unknown command. Use /help.";

/// The session/authentication state machine.
///
/// Safe to share across tasks: record access goes through the injected
/// store (atomic upsert per identity), and the pending-registration set
/// sits behind its own lock. Pending registrations are process-wide
/// transient state; a restart drops them, which is accepted.
pub struct SessionService {
    store: Arc<dyn UserStore>,
    pending: RwLock<HashSet<String>>,
}

impl SessionService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self {
            store,
            pending: RwLock::new(HashSet::new()),
        }
    }

    /// Handle one incoming event and produce the reply for its sender.
    ///
    /// Only store failures escape as errors; every guard violation,
    /// validation failure and hash mismatch is answered with a reply.
    pub async fn handle(&self, event: &Incoming) -> Result<Reply, BotError> {
        match &event.content {
            Content::Command(name) => self.handle_command(&event.identity, name).await,
            Content::Text(text) => self.handle_text(&event.identity, text).await,
        }
    }

    async fn handle_command(&self, identity: &str, name: &str) -> Result<Reply, BotError> {
        match name {
            "start" => Ok(Reply::text(REPLY_START)),
            "help" => Ok(Reply::text(REPLY_HELP)),
            "register" => self.register(identity).await,
            "login" => self.login(identity).await,
            "logout" => self.logout(identity).await,
            "luxury" => self.luxury(identity).await,
            _ => Ok(Reply::text(REPLY_UNKNOWN)),
        }
    }

    /// /register - mark the identity pending; the record itself is only
    /// created once the password arrives.
    async fn register(&self, identity: &str) -> Result<Reply, BotError> {
        if self.store.get(identity).await?.is_some() {
            return Ok(Reply::text(REPLY_ALREADY_REGISTERED));
        }

        self.pending.write().await.insert(identity.to_string());
        tracing::debug!(identity, "registration started");
        Ok(Reply::clearing_keyboard(REPLY_REGISTER_PROMPT))
    }

    /// /login - arm the awaiting-password flag on the durable record.
    async fn login(&self, identity: &str) -> Result<Reply, BotError> {
        let Some(record) = self.store.get(identity).await? else {
            return Ok(Reply::text(REPLY_NOT_REGISTERED));
        };
        if record.logged_in {
            return Ok(Reply::text(REPLY_ALREADY_LOGGED_IN));
        }

        self.store
            .upsert(identity, RecordPatch::new().with_awaiting_password(true))
            .await?;
        Ok(Reply::text(REPLY_LOGIN_PROMPT))
    }

    /// /logout - clears the login flag; always drops any stale pending
    /// registration for the identity.
    async fn logout(&self, identity: &str) -> Result<Reply, BotError> {
        self.pending.write().await.remove(identity);

        match self.store.get(identity).await? {
            Some(record) if record.logged_in => {
                self.store
                    .upsert(identity, RecordPatch::new().with_logged_in(false))
                    .await?;
                tracing::info!(identity, "logged out");
                Ok(Reply::text(REPLY_LOGGED_OUT))
            }
            _ => Ok(Reply::text(REPLY_NOT_AUTHORIZED)),
        }
    }

    /// /luxury - the single gated action. Authorization is checked at
    /// grant time; the flag stays set after logout.
    async fn luxury(&self, identity: &str) -> Result<Reply, BotError> {
        match self.store.get(identity).await? {
            Some(record) if record.logged_in => {
                self.store
                    .upsert(identity, RecordPatch::new().with_privileged(true))
                    .await?;
                tracing::info!(identity, "privileged access granted");
                Ok(Reply::text(REPLY_LUXURY_GRANTED))
            }
            _ => Ok(Reply::text(REPLY_LOGIN_FIRST)),
        }
    }

    /// Free text is a password attempt when the identity is waiting for
    /// one, otherwise an unknown command. Pending registration is checked
    /// strictly before the record's awaiting flag; an identity can only
    /// be in one of the two waiting modes.
    async fn handle_text(&self, identity: &str, text: &str) -> Result<Reply, BotError> {
        if self.pending.read().await.contains(identity) {
            return self.finish_registration(identity, text).await;
        }

        if let Some(record) = self.store.get(identity).await? {
            if record.awaiting_password {
                return self.check_login_password(identity, &record.password_hash, text).await;
            }
        }

        Ok(Reply::text(REPLY_UNKNOWN))
    }

    async fn finish_registration(&self, identity: &str, text: &str) -> Result<Reply, BotError> {
        let password = text.trim();
        if password.is_empty() {
            // Identity stays pending.
            return Ok(Reply::text(REPLY_EMPTY_PASSWORD));
        }

        self.store
            .upsert(
                identity,
                RecordPatch::new().with_password_hash(hash_password(password)),
            )
            .await?;
        self.pending.write().await.remove(identity);
        tracing::info!(identity, "registered");
        Ok(Reply::text(REPLY_REGISTERED))
    }

    /// On mismatch the awaiting flag is deliberately retained, so the
    /// user can retry without re-issuing /login.
    async fn check_login_password(
        &self,
        identity: &str,
        stored_hash: &str,
        text: &str,
    ) -> Result<Reply, BotError> {
        let attempt = hash_password(text.trim());
        if !constant_time_eq(attempt.as_bytes(), stored_hash.as_bytes()) {
            tracing::debug!(identity, "failed login attempt");
            return Ok(Reply::text(REPLY_WRONG_PASSWORD));
        }

        self.store
            .upsert(
                identity,
                RecordPatch::new()
                    .with_logged_in(true)
                    .with_awaiting_password(false),
            )
            .await?;
        tracing::info!(identity, "logged in");
        Ok(Reply::text(REPLY_LOGGED_IN))
    }
}

/// One-way digest of a password. Deterministic so stored and attempted
/// passwords compare by digest alone.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
