//! End-to-end session flow tests
//! Run with: cargo test --test session_flow_test

use std::sync::Arc;

use gatekeeper_bot::application::messaging::MessageParser;
use gatekeeper_bot::application::services::SessionService;
use gatekeeper_bot::domain::entities::Reply;
use gatekeeper_bot::domain::traits::UserStore;
use gatekeeper_bot::infrastructure::database::SqliteStore;
use gatekeeper_bot::infrastructure::storage::MemoryStore;

struct Harness {
    store: Arc<dyn UserStore>,
    sessions: SessionService,
    parser: MessageParser,
}

impl Harness {
    fn in_memory() -> Self {
        let store: Arc<dyn UserStore> = Arc::new(MemoryStore::new());
        Self {
            sessions: SessionService::new(store.clone()),
            store,
            parser: MessageParser::new("/"),
        }
    }

    fn sqlite() -> Self {
        let store: Arc<dyn UserStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        Self {
            sessions: SessionService::new(store.clone()),
            store,
            parser: MessageParser::new("/"),
        }
    }

    async fn send(&self, identity: &str, text: &str) -> Reply {
        self.sessions
            .handle(&self.parser.parse(identity, text))
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn full_journey_for_identity_42() {
    let h = Harness::in_memory();

    let reply = h.send("42", "/register").await;
    assert!(reply.text.contains("password"), "expected prompt: {}", reply.text);

    let reply = h.send("42", "hunter2").await;
    assert!(reply.text.contains("Registration successful"));

    let reply = h.send("42", "/login").await;
    assert!(reply.text.contains("password"));

    let reply = h.send("42", "hunter2").await;
    assert!(reply.text.contains("Signed in"));

    let reply = h.send("42", "/luxury").await;
    assert!(reply.text.contains("luxury"));

    let reply = h.send("42", "/logout").await;
    assert!(reply.text.contains("Signed out"));

    let reply = h.send("42", "/luxury").await;
    assert!(reply.text.contains("Sign in first"));
}

#[tokio::test]
async fn register_then_text_creates_exactly_one_record() {
    let h = Harness::in_memory();

    assert!(h.store.get("42").await.unwrap().is_none());
    h.send("42", "/register").await;
    // /register alone creates nothing; the record appears with the password.
    assert!(h.store.get("42").await.unwrap().is_none());

    h.send("42", "hunter2").await;
    let record = h.store.get("42").await.unwrap().unwrap();
    assert!(!record.password_hash.is_empty());
    assert_ne!(record.password_hash, "hunter2");
    assert!(!record.logged_in);

    let reply = h.send("42", "/register").await;
    assert!(reply.text.contains("already registered"));
}

#[tokio::test]
async fn unregistered_identity_is_rejected_everywhere() {
    let h = Harness::in_memory();

    let reply = h.send("9", "/login").await;
    assert!(reply.text.contains("not registered"));
    let reply = h.send("9", "/logout").await;
    assert!(reply.text.contains("not signed in"));
    let reply = h.send("9", "/luxury").await;
    assert!(reply.text.contains("Sign in first"));

    assert!(h.store.get("9").await.unwrap().is_none());
}

#[tokio::test]
async fn password_round_trip() {
    let h = Harness::in_memory();
    h.send("42", "/register").await;
    h.send("42", "correct horse battery staple").await;

    h.send("42", "/login").await;
    let reply = h.send("42", "wrong horse").await;
    assert!(reply.text.contains("Wrong password"));
    assert!(!h.store.get("42").await.unwrap().unwrap().logged_in);

    let reply = h.send("42", "correct horse battery staple").await;
    assert!(reply.text.contains("Signed in"));
    assert!(h.store.get("42").await.unwrap().unwrap().logged_in);
}

#[tokio::test]
async fn logout_is_not_idempotent_on_replies() {
    let h = Harness::in_memory();
    h.send("42", "/register").await;
    h.send("42", "pw").await;
    h.send("42", "/login").await;
    h.send("42", "pw").await;

    let reply = h.send("42", "/logout").await;
    assert!(reply.text.contains("Signed out"));
    let reply = h.send("42", "/logout").await;
    assert!(reply.text.contains("not signed in"));
}

#[tokio::test]
async fn privilege_grant_requires_active_session() {
    let h = Harness::in_memory();
    h.send("42", "/register").await;
    h.send("42", "pw").await;
    h.send("42", "/login").await;
    h.send("42", "pw").await;
    h.send("42", "/luxury").await;

    let record = h.store.get("42").await.unwrap().unwrap();
    assert!(record.privileged);

    h.send("42", "/logout").await;
    let reply = h.send("42", "/luxury").await;
    assert!(reply.text.contains("Sign in first"));
    // The flag itself survives logout; only the re-grant is gated.
    assert!(h.store.get("42").await.unwrap().unwrap().privileged);
}

#[tokio::test]
async fn empty_password_leaves_identity_pending_without_record() {
    let h = Harness::in_memory();
    h.send("7", "/register").await;

    let reply = h.send("7", "   ").await;
    assert!(reply.text.contains("cannot be empty"));
    assert!(h.store.get("7").await.unwrap().is_none());

    let reply = h.send("7", "s3cret").await;
    assert!(reply.text.contains("Registration successful"));
    assert!(h.store.get("7").await.unwrap().is_some());
}

#[tokio::test]
async fn identities_do_not_interfere() {
    let h = Harness::in_memory();
    h.send("1", "/register").await;
    h.send("2", "/register").await;
    h.send("1", "alpha").await;
    h.send("2", "beta").await;

    h.send("1", "/login").await;
    // 2's password does not open 1's session.
    let reply = h.send("1", "beta").await;
    assert!(reply.text.contains("Wrong password"));
    let reply = h.send("1", "alpha").await;
    assert!(reply.text.contains("Signed in"));

    assert!(h.store.get("1").await.unwrap().unwrap().logged_in);
    assert!(!h.store.get("2").await.unwrap().unwrap().logged_in);
}

#[tokio::test]
async fn whole_flow_works_on_sqlite_too() {
    let h = Harness::sqlite();

    h.send("42", "/register").await;
    h.send("42", "hunter2").await;
    h.send("42", "/login").await;
    h.send("42", "hunter2").await;
    let reply = h.send("42", "/luxury").await;
    assert!(reply.text.contains("luxury"));

    let record = h.store.get("42").await.unwrap().unwrap();
    assert!(record.logged_in);
    assert!(record.privileged);
}

#[tokio::test]
async fn start_and_help_touch_no_state() {
    let h = Harness::in_memory();
    let reply = h.send("42", "/start").await;
    assert!(!reply.text.is_empty());
    let reply = h.send("42", "/help").await;
    assert!(reply.text.contains("/register"));
    assert!(h.store.get("42").await.unwrap().is_none());
}
