//! Durable session round-trips through the obfuscating file store.
//!
//! Covers the persistence contract: what `set_auth` writes, a restarted
//! process reads back identically; `clear_auth` leaves nothing behind; a
//! corrupted entry degrades to "logged out" instead of an error.

use std::fs;
use std::sync::Arc;

use adspay_session::session::{Session, SessionState, UserProfile, KEY_USER};
use adspay_session::store::{FileStore, SecureStore};
use tempfile::TempDir;

const ACCESS: &str = "persisted-access-token";
const REFRESH: &str = "persisted-refresh-token";

fn state_over(dir: &TempDir) -> SessionState {
    SessionState::new(SecureStore::new(Arc::new(FileStore::new(dir.path()))))
}

fn sample_user() -> UserProfile {
    UserProfile {
        username: "admin".to_string(),
        email: Some("admin@adspay.example".to_string()),
        roles: vec!["superadmin".to_string()],
    }
}

#[tokio::test]
async fn stored_entries_are_not_plaintext() {
    let dir = TempDir::new().unwrap();
    let state = state_over(&dir);

    state
        .set_auth(sample_user(), ACCESS, REFRESH, 1_700_000_000_000)
        .await
        .unwrap();

    for entry in fs::read_dir(dir.path()).unwrap() {
        let contents = fs::read_to_string(entry.unwrap().path()).unwrap();
        assert!(!contents.contains(ACCESS));
        assert!(!contents.contains(REFRESH));
        assert!(!contents.contains("admin@adspay.example"));
    }
}

#[tokio::test]
async fn restart_rehydrates_the_identical_tuple() {
    let dir = TempDir::new().unwrap();
    let state = state_over(&dir);

    state
        .set_auth(sample_user(), ACCESS, REFRESH, 1_700_000_000_000)
        .await
        .unwrap();
    let before = state.snapshot();

    // Simulated process restart: a fresh state over the same directory.
    let restarted = state_over(&dir);
    restarted.hydrate().await;

    assert_eq!(restarted.snapshot(), before);
}

#[tokio::test]
async fn clear_auth_leaves_no_readable_entries() {
    let dir = TempDir::new().unwrap();
    let state = state_over(&dir);

    state
        .set_auth(sample_user(), ACCESS, REFRESH, 1_700_000_000_000)
        .await
        .unwrap();
    state.clear_auth().await.unwrap();

    let restarted = state_over(&dir);
    restarted.hydrate().await;
    assert_eq!(restarted.snapshot(), Session::default());
}

#[tokio::test]
async fn corrupted_entry_degrades_to_logged_out_field() {
    let dir = TempDir::new().unwrap();
    let state = state_over(&dir);

    state
        .set_auth(sample_user(), ACCESS, REFRESH, 1_700_000_000_000)
        .await
        .unwrap();

    // Clobber one entry on disk; the others stay intact.
    fs::write(dir.path().join(KEY_USER), "not a sealed value").unwrap();

    let restarted = state_over(&dir);
    restarted.hydrate().await;

    let session = restarted.snapshot();
    assert!(session.user.is_none());
    assert_eq!(session.access_token.as_deref(), Some(ACCESS));
    assert_eq!(session.refresh_token.as_deref(), Some(REFRESH));
    assert_eq!(session.expires_at, Some(1_700_000_000_000));
}
