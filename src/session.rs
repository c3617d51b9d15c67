//! The session tuple and its process-wide state handle.
//!
//! A [`Session`] is the tuple of user identity, token pair, and absolute
//! expiry. [`SessionState`] owns the current tuple behind a watch channel:
//! the refresh scheduler subscribes to changes, while the gateway and the
//! route guard read synchronous snapshots. Every mutation persists through
//! the [`SecureStore`] first, so a restarted process rehydrates the same
//! tuple it last wrote.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::error::SessionError;
use crate::store::SecureStore;

/// Durable storage keys. Each value is independently obfuscated.
pub const KEY_ACCESS_TOKEN: &str = "accessToken";
pub const KEY_REFRESH_TOKEN: &str = "refreshToken";
pub const KEY_USER: &str = "user";
pub const KEY_EXPIRES_AT: &str = "expiresAt";

/// Authenticated user identity.
///
/// The shape varies by flow: the password login derives a username-only
/// profile, while the code-exchange flow enriches it with email and roles
/// from a profile fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// The session tuple.
///
/// `expires_at` is an absolute deadline in epoch milliseconds, never a
/// duration: every staleness check is `now >= expires_at`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<UserProfile>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>,
}

impl Session {
    /// A user is considered authenticated exactly when an access token is
    /// present.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Whether the access token's deadline has passed. A session without a
    /// deadline is never stale (there is nothing to compare against).
    pub fn is_stale(&self, now_ms: i64) -> bool {
        matches!(self.expires_at, Some(deadline) if now_ms >= deadline)
    }
}

/// Cheaply clonable handle to the current session.
///
/// One instance is built at application start and handed to the scheduler,
/// the gateway, and the guard. Mutations originate from a single logical
/// flow at a time (login, refresh, or logout); concurrent refresh attempts
/// are serialized by [`crate::auth::Refresher`], not here.
#[derive(Clone)]
pub struct SessionState {
    store: SecureStore,
    current: Arc<watch::Sender<Session>>,
}

impl SessionState {
    /// Create an empty session over the given store. Call
    /// [`SessionState::hydrate`] to load whatever the store holds.
    pub fn new(store: SecureStore) -> Self {
        let (current, _) = watch::channel(Session::default());
        Self {
            store,
            current: Arc::new(current),
        }
    }

    /// Best-effort load of the persisted tuple.
    ///
    /// Missing or unreadable entries hydrate as `None` fields; this never
    /// fails, so a corrupted store degrades to "logged out" rather than a
    /// startup error.
    pub async fn hydrate(&self) {
        let access_token = self.store.get(KEY_ACCESS_TOKEN).await;
        let refresh_token = self.store.get(KEY_REFRESH_TOKEN).await;
        let user = match self.store.get(KEY_USER).await {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(user) => Some(user),
                Err(error) => {
                    debug!(%error, "stored user profile unreadable, ignoring");
                    None
                }
            },
            None => None,
        };
        let expires_at = self
            .store
            .get(KEY_EXPIRES_AT)
            .await
            .and_then(|raw| raw.parse::<i64>().ok());

        self.current.send_replace(Session {
            user,
            access_token,
            refresh_token,
            expires_at,
        });
    }

    /// Replace the whole tuple: persist all four entries, then swap the
    /// in-memory state so observers see old or new values, never a mix.
    pub async fn set_auth(
        &self,
        user: UserProfile,
        access_token: &str,
        refresh_token: &str,
        expires_at: i64,
    ) -> Result<(), SessionError> {
        let serialized_user = serde_json::to_string(&user)?;
        self.store.set(KEY_ACCESS_TOKEN, access_token).await?;
        self.store.set(KEY_REFRESH_TOKEN, refresh_token).await?;
        self.store.set(KEY_USER, &serialized_user).await?;
        self.store
            .set(KEY_EXPIRES_AT, &expires_at.to_string())
            .await?;

        self.current.send_replace(Session {
            user: Some(user),
            access_token: Some(access_token.to_string()),
            refresh_token: Some(refresh_token.to_string()),
            expires_at: Some(expires_at),
        });
        Ok(())
    }

    /// The refresh path's partial update: rotate the token pair and the
    /// deadline while preserving the current user.
    pub async fn set_tokens(
        &self,
        access_token: &str,
        refresh_token: &str,
        expires_at: i64,
    ) -> Result<(), SessionError> {
        self.store.set(KEY_ACCESS_TOKEN, access_token).await?;
        self.store.set(KEY_REFRESH_TOKEN, refresh_token).await?;
        self.store
            .set(KEY_EXPIRES_AT, &expires_at.to_string())
            .await?;

        self.current.send_modify(|session| {
            session.access_token = Some(access_token.to_string());
            session.refresh_token = Some(refresh_token.to_string());
            session.expires_at = Some(expires_at);
        });
        Ok(())
    }

    /// Null the tuple and remove all four durable entries.
    ///
    /// The in-memory state is cleared first so observers (the guard, the
    /// scheduler) stop treating the session as live even if a removal
    /// fails afterwards.
    pub async fn clear_auth(&self) -> Result<(), SessionError> {
        self.current.send_replace(Session::default());
        self.store.remove(KEY_ACCESS_TOKEN).await?;
        self.store.remove(KEY_REFRESH_TOKEN).await?;
        self.store.remove(KEY_USER).await?;
        self.store.remove(KEY_EXPIRES_AT).await?;
        Ok(())
    }

    /// Synchronous accessor for non-reactive callers (the gateway, the
    /// scheduler's decision points, the route guard).
    pub fn snapshot(&self) -> Session {
        self.current.borrow().clone()
    }

    /// Subscribe to session changes. Used by the refresh scheduler to
    /// supersede its pending timer whenever the tuple changes.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.current.subscribe()
    }
}
