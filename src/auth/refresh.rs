//! The shared refresh operation.
//!
//! The scheduler refreshes proactively on a timer; the gateway refreshes
//! reactively when a request catches a stale token. Both paths go through
//! one [`Refresher`], which serializes them: the identity provider rotates
//! the refresh token on every use, so two independent exchanges in the same
//! window would have one of them spend an already-rotated-out token and
//! fail a perfectly healthy session.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::auth::token_client::TokenClient;
use crate::error::SessionError;
use crate::session::SessionState;

/// Single-flight token refresh shared by every consumer.
#[derive(Clone)]
pub struct Refresher {
    state: SessionState,
    client: Arc<TokenClient>,
    in_flight: Arc<Mutex<()>>,
}

impl Refresher {
    pub fn new(state: SessionState, client: Arc<TokenClient>) -> Self {
        Self {
            state,
            client,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Exchange the current refresh token for a new token pair.
    ///
    /// Fails fast with [`SessionError::MissingRefreshToken`] when the
    /// session has none — a local check, no network call. On success the
    /// session's token pair and deadline are rotated (the user is
    /// preserved) and the new access token is returned.
    ///
    /// Concurrent callers queue on the in-flight guard; a caller that
    /// waited out someone else's refresh reuses the freshly rotated token
    /// instead of spending the superseded refresh token a second time.
    pub async fn refresh(&self) -> Result<String, SessionError> {
        let observed = self.state.snapshot();
        let _in_flight = self.in_flight.lock().await;

        let current = self.state.snapshot();
        let now = Utc::now().timestamp_millis();
        if let (Some(token), Some(deadline)) = (current.access_token.clone(), current.expires_at) {
            let rotated_while_waiting = current.refresh_token != observed.refresh_token
                || current.expires_at != observed.expires_at;
            if rotated_while_waiting && now < deadline {
                debug!("another caller already refreshed, reusing its token");
                return Ok(token);
            }
        }

        let refresh_token = current
            .refresh_token
            .ok_or(SessionError::MissingRefreshToken)?;

        let tokens = self.client.refresh_grant(&refresh_token).await?;
        let expires_at = tokens.expires_at_ms(Utc::now().timestamp_millis());
        self.state
            .set_tokens(&tokens.access_token, &tokens.refresh_token, expires_at)
            .await?;

        info!("access token refreshed");
        Ok(tokens.access_token)
    }
}
