//! Background token refresh scheduling.
//!
//! A single task keeps the access token valid while the application is
//! open: whenever the session's `(access_token, expires_at)` pair changes,
//! any pending timer is superseded and a new one-shot timer is armed to
//! fire [`REFRESH_LEAD_MS`] before the deadline. An already-expired token
//! is refreshed immediately. A failed refresh clears the session — no
//! automatic retry; the route guard then forces re-authentication.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::auth::Refresher;
use crate::session::SessionState;

/// How long before expiry the refresh fires, tolerating clock skew and
/// request latency.
pub const REFRESH_LEAD_MS: i64 = 30_000;

/// When to refresh a token expiring at `expires_at` (epoch milliseconds).
///
/// `None` means the token is already expired and the refresh must happen
/// immediately; otherwise the returned delay is `max(time_left - lead, 0)`.
pub fn refresh_delay(expires_at: i64, now_ms: i64) -> Option<Duration> {
    let time_left = expires_at - now_ms;
    if time_left <= 0 {
        return None;
    }
    Some(Duration::from_millis(
        time_left.saturating_sub(REFRESH_LEAD_MS).max(0) as u64,
    ))
}

/// Handle to the running scheduler task.
///
/// Dropping the handle tears the task down, so a pending timer never
/// outlives the scope that owns the scheduler.
#[derive(Debug)]
pub struct SchedulerHandle {
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Cancel the pending timer and stop the task.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The silent-refresh scheduler.
#[derive(Debug)]
pub struct RefreshScheduler;

impl RefreshScheduler {
    /// Spawn the scheduler over the given session.
    ///
    /// The `refresher` must be the same instance the gateway uses, so a
    /// timer-driven refresh and a request-driven refresh can never run two
    /// parallel token exchanges.
    pub fn spawn(state: SessionState, refresher: Refresher) -> SchedulerHandle {
        let task = tokio::spawn(run(state, refresher));
        SchedulerHandle { task }
    }
}

async fn run(state: SessionState, refresher: Refresher) {
    let mut rx = state.subscribe();
    loop {
        let (access_token, expires_at) = {
            let session = rx.borrow_and_update();
            (session.access_token.clone(), session.expires_at)
        };

        // No session to maintain: park until the tuple changes.
        let expires_at = match (access_token, expires_at) {
            (Some(_), Some(expires_at)) => expires_at,
            _ => {
                if rx.changed().await.is_err() {
                    return;
                }
                continue;
            }
        };

        match refresh_delay(expires_at, Utc::now().timestamp_millis()) {
            None => {
                debug!("access token already expired, refreshing now");
                refresh_or_clear(&state, &refresher).await;
            }
            Some(delay) => {
                debug!(delay_ms = delay.as_millis() as u64, "refresh scheduled");
                tokio::select! {
                    // Session changed: the new tuple supersedes this timer.
                    changed = rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                    _ = tokio::time::sleep(delay) => {
                        refresh_or_clear(&state, &refresher).await;
                    }
                }
            }
        }
    }
}

/// One refresh attempt. Failure ends the session: the refresh token may
/// have been rotated or revoked, so it cannot be assumed reusable.
async fn refresh_or_clear(state: &SessionState, refresher: &Refresher) {
    if let Err(error) = refresher.refresh().await {
        warn!(%error, "token refresh failed, clearing session");
        if let Err(error) = state.clear_auth().await {
            warn!(%error, "failed to clear credential store after refresh failure");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refreshes_thirty_seconds_before_expiry() {
        let now = 1_700_000_000_000;
        let delay = refresh_delay(now + 60_000, now).unwrap();
        assert_eq!(delay, Duration::from_millis(30_000));
    }

    #[test]
    fn expired_deadline_means_refresh_now() {
        let now = 1_700_000_000_000;
        assert!(refresh_delay(now - 1, now).is_none());
        assert!(refresh_delay(now, now).is_none());
    }

    #[test]
    fn deadlines_inside_the_lead_window_fire_immediately_via_timer() {
        let now = 1_700_000_000_000;
        let delay = refresh_delay(now + 10_000, now).unwrap();
        assert_eq!(delay, Duration::ZERO);
    }

    #[test]
    fn lead_is_thirty_seconds() {
        assert_eq!(REFRESH_LEAD_MS, 30_000);
    }
}
