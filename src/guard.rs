//! Navigation gating for protected views.
//!
//! The guard is a pure, synchronous, idempotent read of the session: it
//! decides, it does not mutate. Two grains are provided — a per-route
//! check that sends anonymous navigation to the application's login
//! screen, and an app-root gate that sends it straight to the external
//! identity provider unless the path is the OAuth callback.

use std::sync::Arc;

use crate::config::Config;
use crate::session::SessionState;

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Render the protected content.
    Allow,
    /// Navigate elsewhere. `replace` history so back-navigation does not
    /// loop into the guarded route again.
    Redirect { to: String, replace: bool },
}

#[derive(Clone)]
pub struct RouteGuard {
    state: SessionState,
    config: Arc<Config>,
}

impl RouteGuard {
    pub fn new(state: SessionState, config: Arc<Config>) -> Self {
        Self { state, config }
    }

    /// Per-route check: unauthenticated navigation is redirected to the
    /// login screen.
    pub fn check(&self) -> RouteDecision {
        if self.state.snapshot().is_authenticated() {
            RouteDecision::Allow
        } else {
            RouteDecision::Redirect {
                to: self.config.login_path.clone(),
                replace: true,
            }
        }
    }

    /// App-root gate: without a session, any path other than the OAuth
    /// callback is sent to the identity provider's authorization page.
    pub fn gate(&self, path: &str, origin: &str) -> RouteDecision {
        if self.state.snapshot().is_authenticated() || path == self.config.callback_path {
            RouteDecision::Allow
        } else {
            RouteDecision::Redirect {
                to: self.authorize_url(origin),
                replace: true,
            }
        }
    }

    /// The external authorization URL for the code flow, redirecting back
    /// to this application's callback path.
    pub fn authorize_url(&self, origin: &str) -> String {
        let redirect_uri = format!("{}{}", origin, self.config.callback_path);
        format!(
            "{}?client_id={}&response_type=code&scope={}&redirect_uri={}",
            self.config.authorize_endpoint(),
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode("openid profile email"),
            urlencoding::encode(&redirect_uri),
        )
    }
}
