//! Error types for the session lifecycle.

use thiserror::Error;

use crate::store::StoreError;

/// Errors produced by the auth flows, the refresh operation, and the
/// request gateway.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Transport-level failure talking to the backend or identity provider.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The identity provider or backend answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    /// The AdsPay backend envelope reported an application-level failure,
    /// possibly on an HTTP 200.
    #[error("application error {code}: {message}")]
    Envelope { code: String, message: String },

    /// The identity provider rejected the submitted credentials.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A refresh was attempted with no refresh token in the session.
    /// Detected locally, before any network call.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The credential store could not be written or cleared.
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// A required environment variable is not set.
    #[error("missing required environment variable {0}")]
    MissingConfig(&'static str),

    /// A response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl SessionError {
    /// Whether this error means the user has to authenticate again.
    ///
    /// Callers that centralize the logout path (the refresh scheduler) use
    /// this to decide between surfacing the error and clearing the session.
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            SessionError::InvalidCredentials
                | SessionError::MissingRefreshToken
                | SessionError::Server { status: 401, .. }
        )
    }
}
