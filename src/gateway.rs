//! Bearer-authenticated request gateway.
//!
//! Decorates outgoing backend requests with the current access token. The
//! scheduler keeps the token fresh proactively; this gateway is the
//! reactive backstop for the window between its timers — a request that
//! catches a stale deadline awaits the shared refresh and carries the new
//! token, never the expired one.

use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use tracing::debug;

use crate::auth::Refresher;
use crate::config::Config;
use crate::error::SessionError;
use crate::session::SessionState;

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// HTTP client decorator that attaches a valid bearer token to every
/// outgoing request. Clone is cheap.
#[derive(Clone)]
pub struct AuthGateway {
    http: Client,
    state: SessionState,
    refresher: Refresher,
    base_url: String,
}

impl AuthGateway {
    /// Build a gateway over the backend base URL.
    ///
    /// `refresher` must be the instance shared with the scheduler; the
    /// single-flight guard lives there.
    pub fn new(
        config: &Config,
        state: SessionState,
        refresher: Refresher,
    ) -> Result<Self, SessionError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            state,
            refresher,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Attach authorization to a request:
    /// stale deadline → refresh and use the new token; token present →
    /// attach it; no session → send bare and let the backend reject.
    pub async fn authorize(
        &self,
        request: RequestBuilder,
    ) -> Result<RequestBuilder, SessionError> {
        let session = self.state.snapshot();
        let now = Utc::now().timestamp_millis();

        if session.is_stale(now) {
            debug!("access token stale at dispatch, refreshing before send");
            let token = self.refresher.refresh().await?;
            return Ok(request.bearer_auth(token));
        }
        match session.access_token {
            Some(token) => Ok(request.bearer_auth(token)),
            None => Ok(request),
        }
    }

    /// Authenticated GET against the backend.
    pub async fn get(&self, path: &str) -> Result<Response, SessionError> {
        let request = self.http.get(self.url(path));
        let request = self.authorize(request).await?;
        Self::check(request.send().await?).await
    }

    /// Authenticated POST with a JSON body against the backend.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, SessionError> {
        let request = self.http.post(self.url(path)).json(body);
        let request = self.authorize(request).await?;
        Self::check(request.send().await?).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: Response) -> Result<Response, SessionError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(SessionError::Server {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            })
        }
    }
}
