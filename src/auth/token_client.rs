//! HTTP client for the identity provider and the backend profile endpoint.
//!
//! Token grants are form-encoded against the realm's OpenID Connect token
//! endpoint. Backend responses arrive in the AdsPay envelope
//! `{resp_code, resp_message, data}`, where `"00"` is the only success
//! code — anything else is an application-level failure even on HTTP 200.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::SessionError;

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Envelope response code denoting success.
const ENVELOPE_OK: &str = "00";

/// Successful response from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Relative lifetime of the access token, in seconds.
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Convert the relative lifetime to an absolute deadline in epoch
    /// milliseconds.
    pub fn expires_at_ms(&self, now_ms: i64) -> i64 {
        now_ms + self.expires_in as i64 * 1000
    }
}

/// OAuth error body returned by the token endpoint on 4xx.
#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// The AdsPay backend response envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub resp_code: String,
    pub resp_message: String,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload, turning any non-`"00"` code into an
    /// application-level error.
    pub fn into_data(self) -> Result<T, SessionError> {
        if self.resp_code != ENVELOPE_OK {
            return Err(SessionError::Envelope {
                code: self.resp_code,
                message: self.resp_message,
            });
        }
        self.data.ok_or(SessionError::Envelope {
            code: ENVELOPE_OK.to_string(),
            message: "response envelope carried no data".to_string(),
        })
    }
}

/// Profile payload from `GET /api/web/admin/profile`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileData {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: RoleSet,
}

/// The backend nests role names one level deep.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleSet {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Identity claims carried in the access token payload.
#[derive(Debug, Default, Deserialize)]
pub struct BearerClaims {
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Decode the claims segment of a JWT access token without verifying it.
///
/// Used only as a fallback identity source; returns `None` for anything
/// that does not look like a JWT.
pub fn decode_bearer_claims(access_token: &str) -> Option<BearerClaims> {
    let payload = access_token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Client for the identity provider's token endpoints and the backend
/// profile endpoint. Clone is cheap — `reqwest::Client` shares its
/// connection pool.
#[derive(Debug, Clone)]
pub struct TokenClient {
    http: Client,
    config: Arc<Config>,
}

impl TokenClient {
    pub fn new(config: Arc<Config>) -> Result<Self, SessionError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http, config })
    }

    /// `grant_type=password` exchange.
    pub async fn password_grant(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenResponse, SessionError> {
        self.token_request(&[
            ("grant_type", "password"),
            ("client_id", self.config.client_id.as_str()),
            ("username", username),
            ("password", password),
        ])
        .await
    }

    /// `grant_type=refresh_token` exchange.
    pub async fn refresh_grant(&self, refresh_token: &str) -> Result<TokenResponse, SessionError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    /// `grant_type=authorization_code` exchange for the OAuth redirect
    /// flow.
    pub async fn code_grant(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, SessionError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ])
        .await
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenResponse, SessionError> {
        let response = self
            .http
            .post(self.config.token_endpoint())
            .form(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Ok(parsed) = serde_json::from_str::<TokenErrorBody>(&body) {
                if parsed.error.as_deref() == Some("invalid_grant") {
                    debug!(
                        description = parsed.error_description.as_deref().unwrap_or(""),
                        "token endpoint rejected the grant"
                    );
                    return Err(SessionError::InvalidCredentials);
                }
            }
            return Err(SessionError::Server {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.json::<TokenResponse>().await?)
    }

    /// Revoke a refresh token at the identity provider.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), SessionError> {
        let response = self
            .http
            .post(self.config.revocation_endpoint())
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("token", refresh_token),
                ("token_type_hint", "refresh_token"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Server {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    /// Fetch the authenticated admin's profile from the backend.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<ProfileData, SessionError> {
        let url = format!(
            "{}/api/web/admin/profile",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self.http.get(url).bearer_auth(access_token).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Server {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        response.json::<Envelope<ProfileData>>().await?.into_data()
    }
}
