//! Login, code-exchange, and logout flows.
//!
//! Every flow terminates in a [`SessionState`] mutation entry point:
//! successful exchanges call `set_auth`, logout calls `clear_auth`. On
//! failure the error propagates to the caller and the session is left
//! untouched, so an invalid login never disturbs an existing session.

use chrono::Utc;
use tracing::warn;

use crate::auth::token_client::{decode_bearer_claims, TokenClient};
use crate::error::SessionError;
use crate::session::{SessionState, UserProfile};

/// Direct credential exchange (`grant_type=password`).
///
/// The user profile is derived from the submitted username; the code
/// exchange flow is the one that enriches the profile from the backend.
pub async fn login_with_password(
    state: &SessionState,
    client: &TokenClient,
    username: &str,
    password: &str,
) -> Result<(), SessionError> {
    let tokens = client.password_grant(username, password).await?;
    let expires_at = tokens.expires_at_ms(Utc::now().timestamp_millis());

    let user = UserProfile {
        username: username.to_string(),
        email: None,
        roles: Vec::new(),
    };
    state
        .set_auth(user, &tokens.access_token, &tokens.refresh_token, expires_at)
        .await
}

/// Authorization-code exchange for the OAuth redirect flow.
///
/// After the exchange the backend profile endpoint supplies email and
/// roles. Enrichment is best-effort: the tokens are already valid, so a
/// failed profile fetch falls back to the identity claims carried in the
/// access token rather than failing the login.
pub async fn exchange_authorization_code(
    state: &SessionState,
    client: &TokenClient,
    code: &str,
    redirect_uri: &str,
) -> Result<(), SessionError> {
    let tokens = client.code_grant(code, redirect_uri).await?;
    let expires_at = tokens.expires_at_ms(Utc::now().timestamp_millis());

    let user = match client.fetch_profile(&tokens.access_token).await {
        Ok(profile) => UserProfile {
            username: profile.username,
            email: profile.email,
            roles: profile.roles.roles,
        },
        Err(error) => {
            warn!(%error, "profile fetch failed after code exchange, using token claims");
            let claims = decode_bearer_claims(&tokens.access_token).unwrap_or_default();
            UserProfile {
                username: claims.preferred_username.unwrap_or_default(),
                email: claims.email,
                roles: Vec::new(),
            }
        }
    };

    state
        .set_auth(user, &tokens.access_token, &tokens.refresh_token, expires_at)
        .await
}

/// Revoke the refresh token and clear the session.
///
/// Revocation is best-effort — the local session is cleared either way, so
/// there is exactly one logout path regardless of identity-provider
/// availability.
pub async fn logout(state: &SessionState, client: &TokenClient) -> Result<(), SessionError> {
    if let Some(refresh_token) = state.snapshot().refresh_token {
        if let Err(error) = client.revoke(&refresh_token).await {
            warn!(%error, "refresh token revocation failed, clearing local session anyway");
        }
    }
    state.clear_auth().await
}
