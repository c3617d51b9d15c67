//! Authentication against the identity provider and the AdsPay backend.
//!
//! This module provides:
//! - [`TokenClient`] — the identity-provider token endpoint client
//! - [`Refresher`] — the shared, single-flight refresh operation
//! - the login, code-exchange, and logout flows in [`flow`]

pub mod flow;
pub mod refresh;
pub mod token_client;

pub use flow::{exchange_authorization_code, login_with_password, logout};
pub use refresh::Refresher;
pub use token_client::{decode_bearer_claims, Envelope, ProfileData, TokenClient, TokenResponse};
