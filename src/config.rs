//! Environment-driven configuration.
//!
//! All endpoints are required inputs: the backend base URL (selected by the
//! mode flag), and the identity provider's URL, realm, and client id. A
//! `.env` file is honored when present so local development does not need
//! exported variables.

use std::env;

use crate::error::SessionError;

/// Deployment mode, selecting which backend base URL is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    fn from_env_value(value: &str) -> Self {
        match value {
            "production" => Mode::Production,
            _ => Mode::Development,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    /// Base URL of the AdsPay backend (mode-selected).
    pub base_url: String,
    /// Base URL of the identity provider.
    pub idp_url: String,
    /// Identity provider realm.
    pub realm: String,
    /// OAuth client id registered for the dashboard.
    pub client_id: String,
    /// Application route for the login screen.
    pub login_path: String,
    /// Application route the identity provider redirects back to.
    pub callback_path: String,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// `ADSPAY_MODE=production` selects `ADSPAY_BASE_URL`; any other value
    /// (or none) selects `ADSPAY_BASE_URL_DEV`. Missing required variables
    /// are reported by name.
    pub fn from_env() -> Result<Self, SessionError> {
        dotenvy::dotenv().ok();

        let mode = Mode::from_env_value(
            env::var("ADSPAY_MODE").unwrap_or_default().trim(),
        );
        let base_url = match mode {
            Mode::Production => require("ADSPAY_BASE_URL")?,
            Mode::Development => require("ADSPAY_BASE_URL_DEV")?,
        };

        Ok(Self {
            mode,
            base_url,
            idp_url: require("ADSPAY_IDP_URL")?,
            realm: require("ADSPAY_IDP_REALM")?,
            client_id: require("ADSPAY_IDP_CLIENT_ID")?,
            login_path: env::var("ADSPAY_LOGIN_PATH").unwrap_or_else(|_| "/login".to_string()),
            callback_path: env::var("ADSPAY_CALLBACK_PATH")
                .unwrap_or_else(|_| "/callback".to_string()),
        })
    }

    fn realm_endpoint(&self, leaf: &str) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/{}",
            self.idp_url.trim_end_matches('/'),
            self.realm,
            leaf
        )
    }

    /// Token endpoint handling the password, refresh and code grants.
    pub fn token_endpoint(&self) -> String {
        self.realm_endpoint("token")
    }

    /// Token revocation endpoint used on logout.
    pub fn revocation_endpoint(&self) -> String {
        self.realm_endpoint("revoke")
    }

    /// Interactive authorization endpoint for the code flow.
    pub fn authorize_endpoint(&self) -> String {
        self.realm_endpoint("auth")
    }
}

fn require(name: &'static str) -> Result<String, SessionError> {
    env::var(name).map_err(|_| SessionError::MissingConfig(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for name in [
            "ADSPAY_MODE",
            "ADSPAY_BASE_URL",
            "ADSPAY_BASE_URL_DEV",
            "ADSPAY_IDP_URL",
            "ADSPAY_IDP_REALM",
            "ADSPAY_IDP_CLIENT_ID",
            "ADSPAY_LOGIN_PATH",
            "ADSPAY_CALLBACK_PATH",
        ] {
            env::remove_var(name);
        }
    }

    fn set_common_idp_vars() {
        env::set_var("ADSPAY_IDP_URL", "https://sso.adspay.example");
        env::set_var("ADSPAY_IDP_REALM", "adspay");
        env::set_var("ADSPAY_IDP_CLIENT_ID", "adspay-dashboard-client");
    }

    #[test]
    #[serial]
    fn development_mode_selects_dev_base_url() {
        clear_env();
        set_common_idp_vars();
        env::set_var("ADSPAY_BASE_URL_DEV", "http://localhost:8080");

        let config = Config::from_env().unwrap();
        assert_eq!(config.mode, Mode::Development);
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.callback_path, "/callback");
    }

    #[test]
    #[serial]
    fn production_mode_selects_production_base_url() {
        clear_env();
        set_common_idp_vars();
        env::set_var("ADSPAY_MODE", "production");
        env::set_var("ADSPAY_BASE_URL", "https://api.adspay.example");

        let config = Config::from_env().unwrap();
        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.base_url, "https://api.adspay.example");
    }

    #[test]
    #[serial]
    fn missing_variable_is_named_in_the_error() {
        clear_env();
        set_common_idp_vars();

        let err = Config::from_env().unwrap_err();
        match err {
            SessionError::MissingConfig(name) => assert_eq!(name, "ADSPAY_BASE_URL_DEV"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    #[serial]
    fn endpoints_are_built_from_realm() {
        clear_env();
        set_common_idp_vars();
        env::set_var("ADSPAY_BASE_URL_DEV", "http://localhost:8080");
        // Trailing slash on the IdP URL must not double up.
        env::set_var("ADSPAY_IDP_URL", "https://sso.adspay.example/");

        let config = Config::from_env().unwrap();
        assert_eq!(
            config.token_endpoint(),
            "https://sso.adspay.example/realms/adspay/protocol/openid-connect/token"
        );
        assert_eq!(
            config.revocation_endpoint(),
            "https://sso.adspay.example/realms/adspay/protocol/openid-connect/revoke"
        );
        assert_eq!(
            config.authorize_endpoint(),
            "https://sso.adspay.example/realms/adspay/protocol/openid-connect/auth"
        );
    }
}
