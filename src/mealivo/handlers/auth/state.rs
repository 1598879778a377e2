//! Auth state and configuration.

use secrecy::SecretString;

use super::token::TokenKeys;

const DEFAULT_VERIFICATION_TOKEN_TTL_SECONDS: i64 = 30 * 60;
const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    verification_token_ttl_seconds: i64,
    access_token_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            verification_token_ttl_seconds: DEFAULT_VERIFICATION_TOKEN_TTL_SECONDS,
            access_token_ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_verification_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.verification_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_access_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn verification_token_ttl_seconds(&self) -> i64 {
        self.verification_token_ttl_seconds
    }

    #[must_use]
    pub fn access_token_ttl_seconds(&self) -> i64 {
        self.access_token_ttl_seconds
    }

    /// Cookies are only marked `Secure` when the frontend is served over HTTPS.
    pub(super) fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url
            .trim()
            .to_ascii_lowercase()
            .starts_with("https://")
    }

    /// Build the frontend verification link included in outbound emails.
    pub(super) fn verify_url(&self, token: &str) -> String {
        let base = self.frontend_base_url.trim_end_matches('/');
        format!("{base}/auth/verify-email?token={token}")
    }
}

pub struct AuthState {
    config: AuthConfig,
    keys: TokenKeys,
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("config", &self.config)
            .field("keys", &"***")
            .finish()
    }
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, jwt_secret: &SecretString) -> Self {
        Self {
            config,
            keys: TokenKeys::new(jwt_secret),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(crate) fn keys(&self) -> &TokenKeys {
        &self.keys
    }
}
