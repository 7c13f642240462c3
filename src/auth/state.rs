//! Auth configuration shared by handlers and middleware.

use secrecy::SecretString;

const DEFAULT_JWT_TTL_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_COOKIE_TTL_SECONDS: i64 = 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    jwt_secret: SecretString,
    jwt_ttl_seconds: i64,
    cookie_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String, jwt_secret: SecretString) -> Self {
        Self {
            frontend_base_url,
            jwt_secret,
            jwt_ttl_seconds: DEFAULT_JWT_TTL_SECONDS,
            cookie_ttl_seconds: DEFAULT_COOKIE_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_jwt_ttl_seconds(mut self, seconds: i64) -> Self {
        self.jwt_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_cookie_ttl_seconds(mut self, seconds: i64) -> Self {
        self.cookie_ttl_seconds = seconds;
        self
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(crate) fn jwt_secret(&self) -> &SecretString {
        &self.jwt_secret
    }

    pub(crate) fn jwt_ttl_seconds(&self) -> i64 {
        self.jwt_ttl_seconds
    }

    pub(crate) fn cookie_ttl_seconds(&self) -> i64 {
        self.cookie_ttl_seconds
    }

    /// Only mark cookies secure when the frontend is served over HTTPS.
    pub(crate) fn cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}
