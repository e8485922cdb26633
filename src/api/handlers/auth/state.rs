//! Shared authentication state and its tunables.

use super::allowlist::AllowlistConfig;
use super::credentials;
use super::tokens::{RecoverySigner, SessionSigner};
use crate::api::email::RecoveryMailer;
use std::sync::Arc;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 2 * 60 * 60;
const DEFAULT_RECOVERY_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_FRONTEND_BASE_URL: &str = "http://localhost:8080";

/// Tunables for session issuance and the recovery flow.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    session_ttl_seconds: i64,
    recovery_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frontend_base_url: DEFAULT_FRONTEND_BASE_URL.to_string(),
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            recovery_ttl_seconds: DEFAULT_RECOVERY_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_frontend_base_url(mut self, frontend_base_url: String) -> Self {
        self.frontend_base_url = frontend_base_url;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, session_ttl_seconds: i64) -> Self {
        self.session_ttl_seconds = session_ttl_seconds;
        self
    }

    #[must_use]
    pub fn with_recovery_ttl_seconds(mut self, recovery_ttl_seconds: i64) -> Self {
        self.recovery_ttl_seconds = recovery_ttl_seconds;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub const fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub const fn recovery_ttl_seconds(&self) -> i64 {
        self.recovery_ttl_seconds
    }

    /// Session cookies are marked `Secure` when the frontend is served
    /// over HTTPS.
    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregated authentication state shared by handlers and the session
/// gate.
pub struct AuthState {
    config: AuthConfig,
    allowlist: AllowlistConfig,
    sessions: SessionSigner,
    recovery: RecoverySigner,
    mailer: Arc<dyn RecoveryMailer>,
}

impl AuthState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        allowlist: AllowlistConfig,
        sessions: SessionSigner,
        recovery: RecoverySigner,
        mailer: Arc<dyn RecoveryMailer>,
    ) -> Self {
        Self {
            config,
            allowlist,
            sessions,
            recovery,
            mailer,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub const fn allowlist(&self) -> &AllowlistConfig {
        &self.allowlist
    }

    #[must_use]
    pub const fn sessions(&self) -> &SessionSigner {
        &self.sessions
    }

    #[must_use]
    pub const fn recovery(&self) -> &RecoverySigner {
        &self.recovery
    }

    #[must_use]
    pub fn mailer(&self) -> &dyn RecoveryMailer {
        self.mailer.as_ref()
    }

    /// Verify a login attempt against the current allowlist.
    #[must_use]
    pub fn verify_password(&self, email: &str, password: &str) -> bool {
        credentials::verify_password(&self.allowlist, email, password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_config_defaults() {
        let config = AuthConfig::new();

        assert_eq!(config.frontend_base_url(), "http://localhost:8080");
        assert_eq!(config.session_ttl_seconds(), 7200);
        assert_eq!(config.recovery_ttl_seconds(), 900);
        assert!(!config.session_cookie_secure());
    }

    #[test]
    fn test_auth_config_overrides() {
        let config = AuthConfig::new()
            .with_frontend_base_url("https://admin.example.com".to_string())
            .with_session_ttl_seconds(3600)
            .with_recovery_ttl_seconds(300);

        assert_eq!(config.frontend_base_url(), "https://admin.example.com");
        assert_eq!(config.session_ttl_seconds(), 3600);
        assert_eq!(config.recovery_ttl_seconds(), 300);
        assert!(config.session_cookie_secure());
    }

    #[test]
    fn test_auth_config_default_trait() {
        let config = AuthConfig::default();

        assert_eq!(config.session_ttl_seconds(), 7200);
    }
}
