//! # Registri (Event Registration Back Office)
//!
//! `registri` is the administrative backend for an event-registration
//! dataset. It authenticates a small allowlist of admins, hands out signed
//! session cookies, and exposes the team roster behind a session gate:
//! listing and filtering, single-team CRUD, bulk operations, CSV/JSON
//! export, aggregate statistics, and a bounded in-memory audit trail of
//! every mutation.
//!
//! Admins are resolved from layered configuration (inline JSON, a JSON
//! file, or a single email/credential pair), sessions are HMAC-signed
//! tokens carried in an `admin_session` cookie, and a recovery flow can
//! email a short-lived sign-in link when a password is lost.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

/// App user agent: name/version
pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash() {
        assert!(!GIT_COMMIT_HASH.is_empty());
    }

    #[test]
    fn test_app_user_agent() {
        assert!(APP_USER_AGENT.starts_with("registri/"));
        assert_eq!(
            APP_USER_AGENT,
            format!("registri/{}", env!("CARGO_PKG_VERSION"))
        );
    }
}
