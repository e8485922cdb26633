//! Password verification against the resolved allowlist.

use super::allowlist::{AllowlistConfig, Credential};
use super::utils::normalize_email;
use tracing::debug;

/// Verify a login attempt. The allowlist is resolved fresh on every call
/// so configuration edits apply without a restart. Unknown emails, absent
/// credentials, and malformed hashes all report the same failure.
#[must_use]
pub fn verify_password(allowlist: &AllowlistConfig, email: &str, password: &str) -> bool {
    let email = normalize_email(email);

    if email.is_empty() || password.is_empty() {
        return false;
    }

    let admins = allowlist.resolve();

    let Some(admin) = admins.iter().find(|admin| admin.email == email) else {
        return false;
    };

    match &admin.credential {
        Credential::Hashed(hash) => bcrypt::verify(password, hash).unwrap_or_else(|error| {
            debug!("bcrypt verification error: {error}");

            false
        }),
        Credential::Plaintext(expected) => expected == password,
        Credential::Unset => false,
    }
}
