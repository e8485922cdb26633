//! Signed session and recovery tokens.
//!
//! Both token kinds are HMAC-signed (HS256) with independent secrets. A
//! session token proves an authenticated admin; a recovery token only
//! proves the holder received the recovery email. The claim shapes differ
//! so one kind can never pass as the other, even when both secrets are
//! configured to the same value.

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Seconds of clock skew tolerated when validating expiry.
const EXPIRY_LEEWAY_SECONDS: u64 = 30;

/// Claims carried by the session cookie token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(default)]
    pub admin: bool,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by the one-time recovery link token. Deliberately does
/// not name an email: the verify step binds the token to the configured
/// admin address instead.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecoveryClaims {
    #[serde(default, rename = "adminRecover")]
    pub admin_recover: bool,
    pub iat: i64,
    pub exp: i64,
}

fn hs256_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = EXPIRY_LEEWAY_SECONDS;

    validation
}

/// Issues and verifies session tokens.
pub struct SessionSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
}

impl SessionSigner {
    #[must_use]
    pub fn new(secret: &SecretString, ttl_seconds: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation: hs256_validation(),
            ttl_seconds,
        }
    }

    /// Issue a signed session token for an authenticated admin.
    pub fn issue(&self, email: &str) -> Result<String> {
        let now = Utc::now().timestamp();

        let claims = SessionClaims {
            admin: true,
            email: email.to_string(),
            iat: now,
            exp: now + self.ttl_seconds,
        };

        encode(&Header::default(), &claims, &self.encoding).context("failed to sign session token")
    }

    /// Verify signature, expiry, and the admin marker in one step. Any
    /// failure yields `None`; callers never learn which check failed.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<SessionClaims> {
        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation).ok()?;

        if data.claims.admin {
            Some(data.claims)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }
}

/// Issues and verifies recovery link tokens.
pub struct RecoverySigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
}

impl RecoverySigner {
    #[must_use]
    pub fn new(secret: &SecretString, ttl_seconds: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation: hs256_validation(),
            ttl_seconds,
        }
    }

    /// Issue a short-lived recovery token.
    pub fn issue(&self) -> Result<String> {
        let now = Utc::now().timestamp();

        let claims = RecoveryClaims {
            admin_recover: true,
            iat: now,
            exp: now + self.ttl_seconds,
        };

        encode(&Header::default(), &claims, &self.encoding).context("failed to sign recovery token")
    }

    /// Verify signature, expiry, and the recovery marker.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<RecoveryClaims> {
        let data = decode::<RecoveryClaims>(token, &self.decoding, &self.validation).ok()?;

        if data.claims.admin_recover {
            Some(data.claims)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }
}
