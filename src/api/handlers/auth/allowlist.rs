//! Admin allowlist resolution.
//!
//! Admins come from three layered sources, first usable one wins:
//!
//! 1. An inline JSON array of `{email, passwordHash?, password?}` objects.
//! 2. A JSON file with the same shape, `config/admins.json` by default.
//! 3. A single email plus credential pair.
//!
//! A source that is present but unusable (unparseable, wrong shape, or
//! yielding zero valid entries) is skipped in favor of the next one.
//! Resolution never fails: with nothing usable the allowlist is empty and
//! every login is rejected.

use super::utils::normalize_email;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::{fs, path::PathBuf};
use tracing::warn;

const DEFAULT_ADMIN_LIST_FILE: &str = "config/admins.json";

/// Credential material attached to an allowlist entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credential {
    /// bcrypt hash, verified with the adaptive hashing function.
    Hashed(String),
    /// Raw password compared by equality. Compatibility mode only.
    Plaintext(String),
    /// No usable credential, the entry can never authenticate.
    Unset,
}

/// A single admin permitted to sign in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminIdentity {
    pub email: String,
    pub credential: Credential,
}

/// Configuration inputs for allowlist resolution.
///
/// Holds the raw configured values. [`AllowlistConfig::resolve`] re-reads
/// them on every call so file edits are picked up without a restart.
#[derive(Clone, Debug)]
pub struct AllowlistConfig {
    list_value: Option<SecretString>,
    list_file: PathBuf,
    admin_email: Option<String>,
    admin_password_hash: Option<String>,
    admin_password: Option<SecretString>,
}

impl AllowlistConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            list_value: None,
            list_file: PathBuf::from(DEFAULT_ADMIN_LIST_FILE),
            admin_email: None,
            admin_password_hash: None,
            admin_password: None,
        }
    }

    #[must_use]
    pub fn with_list_value(mut self, list_value: Option<SecretString>) -> Self {
        self.list_value = list_value;
        self
    }

    #[must_use]
    pub fn with_list_file(mut self, list_file: PathBuf) -> Self {
        self.list_file = list_file;
        self
    }

    #[must_use]
    pub fn with_admin_email(mut self, admin_email: Option<String>) -> Self {
        self.admin_email = admin_email;
        self
    }

    #[must_use]
    pub fn with_admin_password_hash(mut self, admin_password_hash: Option<String>) -> Self {
        self.admin_password_hash = admin_password_hash;
        self
    }

    #[must_use]
    pub fn with_admin_password(mut self, admin_password: Option<SecretString>) -> Self {
        self.admin_password = admin_password;
        self
    }

    /// The configured single-admin email, normalized. This is the only
    /// address the recovery flow will mail a sign-in link to.
    #[must_use]
    pub fn single_admin_email(&self) -> Option<String> {
        let email = normalize_email(self.admin_email.as_deref()?);

        if email.is_empty() {
            None
        } else {
            Some(email)
        }
    }

    /// Resolve the allowlist from the configured sources.
    #[must_use]
    pub fn resolve(&self) -> Vec<AdminIdentity> {
        if let Some(admins) = self.admins_from_value() {
            return admins;
        }

        if let Some(admins) = self.admins_from_file() {
            return admins;
        }

        self.admins_from_single()
    }

    fn admins_from_value(&self) -> Option<Vec<AdminIdentity>> {
        let raw = self.list_value.as_ref()?;

        admins_from_json(raw.expose_secret())
    }

    fn admins_from_file(&self) -> Option<Vec<AdminIdentity>> {
        if !self.list_file.exists() {
            return None;
        }

        match fs::read_to_string(&self.list_file) {
            Ok(raw) => admins_from_json(&raw),
            Err(error) => {
                warn!(
                    "Failed to read admin list file {}: {error}",
                    self.list_file.display()
                );

                None
            }
        }
    }

    fn admins_from_single(&self) -> Vec<AdminIdentity> {
        let Some(email) = self.single_admin_email() else {
            return Vec::new();
        };

        let credential = credential_from_parts(
            self.admin_password_hash.as_deref(),
            self.admin_password
                .as_ref()
                .map(ExposeSecret::expose_secret),
        );

        vec![AdminIdentity { email, credential }]
    }
}

impl Default for AllowlistConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a JSON admin array and keep the entries that carry an email.
fn admins_from_json(raw: &str) -> Option<Vec<AdminIdentity>> {
    let parsed = tolerant_parse(raw)?;

    let Value::Array(entries) = parsed else {
        warn!("admin list JSON is not an array, ignoring source");
        return None;
    };

    let admins: Vec<AdminIdentity> = entries.iter().filter_map(normalize_entry).collect();

    if admins.is_empty() {
        None
    } else {
        Some(admins)
    }
}

/// Parse JSON after an ordered chain of repairs, strictest attempt first.
/// Later attempts rewrite the quoting and trailing-comma mistakes that
/// shells and .env files tend to introduce.
fn tolerant_parse(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return None;
    }

    let repairs: [fn(&str) -> String; 3] = [
        str::to_string,
        normalize_quotes,
        |raw| strip_trailing_commas(&normalize_quotes(raw)),
    ];

    for repair in repairs {
        if let Ok(value) = serde_json::from_str(&repair(trimmed)) {
            return Some(value);
        }
    }

    warn!("admin list is not valid JSON after repair attempts, ignoring source");

    None
}

/// Rewrite single-quoted JSON as double-quoted. Quotes wrapping the whole
/// array are stripped before inner strings are converted.
fn normalize_quotes(raw: &str) -> String {
    let mut cleaned = raw.replace('\n', " ");

    if let Ok(re) = Regex::new(r"'\s*([\[{])") {
        cleaned = re.replace_all(&cleaned, "${1}").into_owned();
    }

    if let Ok(re) = Regex::new(r"([\]}])\s*'") {
        cleaned = re.replace_all(&cleaned, "${1}").into_owned();
    }

    if let Ok(re) = Regex::new(r"'([^']*)'") {
        cleaned = re.replace_all(&cleaned, "\"${1}\"").into_owned();
    }

    cleaned
}

fn strip_trailing_commas(raw: &str) -> String {
    Regex::new(r",(\s*[}\]])").map_or_else(
        |_| raw.to_string(),
        |re| re.replace_all(raw, "${1}").into_owned(),
    )
}

/// Clean a bcrypt hash that picked up shell-escaping artifacts: trim,
/// unescape `\$`, and collapse duplicated leading dollar signs. Sanitizing
/// an already-sanitized hash returns it unchanged.
fn sanitize_hash(raw: &str) -> String {
    let mut hash = raw.trim().replace("\\$", "$");

    while hash.starts_with("$$") {
        hash.remove(0);
    }

    hash
}

/// Pick the strongest credential present: a non-empty sanitized hash, then
/// a non-empty plaintext password, then nothing.
fn credential_from_parts(hash: Option<&str>, password: Option<&str>) -> Credential {
    if let Some(hash) = hash {
        let sanitized = sanitize_hash(hash);

        if !sanitized.is_empty() {
            return Credential::Hashed(sanitized);
        }
    }

    match password {
        Some(password) if !password.is_empty() => Credential::Plaintext(password.to_string()),
        _ => Credential::Unset,
    }
}

/// Keep an entry only if it is an object with a non-empty string email.
/// Non-string credential fields are treated as absent.
fn normalize_entry(entry: &Value) -> Option<AdminIdentity> {
    let fields = entry.as_object()?;

    let email = normalize_email(fields.get("email")?.as_str()?);

    if email.is_empty() {
        return None;
    }

    let credential = credential_from_parts(
        fields.get("passwordHash").and_then(Value::as_str),
        fields.get("password").and_then(Value::as_str),
    );

    Some(AdminIdentity { email, credential })
}
