use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use std::path::PathBuf;

pub const ARG_ADMIN_EMAIL: &str = "admin-email";
pub const ARG_ADMIN_PASSWORD_HASH: &str = "admin-password-hash";
pub const ARG_ADMIN_PASSWORD: &str = "admin-password";
pub const ARG_ADMIN_LIST: &str = "admin-list";
pub const ARG_ADMIN_LIST_FILE: &str = "admin-list-file";

#[derive(Debug)]
pub struct Options {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub password: Option<SecretString>,
    pub list: Option<SecretString>,
    pub list_file: PathBuf,
}

impl Options {
    /// Parse admin allowlist arguments from matches.
    ///
    /// The allowlist itself is resolved lazily per login attempt, so no
    /// source needs to be present at startup.
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        // Empty env vars count as unset
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let list_file = get_non_empty(ARG_ADMIN_LIST_FILE)
            .map_or_else(|| PathBuf::from("config/admins.json"), PathBuf::from);

        Self {
            email: get_non_empty(ARG_ADMIN_EMAIL),
            password_hash: get_non_empty(ARG_ADMIN_PASSWORD_HASH),
            password: get_non_empty(ARG_ADMIN_PASSWORD).map(SecretString::from),
            list: get_non_empty(ARG_ADMIN_LIST).map(SecretString::from),
            list_file,
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ADMIN_EMAIL)
                .long(ARG_ADMIN_EMAIL)
                .help("Admin email for the single-admin fallback")
                .env("REGISTRI_ADMIN_EMAIL"),
        )
        .arg(
            Arg::new(ARG_ADMIN_PASSWORD_HASH)
                .long(ARG_ADMIN_PASSWORD_HASH)
                .help("Bcrypt hash of the single-admin password")
                .env("REGISTRI_ADMIN_PASSWORD_HASH"),
        )
        .arg(
            Arg::new(ARG_ADMIN_PASSWORD)
                .long(ARG_ADMIN_PASSWORD)
                .help("Plaintext single-admin password, only used when no hash is set")
                .env("REGISTRI_ADMIN_PASSWORD"),
        )
        .arg(
            Arg::new(ARG_ADMIN_LIST)
                .long(ARG_ADMIN_LIST)
                .help("Inline JSON array of admin entries, takes precedence over the list file")
                .env("REGISTRI_ADMIN_LIST"),
        )
        .arg(
            Arg::new(ARG_ADMIN_LIST_FILE)
                .long(ARG_ADMIN_LIST_FILE)
                .help("Path to a JSON file with admin entries")
                .env("REGISTRI_ADMIN_LIST_FILE")
                .default_value("config/admins.json"),
        )
}
