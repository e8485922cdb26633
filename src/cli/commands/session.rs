use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_SESSION_SECRET: &str = "session-secret";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_RECOVERY_SECRET: &str = "recovery-secret";
pub const ARG_RECOVERY_TTL_SECONDS: &str = "recovery-ttl-seconds";

#[derive(Debug)]
pub struct Options {
    pub session_secret: SecretString,
    pub session_ttl_seconds: i64,
    pub recovery_secret: Option<SecretString>,
    pub recovery_ttl_seconds: i64,
}

impl Options {
    /// Parse session signing arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the session secret is missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let secret = matches.get_one::<String>(ARG_SESSION_SECRET).cloned();
        let secret = match secret {
            Some(value) if !value.trim().is_empty() => value,
            _ => anyhow::bail!("missing required argument: --{ARG_SESSION_SECRET}"),
        };

        // Empty env vars count as unset so recovery falls back to the session secret
        let recovery_secret = matches
            .get_one::<String>(ARG_RECOVERY_SECRET)
            .cloned()
            .filter(|value| !value.trim().is_empty())
            .map(SecretString::from);

        Ok(Self {
            session_secret: SecretString::from(secret),
            session_ttl_seconds: matches
                .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
                .copied()
                .unwrap_or(7200),
            recovery_secret,
            recovery_ttl_seconds: matches
                .get_one::<i64>(ARG_RECOVERY_TTL_SECONDS)
                .copied()
                .unwrap_or(900),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_SECRET)
                .long(ARG_SESSION_SECRET)
                .help("Secret used to sign admin session cookies")
                .env("REGISTRI_SESSION_SECRET"),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session cookie TTL in seconds")
                .env("REGISTRI_SESSION_TTL_SECONDS")
                .default_value("7200")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_RECOVERY_SECRET)
                .long(ARG_RECOVERY_SECRET)
                .help("Secret used to sign recovery links, falls back to the session secret")
                .env("REGISTRI_RECOVERY_SECRET"),
        )
        .arg(
            Arg::new(ARG_RECOVERY_TTL_SECONDS)
                .long(ARG_RECOVERY_TTL_SECONDS)
                .help("Recovery link TTL in seconds")
                .env("REGISTRI_RECOVERY_TTL_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(i64)),
        )
}
