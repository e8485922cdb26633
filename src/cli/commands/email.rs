use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_EMAIL_API_KEY: &str = "email-api-key";
pub const ARG_EMAIL_FROM: &str = "email-from";
pub const ARG_EMAIL_API_URL: &str = "email-api-url";
pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";

const DEFAULT_EMAIL_FROM: &str = "noreply@example.com";
const DEFAULT_EMAIL_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";
const DEFAULT_FRONTEND_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug)]
pub struct Options {
    pub api_key: Option<SecretString>,
    pub from_email: String,
    pub api_url: String,
    pub frontend_base_url: String,
}

impl Options {
    /// Parse email delivery arguments from matches.
    ///
    /// Without an API key the server logs recovery links instead of
    /// sending mail, so every argument here is optional.
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        // Empty env vars count as unset
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        Self {
            api_key: get_non_empty(ARG_EMAIL_API_KEY).map(SecretString::from),
            from_email: get_non_empty(ARG_EMAIL_FROM)
                .unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string()),
            api_url: get_non_empty(ARG_EMAIL_API_URL)
                .unwrap_or_else(|| DEFAULT_EMAIL_API_URL.to_string()),
            frontend_base_url: get_non_empty(ARG_FRONTEND_BASE_URL)
                .unwrap_or_else(|| DEFAULT_FRONTEND_BASE_URL.to_string()),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_EMAIL_API_KEY)
                .long(ARG_EMAIL_API_KEY)
                .help("SendGrid API key, recovery links are logged when unset")
                .env("REGISTRI_EMAIL_API_KEY"),
        )
        .arg(
            Arg::new(ARG_EMAIL_FROM)
                .long(ARG_EMAIL_FROM)
                .help("From address for recovery emails")
                .env("REGISTRI_EMAIL_FROM")
                .default_value(DEFAULT_EMAIL_FROM),
        )
        .arg(
            Arg::new(ARG_EMAIL_API_URL)
                .long(ARG_EMAIL_API_URL)
                .help("Mail delivery endpoint")
                .env("REGISTRI_EMAIL_API_URL")
                .default_value(DEFAULT_EMAIL_API_URL),
        )
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Frontend base URL used for recovery links and CORS")
                .env("REGISTRI_FRONTEND_BASE_URL")
                .default_value(DEFAULT_FRONTEND_BASE_URL),
        )
}
