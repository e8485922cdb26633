use crate::api::{
    self,
    email::MailerConfig,
    handlers::auth::{AllowlistConfig, AuthConfig},
};
use anyhow::Result;
use secrecy::SecretString;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub session_secret: SecretString,
    pub session_ttl_seconds: i64,
    pub recovery_secret: Option<SecretString>,
    pub recovery_ttl_seconds: i64,
    pub admin_email: Option<String>,
    pub admin_password_hash: Option<String>,
    pub admin_password: Option<SecretString>,
    pub admin_list: Option<SecretString>,
    pub admin_list_file: PathBuf,
    pub email_api_key: Option<SecretString>,
    pub email_from: String,
    pub email_api_url: String,
    pub frontend_base_url: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the listener cannot bind or the frontend origin is invalid.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let auth_config = AuthConfig::new()
        .with_frontend_base_url(args.frontend_base_url)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_recovery_ttl_seconds(args.recovery_ttl_seconds);

    let allowlist = AllowlistConfig::new()
        .with_list_value(args.admin_list)
        .with_list_file(args.admin_list_file)
        .with_admin_email(args.admin_email)
        .with_admin_password_hash(args.admin_password_hash)
        .with_admin_password(args.admin_password);

    let email_config = MailerConfig::new()
        .with_api_key(args.email_api_key)
        .with_from_email(args.email_from)
        .with_api_url(args.email_api_url);

    api::new(
        args.port,
        auth_config,
        allowlist,
        args.session_secret,
        args.recovery_secret,
        email_config,
    )
    .await
}

fn log_startup_args(args: &Args) {
    let delivery = if args.email_api_key.is_some() {
        "http"
    } else {
        "log"
    };
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("frontend_base_url", args.frontend_base_url.clone()),
        (
            "admin_email",
            args.admin_email
                .clone()
                .unwrap_or_else(|| "n/a".to_string()),
        ),
        ("admin_list_set", args.admin_list.is_some().to_string()),
        (
            "admin_list_file",
            args.admin_list_file.display().to_string(),
        ),
        (
            "recovery_secret_set",
            args.recovery_secret.is_some().to_string(),
        ),
        ("session_ttl_seconds", args.session_ttl_seconds.to_string()),
        (
            "recovery_ttl_seconds",
            args.recovery_ttl_seconds.to_string(),
        ),
        ("email_delivery", delivery.to_string()),
        ("email_from", args.email_from.clone()),
    ];
    log_entries("Startup configuration", &entries);
}

fn log_entries(title: &str, entries: &[(&str, String)]) {
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!("{title}:");
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}
