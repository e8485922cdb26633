//! Recovery email delivery.
//!
//! Delivery is a seam: the HTTP implementation speaks the SendGrid v3
//! send API, and a log-only implementation stands in when no API key is
//! configured. Delivery failures never fail the request that triggered
//! them.

use crate::APP_USER_AGENT;
use anyhow::Result;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tracing::{error, info, warn};

const DEFAULT_EMAIL_FROM: &str = "noreply@example.com";
const DEFAULT_EMAIL_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// A recovery message ready for delivery.
#[derive(Clone, Debug)]
pub struct RecoveryMessage {
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// Delivery seam for recovery messages. Implementations must not block
/// the caller on network progress.
pub trait RecoveryMailer: Send + Sync {
    fn send(&self, message: &RecoveryMessage) -> Result<()>;
}

/// Logs messages instead of delivering them.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogMailer;

impl RecoveryMailer for LogMailer {
    fn send(&self, message: &RecoveryMessage) -> Result<()> {
        info!(
            to = %message.to_email,
            subject = %message.subject,
            "Recovery email (log delivery): {}",
            message.body
        );

        Ok(())
    }
}

/// Delivers messages through an HTTP mail API.
pub struct HttpMailer {
    client: Client,
    api_key: SecretString,
    from_email: String,
    api_url: String,
}

impl HttpMailer {
    pub fn new(api_key: SecretString, from_email: String, api_url: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(DELIVERY_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_key,
            from_email,
            api_url,
        })
    }
}

impl RecoveryMailer for HttpMailer {
    fn send(&self, message: &RecoveryMessage) -> Result<()> {
        let request = self
            .client
            .post(&self.api_url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&delivery_payload(&self.from_email, message));

        let to_email = message.to_email.clone();

        // Delivery happens off the request path. Failures are logged and
        // never surfaced to the caller.
        tokio::spawn(async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    info!("Recovery email accepted for {to_email}");
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();

                    error!("Email API rejected message for {to_email}: {status} {body}");
                }
                Err(error) => {
                    error!("Failed to reach email API for {to_email}: {error}");
                }
            }
        });

        Ok(())
    }
}

fn delivery_payload(from_email: &str, message: &RecoveryMessage) -> serde_json::Value {
    json!({
        "personalizations": [{ "to": [{ "email": message.to_email }] }],
        "from": { "email": from_email },
        "subject": message.subject,
        "content": [{ "type": "text/plain", "value": message.body }],
    })
}

/// Mailer configuration from the CLI.
#[derive(Clone, Debug)]
pub struct MailerConfig {
    api_key: Option<SecretString>,
    from_email: String,
    api_url: String,
}

impl MailerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            api_key: None,
            from_email: DEFAULT_EMAIL_FROM.to_string(),
            api_url: DEFAULT_EMAIL_API_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<SecretString>) -> Self {
        self.api_key = api_key;
        self
    }

    #[must_use]
    pub fn with_from_email(mut self, from_email: String) -> Self {
        self.from_email = from_email;
        self
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url;
        self
    }

    #[must_use]
    pub fn from_email(&self) -> &str {
        &self.from_email
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the delivery implementation for the configuration: HTTP when an
/// API key is present, log-only otherwise.
#[must_use]
pub fn mailer_from_config(config: &MailerConfig) -> Arc<dyn RecoveryMailer> {
    match config.api_key.clone() {
        Some(api_key) => {
            match HttpMailer::new(
                api_key,
                config.from_email.clone(),
                config.api_url.clone(),
            ) {
                Ok(mailer) => Arc::new(mailer),
                Err(error) => {
                    error!("Failed to build HTTP mailer, using log delivery: {error}");

                    Arc::new(LogMailer)
                }
            }
        }
        None => {
            warn!("No email API key configured, recovery links will only be logged");

            Arc::new(LogMailer)
        }
    }
}
