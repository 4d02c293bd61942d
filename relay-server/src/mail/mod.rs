//! Outgoing email.
//!
//! Providers implement [`Mailer`]; which one runs is a configuration choice
//! ([`build_mailer`]). The [`Dispatcher`] wraps any mailer with a per-attempt
//! timeout and exponential-backoff retries.
//!
//! ```text
//! EmailMessage → Dispatcher::send → Mailer::send (brevo | mailjet | smtp | log)
//! ```

pub mod brevo;
pub mod dispatcher;
pub mod log;
pub mod mailjet;
pub mod message;
pub mod smtp;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{Config, MailProvider};

pub use brevo::BrevoMailer;
pub use dispatcher::{Delivery, DispatchError, Dispatcher, RetryPolicy};
pub use log::LogMailer;
pub use mailjet::MailjetMailer;
pub use message::{EmailMessage, Mailbox, SendReceipt};
pub use smtp::SmtpMailer;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("missing required config: {0}")]
    MissingConfig(String),

    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} rejected the request with status {status}: {body}")]
    Provider {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("send attempt timed out after {0:?}")]
    Timeout(Duration),
}

/// Async email sending capability.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Short provider name for logs and the health endpoint.
    fn name(&self) -> &'static str;

    /// Whether credentials/endpoint were supplied at all.
    fn configured(&self) -> bool {
        true
    }

    /// Send one message.
    async fn send(&self, message: &EmailMessage) -> Result<SendReceipt, MailError>;

    /// Check the provider is reachable with the configured credentials.
    async fn verify(&self) -> Result<(), MailError>;

    /// Release connections at shutdown.
    async fn close(&self) {}
}

/// Build the mailer selected by `MAIL_PROVIDER`.
///
/// Missing credentials do not abort start-up: the returned mailer reports
/// itself unconfigured and fails every send, so submissions are still
/// accepted and stored.
pub fn build_mailer(config: &Config) -> Result<Arc<dyn Mailer>, MailError> {
    let timeout = config.mail_timeout();

    let built: Result<Arc<dyn Mailer>, MailError> = match config.mail_provider {
        MailProvider::Brevo => match &config.brevo_api_key {
            Some(key) => BrevoMailer::new(key.clone(), &config.brevo_api_url, timeout)
                .map(|m| Arc::new(m) as Arc<dyn Mailer>),
            None => Err(MailError::MissingConfig("BREVO_API_KEY".to_string())),
        },
        MailProvider::Mailjet => {
            match (&config.mailjet_api_key, &config.mailjet_secret_key) {
                (Some(key), Some(secret)) => {
                    MailjetMailer::new(key.clone(), secret.clone(), &config.mailjet_api_url, timeout)
                        .map(|m| Arc::new(m) as Arc<dyn Mailer>)
                }
                _ => Err(MailError::MissingConfig(
                    "MAILJET_API_KEY / MAILJET_SECRET_KEY".to_string(),
                )),
            }
        }
        MailProvider::Smtp => SmtpMailer::from_config(config).map(|m| Arc::new(m) as Arc<dyn Mailer>),
        MailProvider::Log => Ok(Arc::new(LogMailer::new())),
    };

    match built {
        Err(MailError::MissingConfig(what)) => Ok(Arc::new(UnconfiguredMailer {
            provider: config.mail_provider.as_str(),
            missing: what,
        })),
        other => other,
    }
}

/// Stand-in for a provider whose credentials are absent.
pub struct UnconfiguredMailer {
    provider: &'static str,
    missing: String,
}

#[async_trait]
impl Mailer for UnconfiguredMailer {
    fn name(&self) -> &'static str {
        self.provider
    }

    fn configured(&self) -> bool {
        false
    }

    async fn send(&self, _message: &EmailMessage) -> Result<SendReceipt, MailError> {
        Err(MailError::MissingConfig(self.missing.clone()))
    }

    async fn verify(&self) -> Result<(), MailError> {
        Err(MailError::MissingConfig(self.missing.clone()))
    }
}

/// Map a non-2xx provider response to [`MailError::Provider`].
pub(crate) async fn ensure_success(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, MailError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(MailError::Provider {
        provider,
        status: status.as_u16(),
        body: body.chars().take(512).collect(),
    })
}

/// Normalize a provider base URL so relative joins append instead of replace.
pub(crate) fn base_url(raw: &str) -> Result<url::Url, MailError> {
    let normalized = format!("{}/", raw.trim().trim_end_matches('/'));
    url::Url::parse(&normalized)
        .map_err(|e| MailError::MissingConfig(format!("invalid provider URL {raw}: {e}")))
}
