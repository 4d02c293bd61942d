//! Configuration module for environment variable parsing.
//!
//! Everything is read from the process environment (optionally seeded from a
//! `.env` file by the binaries). Provider credentials have no defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Which transport delivers outgoing mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailProvider {
    /// Brevo (ex-Sendinblue) transactional API
    Brevo,
    /// Mailjet v3.1 send API
    Mailjet,
    /// Plain SMTP relay
    Smtp,
    /// Log the envelope instead of sending (local development)
    Log,
}

impl MailProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            MailProvider::Brevo => "brevo",
            MailProvider::Mailjet => "mailjet",
            MailProvider::Smtp => "smtp",
            MailProvider::Log => "log",
        }
    }
}

impl FromStr for MailProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brevo" | "sendinblue" => Ok(MailProvider::Brevo),
            "mailjet" => Ok(MailProvider::Mailjet),
            "smtp" => Ok(MailProvider::Smtp),
            "log" | "console" => Ok(MailProvider::Log),
            other => Err(format!("unknown mail provider: {other}")),
        }
    }
}

/// Where submissions are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// `quotes.json` / `contacts.json` under `DATA_DIR`
    Json,
    /// Process memory only
    Memory,
}

/// TLS mode for the SMTP transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpTls {
    StartTls,
    Tls,
    None,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Development mode exposes internal error details in 500 responses
    pub development: bool,

    /// Directory holding the JSON collections
    pub data_dir: PathBuf,

    pub store_backend: StoreBackend,

    // =========================================================================
    // Mail
    // =========================================================================

    pub mail_provider: MailProvider,

    pub brevo_api_key: Option<String>,
    pub brevo_api_url: String,

    pub mailjet_api_key: Option<String>,
    pub mailjet_secret_key: Option<String>,
    pub mailjet_api_url: String,

    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_tls: SmtpTls,

    /// Sender address and display name for every outgoing message
    pub from_email: String,
    pub from_name: String,

    /// Operator inbox receiving submission notifications
    pub to_email: String,
    pub to_name: String,

    /// Public site linked from acknowledgment emails
    pub site_url: String,

    // =========================================================================
    // Dispatch policy
    // =========================================================================

    /// Total attempts per message, first try included
    pub mail_max_attempts: u32,

    /// Backoff unit; the delay after failed attempt `n` is `base * 2^n`
    pub mail_backoff_base_ms: u64,

    /// Upper bound for a single send attempt
    pub mail_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV")
            .or_else(|_| env::var("NODE_ENV"))
            .unwrap_or_else(|_| "production".to_string());

        Config {
            port: parse_or("PORT", 8080),

            development: app_env.eq_ignore_ascii_case("development"),

            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),

            store_backend: match env::var("STORE_BACKEND").ok().as_deref() {
                None | Some("json") => StoreBackend::Json,
                Some("memory") => StoreBackend::Memory,
                Some(other) => {
                    warn!(env_var = "STORE_BACKEND", value = %other, "Unknown store backend, using json");
                    StoreBackend::Json
                }
            },

            mail_provider: parse_or("MAIL_PROVIDER", MailProvider::Brevo),

            brevo_api_key: non_empty("BREVO_API_KEY"),
            brevo_api_url: env::var("BREVO_API_URL")
                .unwrap_or_else(|_| "https://api.brevo.com/v3".to_string()),

            mailjet_api_key: non_empty("MAILJET_API_KEY"),
            mailjet_secret_key: non_empty("MAILJET_SECRET_KEY"),
            mailjet_api_url: env::var("MAILJET_API_URL")
                .unwrap_or_else(|_| "https://api.mailjet.com/v3.1".to_string()),

            smtp_host: non_empty("SMTP_HOST"),
            smtp_port: parse_or("SMTP_PORT", 587),
            smtp_username: non_empty("SMTP_USER"),
            smtp_password: non_empty("SMTP_PASSWORD"),
            smtp_tls: match env::var("SMTP_TLS").ok().as_deref() {
                Some("tls") => SmtpTls::Tls,
                Some("none") => SmtpTls::None,
                _ => SmtpTls::StartTls,
            },

            from_email: env::var("FROM_EMAIL")
                .unwrap_or_else(|_| "nonreply@precisio.ma".to_string()),
            from_name: env::var("FROM_NAME")
                .unwrap_or_else(|_| "IO Metric - Precision".to_string()),

            to_email: env::var("TO_EMAIL").unwrap_or_else(|_| "contact@precisio.ma".to_string()),
            to_name: env::var("TO_NAME").unwrap_or_else(|_| "IO Metric Team".to_string()),

            site_url: env::var("SITE_URL").unwrap_or_else(|_| "https://precisio.ma".to_string()),

            mail_max_attempts: parse_or("MAIL_MAX_ATTEMPTS", 3u32).max(1),
            mail_backoff_base_ms: parse_or("MAIL_BACKOFF_BASE_MS", 1000),
            mail_timeout_secs: parse_or("MAIL_TIMEOUT_SECS", 60),
        }
    }

    pub fn mail_timeout(&self) -> Duration {
        Duration::from_secs(self.mail_timeout_secs)
    }
}

/// Parse an environment variable, falling back to `default` when unset or malformed.
fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// Read a variable, treating an empty value as unset.
fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
