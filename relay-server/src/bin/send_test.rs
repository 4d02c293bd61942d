//! Send the provider test email without starting the server.
//!
//! Uses the same configuration, mailer and retry policy as `formrelay-web`
//! and exits non-zero when the message could not be delivered.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use formrelay::{
    build_mailer, Config, Dispatcher, MailIdentity, MemoryStore, RetryPolicy, SubmissionPipeline,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    let config = Config::from_env();
    let mailer = build_mailer(&config).context("Failed to build mailer")?;

    info!(
        provider = mailer.name(),
        configured = mailer.configured(),
        to = %config.to_email,
        "send_test_starting"
    );

    if let Err(e) = mailer.verify().await {
        warn!(provider = mailer.name(), error = %e, "mail_provider_unverified");
    }

    let dispatcher = Dispatcher::new(Arc::clone(&mailer), RetryPolicy::from_config(&config));
    let pipeline = SubmissionPipeline::new(
        Arc::new(MemoryStore::new()),
        dispatcher,
        MailIdentity::from_config(&config),
    );

    let result = pipeline.send_test_email().await;
    mailer.close().await;

    let delivery = result.context("Test email failed")?;
    info!(
        provider = delivery.receipt.provider,
        attempts = delivery.attempts,
        message_id = ?delivery.receipt.message_id,
        "send_test_complete"
    );

    Ok(())
}
