//! Retrying dispatch over any [`Mailer`].
//!
//! Each attempt is bounded by a timeout. A failed attempt `n` (1-based) that
//! is not the last waits `backoff_base * 2^n` before the next one: with the
//! defaults that is 2s after the first failure and 4s after the second.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

use super::{EmailMessage, MailError, Mailer, SendReceipt};
use crate::config::Config;

/// Attempt budget and pacing for one message.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.mail_max_attempts.max(1),
            backoff_base: Duration::from_millis(config.mail_backoff_base_ms),
            attempt_timeout: config.mail_timeout(),
        }
    }

    /// Delay after failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// A message the provider accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub receipt: SendReceipt,
    pub attempts: u32,
}

/// All attempts failed; carries the last provider error.
#[derive(Debug, Error)]
#[error("email dispatch failed after {attempts} attempt(s): {cause}")]
pub struct DispatchError {
    pub attempts: u32,
    #[source]
    pub cause: MailError,
}

#[derive(Clone)]
pub struct Dispatcher {
    mailer: Arc<dyn Mailer>,
    policy: RetryPolicy,
}

impl Dispatcher {
    pub fn new(mailer: Arc<dyn Mailer>, policy: RetryPolicy) -> Self {
        Self { mailer, policy }
    }

    pub fn mailer(&self) -> &Arc<dyn Mailer> {
        &self.mailer
    }

    /// Send `message`, retrying with exponential backoff.
    ///
    /// Independent calls never share retry state, so two messages dispatched
    /// concurrently succeed or fail on their own.
    pub async fn send(&self, message: &EmailMessage) -> Result<Delivery, DispatchError> {
        let provider = self.mailer.name();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let result = match timeout(self.policy.attempt_timeout, self.mailer.send(message)).await {
                Ok(result) => result,
                Err(_) => Err(MailError::Timeout(self.policy.attempt_timeout)),
            };

            match result {
                Ok(receipt) => {
                    info!(
                        provider = provider,
                        to = %message.to.email,
                        attempt = attempt,
                        message_id = ?receipt.message_id,
                        "dispatch_succeeded"
                    );
                    return Ok(Delivery {
                        receipt,
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    warn!(
                        provider = provider,
                        to = %message.to.email,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        error = %e,
                        "dispatch_attempt_failed"
                    );

                    if attempt >= max_attempts {
                        error!(
                            provider = provider,
                            to = %message.to.email,
                            attempts = attempt,
                            error = %e,
                            "dispatch_exhausted"
                        );
                        return Err(DispatchError {
                            attempts: attempt,
                            cause: e,
                        });
                    }

                    let delay = self.policy.delay_after(attempt);
                    info!(
                        provider = provider,
                        to = %message.to.email,
                        delay_ms = delay.as_millis() as u64,
                        next_attempt = attempt + 1,
                        "dispatch_retry_scheduled"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
