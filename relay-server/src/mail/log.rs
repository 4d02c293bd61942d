//! Mailer that logs instead of sending, for local development.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::info;

use super::{EmailMessage, MailError, Mailer, SendReceipt};

#[derive(Default)]
pub struct LogMailer {
    sent: AtomicU64,
}

impl LogMailer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Mailer for LogMailer {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, message: &EmailMessage) -> Result<SendReceipt, MailError> {
        let n = self.sent.fetch_add(1, Ordering::Relaxed) + 1;

        info!(
            from = %message.from.email,
            to = %message.to.email,
            reply_to = ?message.reply_to.as_ref().map(|m| m.email.as_str()),
            subject = %message.subject,
            html_length = message.html.len(),
            "mail_logged"
        );

        Ok(SendReceipt::new("log", Some(format!("log-{n}"))))
    }

    async fn verify(&self) -> Result<(), MailError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::Mailbox;

    #[tokio::test]
    async fn test_log_mailer_numbers_messages() {
        let mailer = LogMailer::new();
        let message = EmailMessage {
            from: Mailbox::new("Site", "nonreply@example.com"),
            to: Mailbox::new("Ops", "ops@example.com"),
            reply_to: None,
            subject: "Hello".to_string(),
            html: "<p>Hi</p>".to_string(),
        };

        let first = mailer.send(&message).await.unwrap();
        let second = mailer.send(&message).await.unwrap();

        assert_eq!(first.message_id.as_deref(), Some("log-1"));
        assert_eq!(second.message_id.as_deref(), Some("log-2"));
    }
}
