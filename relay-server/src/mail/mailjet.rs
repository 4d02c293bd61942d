//! Mailjet Send API v3.1.
//!
//! Reference: https://dev.mailjet.com/email/reference/send-emails/

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use super::{base_url, ensure_success, EmailMessage, MailError, Mailer, SendReceipt};

const PROVIDER: &str = "mailjet";

pub struct MailjetMailer {
    client: Client,
    api_key: String,
    secret_key: String,
    base: Url,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct MailjetAddress<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct MailjetMessage<'a> {
    from: MailjetAddress<'a>,
    to: Vec<MailjetAddress<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<MailjetAddress<'a>>,
    subject: &'a str,
    #[serde(rename = "HTMLPart")]
    html_part: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct MailjetSendRequest<'a> {
    messages: Vec<MailjetMessage<'a>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MailjetSendResponse {
    #[serde(default)]
    messages: Vec<MailjetMessageResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MailjetMessageResult {
    #[serde(default)]
    status: String,
    #[serde(default)]
    to: Vec<MailjetRecipientResult>,
}

#[derive(Debug, Deserialize)]
struct MailjetRecipientResult {
    #[serde(rename = "MessageID")]
    message_id: Option<u64>,
}

impl MailjetMailer {
    pub fn new(
        api_key: String,
        secret_key: String,
        base_url_raw: &str,
        timeout: Duration,
    ) -> Result<Self, MailError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(MailError::Http)?;

        Ok(Self {
            client,
            api_key,
            secret_key,
            base: base_url(base_url_raw)?,
        })
    }
}

fn request_body(message: &EmailMessage) -> MailjetSendRequest<'_> {
    MailjetSendRequest {
        messages: vec![MailjetMessage {
            from: MailjetAddress {
                email: &message.from.email,
                name: &message.from.name,
            },
            to: vec![MailjetAddress {
                email: &message.to.email,
                name: &message.to.name,
            }],
            reply_to: message.reply_to.as_ref().map(|m| MailjetAddress {
                email: &m.email,
                name: &m.name,
            }),
            subject: &message.subject,
            html_part: &message.html,
        }],
    }
}

#[async_trait]
impl Mailer for MailjetMailer {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn send(&self, message: &EmailMessage) -> Result<SendReceipt, MailError> {
        let url = self
            .base
            .join("send")
            .map_err(|e| MailError::Build(format!("invalid Mailjet endpoint: {e}")))?;

        let response = self
            .client
            .post(url)
            .basic_auth(&self.api_key, Some(&self.secret_key))
            .json(&request_body(message))
            .send()
            .await?;

        let response = ensure_success(PROVIDER, response).await?;
        let parsed: MailjetSendResponse = response.json().await.unwrap_or_default();

        // A 200 can still carry a per-message error status
        if let Some(result) = parsed.messages.first() {
            if !result.status.is_empty() && result.status != "success" {
                return Err(MailError::Provider {
                    provider: PROVIDER,
                    status: 200,
                    body: format!("message status {}", result.status),
                });
            }
        }

        let message_id = parsed
            .messages
            .first()
            .and_then(|m| m.to.first())
            .and_then(|r| r.message_id)
            .map(|id| id.to_string());

        info!(
            provider = PROVIDER,
            to = %message.to.email,
            message_id = ?message_id,
            "mail_sent"
        );

        Ok(SendReceipt::new(PROVIDER, message_id))
    }

    async fn verify(&self) -> Result<(), MailError> {
        // v3.1 has no account probe; credentials are checked on first send
        if self.api_key.is_empty() || self.secret_key.is_empty() {
            return Err(MailError::MissingConfig(
                "MAILJET_API_KEY / MAILJET_SECRET_KEY".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::Mailbox;

    fn message() -> EmailMessage {
        EmailMessage {
            from: Mailbox::new("IO Metric - Precision", "nonreply@precisio.ma"),
            to: Mailbox::new("Alice", "alice@example.com"),
            reply_to: None,
            subject: "✅ Confirmation de votre message - IO Metric".to_string(),
            html: "<p>Merci</p>".to_string(),
        }
    }

    #[test]
    fn test_request_body_shape() {
        let msg = message();
        let body = serde_json::to_value(request_body(&msg)).unwrap();

        let first = &body["Messages"][0];
        assert_eq!(first["From"]["Email"], "nonreply@precisio.ma");
        assert_eq!(first["To"][0]["Name"], "Alice");
        assert_eq!(first["HTMLPart"], "<p>Merci</p>");
        assert!(first.get("ReplyTo").is_none());
    }

    #[test]
    fn test_response_message_id_extraction() {
        let raw = r#"{"Messages":[{"Status":"success","To":[{"Email":"alice@example.com","MessageID":576460752303423488}]}]}"#;
        let parsed: MailjetSendResponse = serde_json::from_str(raw).unwrap();

        assert_eq!(parsed.messages[0].status, "success");
        assert_eq!(parsed.messages[0].to[0].message_id, Some(576460752303423488));
    }

    #[tokio::test]
    async fn test_verify_requires_both_keys() {
        let mailer = MailjetMailer::new(
            "key".to_string(),
            String::new(),
            "https://api.mailjet.com/v3.1",
            Duration::from_secs(5),
        )
        .unwrap();

        assert!(matches!(mailer.verify().await, Err(MailError::MissingConfig(_))));
    }
}
