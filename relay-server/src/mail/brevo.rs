//! Brevo (ex-Sendinblue) transactional email API.
//!
//! Reference: https://developers.brevo.com/reference/sendtransacemail

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use super::{base_url, ensure_success, EmailMessage, MailError, Mailer, SendReceipt};

const PROVIDER: &str = "brevo";

pub struct BrevoMailer {
    client: Client,
    api_key: String,
    base: Url,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoContact<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoSendRequest<'a> {
    sender: BrevoContact<'a>,
    to: Vec<BrevoContact<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<BrevoContact<'a>>,
    subject: &'a str,
    html_content: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrevoSendResponse {
    message_id: Option<String>,
}

impl BrevoMailer {
    pub fn new(api_key: String, base_url_raw: &str, timeout: Duration) -> Result<Self, MailError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(MailError::Http)?;

        Ok(Self {
            client,
            api_key,
            base: base_url(base_url_raw)?,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, MailError> {
        self.base
            .join(path)
            .map_err(|e| MailError::Build(format!("invalid Brevo endpoint {path}: {e}")))
    }
}

fn request_body(message: &EmailMessage) -> BrevoSendRequest<'_> {
    BrevoSendRequest {
        sender: BrevoContact {
            email: &message.from.email,
            name: &message.from.name,
        },
        to: vec![BrevoContact {
            email: &message.to.email,
            name: &message.to.name,
        }],
        reply_to: message.reply_to.as_ref().map(|m| BrevoContact {
            email: &m.email,
            name: &m.name,
        }),
        subject: &message.subject,
        html_content: &message.html,
    }
}

#[async_trait]
impl Mailer for BrevoMailer {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn send(&self, message: &EmailMessage) -> Result<SendReceipt, MailError> {
        let response = self
            .client
            .post(self.endpoint("smtp/email")?)
            .header("api-key", &self.api_key)
            .header("accept", "application/json")
            .json(&request_body(message))
            .send()
            .await?;

        let response = ensure_success(PROVIDER, response).await?;
        let parsed: BrevoSendResponse = response.json().await.unwrap_or(BrevoSendResponse { message_id: None });

        info!(
            provider = PROVIDER,
            to = %message.to.email,
            message_id = ?parsed.message_id,
            "mail_sent"
        );

        Ok(SendReceipt::new(PROVIDER, parsed.message_id))
    }

    async fn verify(&self) -> Result<(), MailError> {
        let response = self
            .client
            .get(self.endpoint("account")?)
            .header("api-key", &self.api_key)
            .header("accept", "application/json")
            .send()
            .await?;

        ensure_success(PROVIDER, response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use super::*;
    use crate::mail::Mailbox;

    type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    fn message() -> EmailMessage {
        EmailMessage {
            from: Mailbox::new("IO Metric - Precision", "nonreply@precisio.ma"),
            to: Mailbox::new("IO Metric Team", "contact@precisio.ma"),
            reply_to: Some(Mailbox::new("Alice", "alice@example.com")),
            subject: "📧 Nouveau message de contact - Info".to_string(),
            html: "<p>Hello</p>".to_string(),
        }
    }

    async fn capture(
        State(captured): State<Captured>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let key = headers
            .get("api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let authorized = key.as_deref() == Some("test-key");
        captured.lock().unwrap().push((key, body));

        if authorized {
            (StatusCode::CREATED, Json(json!({"messageId": "<202401@smtp-relay.brevo.com>"})))
        } else {
            (StatusCode::UNAUTHORIZED, Json(json!({"code": "unauthorized"})))
        }
    }

    /// Serve a fake Brevo API on an ephemeral port.
    async fn fake_brevo() -> (String, Captured) {
        let captured: Captured = Arc::default();
        let app = Router::new()
            .route("/v3/smtp/email", post(capture))
            .route("/v3/account", get(|| async { Json(json!({"email": "ops@precisio.ma"})) }))
            .with_state(Arc::clone(&captured));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/v3"), captured)
    }

    #[test]
    fn test_request_body_shape() {
        let msg = message();
        let body = serde_json::to_value(request_body(&msg)).unwrap();

        assert_eq!(body["sender"]["email"], "nonreply@precisio.ma");
        assert_eq!(body["to"][0]["email"], "contact@precisio.ma");
        assert_eq!(body["replyTo"]["email"], "alice@example.com");
        assert_eq!(body["htmlContent"], "<p>Hello</p>");
    }

    #[test]
    fn test_request_body_omits_reply_to() {
        let mut msg = message();
        msg.reply_to = None;

        let body = serde_json::to_value(request_body(&msg)).unwrap();

        assert!(body.get("replyTo").is_none());
    }

    #[tokio::test]
    async fn test_send_success() {
        let (base, captured) = fake_brevo().await;
        let mailer = BrevoMailer::new("test-key".to_string(), &base, Duration::from_secs(5)).unwrap();

        let receipt = mailer.send(&message()).await.unwrap();

        assert_eq!(receipt.provider, "brevo");
        assert_eq!(receipt.message_id.as_deref(), Some("<202401@smtp-relay.brevo.com>"));

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].1["subject"], "📧 Nouveau message de contact - Info");
    }

    #[tokio::test]
    async fn test_send_rejected_maps_to_provider_error() {
        let (base, _captured) = fake_brevo().await;
        let mailer = BrevoMailer::new("wrong-key".to_string(), &base, Duration::from_secs(5)).unwrap();

        let err = mailer.send(&message()).await.unwrap_err();

        match err {
            MailError::Provider { provider, status, .. } => {
                assert_eq!(provider, "brevo");
                assert_eq!(status, 401);
            }
            other => panic!("Expected Provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_verify_hits_account_endpoint() {
        let (base, _captured) = fake_brevo().await;
        let mailer = BrevoMailer::new("test-key".to_string(), &base, Duration::from_secs(5)).unwrap();

        assert!(mailer.verify().await.is_ok());
    }
}
