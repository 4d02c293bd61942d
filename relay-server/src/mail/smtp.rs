//! SMTP transport using lettre.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox as LettreMailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use super::{EmailMessage, MailError, Mailbox, Mailer, SendReceipt};
use crate::config::{Config, SmtpTls};

const PROVIDER: &str = "smtp";

#[derive(Clone)]
pub struct SmtpMailer {
    transport: Arc<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpMailer {
    /// Build the transport from `SMTP_*` settings.
    pub fn from_config(config: &Config) -> Result<Self, MailError> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| MailError::MissingConfig("SMTP_HOST".to_string()))?;

        let mut builder = match config.smtp_tls {
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| MailError::Smtp(e.to_string()))?,
            SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| MailError::Smtp(e.to_string()))?,
        };

        builder = builder
            .port(config.smtp_port)
            .timeout(Some(config.mail_timeout()));

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: Arc::new(builder.build()),
        })
    }
}

fn to_lettre(mailbox: &Mailbox) -> Result<LettreMailbox, MailError> {
    let address = mailbox
        .email
        .parse()
        .map_err(|_| MailError::InvalidAddress(mailbox.email.clone()))?;
    let name = (!mailbox.name.is_empty()).then(|| mailbox.name.clone());
    Ok(LettreMailbox::new(name, address))
}

/// Build a lettre Message from our EmailMessage.
pub(crate) fn build_message(message: &EmailMessage) -> Result<Message, MailError> {
    let mut builder = Message::builder()
        .from(to_lettre(&message.from)?)
        .to(to_lettre(&message.to)?)
        .subject(message.subject.clone())
        .header(ContentType::TEXT_HTML);

    if let Some(reply_to) = &message.reply_to {
        builder = builder.reply_to(to_lettre(reply_to)?);
    }

    builder
        .body(message.html.clone())
        .map_err(|e| MailError::Build(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn send(&self, message: &EmailMessage) -> Result<SendReceipt, MailError> {
        let email = build_message(message)?;

        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| MailError::Smtp(e.to_string()))?;

        let reply = response.message().collect::<Vec<_>>().join(" ");
        info!(
            provider = PROVIDER,
            to = %message.to.email,
            smtp_code = %response.code(),
            "mail_sent"
        );

        Ok(SendReceipt::new(PROVIDER, (!reply.is_empty()).then_some(reply)))
    }

    async fn verify(&self) -> Result<(), MailError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(MailError::Smtp("server did not accept NOOP".to_string())),
            Err(e) => Err(MailError::Smtp(e.to_string())),
        }
    }

    /// Pooled connections are closed when the last transport handle drops.
    async fn close(&self) {
        info!(
            provider = PROVIDER,
            handles = Arc::strong_count(&self.transport),
            "smtp_transport_closed"
        );
    }
}
