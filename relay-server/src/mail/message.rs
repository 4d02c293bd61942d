//! Provider-neutral email message.

use serde::Serialize;

/// A display name + address pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mailbox {
    pub name: String,
    pub email: String,
}

impl Mailbox {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// One rendered HTML email. Built fresh per request.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub from: Mailbox,
    pub to: Mailbox,
    pub reply_to: Option<Mailbox>,
    pub subject: String,
    pub html: String,
}

/// What a provider returned for an accepted message.
#[derive(Debug, Clone, PartialEq)]
pub struct SendReceipt {
    pub provider: &'static str,
    pub message_id: Option<String>,
}

impl SendReceipt {
    pub fn new(provider: &'static str, message_id: Option<String>) -> Self {
        Self {
            provider,
            message_id,
        }
    }
}
