//! Submission pipeline - the core intake flow.
//!
//! ```text
//! validate → stamp (id, submittedAt) → persist (best-effort) → render → dispatch ×2 (concurrent)
//! ```
//!
//! Only validation (and the rare internal failure before persistence) stops
//! the flow. A store or email failure after that is logged and reported in
//! the outcome's advisory fields; the submission is still accepted.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::mail::{Delivery, DispatchError, Dispatcher, EmailMessage, Mailbox};
use crate::render::{render, render_test_email, Branding};
use crate::store::{RecordStore, StoreError};
use crate::submission::{
    acceptance_time, generate_id, validate, Submission, SubmissionKind, ValidationError,
};
use crate::Config;

/// Shown to the visitor as the expected reply delay.
pub const ESTIMATED_RESPONSE: &str = "24 heures";

/// Advisory note when acknowledgment or notification email is still pending.
pub const EMAIL_PENDING_NOTE: &str = "email pending";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

/// Addresses and branding used for every outgoing message.
#[derive(Debug, Clone, PartialEq)]
pub struct MailIdentity {
    /// Sender of all messages (usually a no-reply address)
    pub sender: Mailbox,
    /// Business inbox receiving notifications
    pub operator: Mailbox,
    pub branding: Branding,
}

impl MailIdentity {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sender: Mailbox::new(&config.from_name, &config.from_email),
            operator: Mailbox::new(&config.to_name, &config.to_email),
            branding: Branding {
                company_name: config.from_name.clone(),
                site_url: config.site_url.clone(),
                contact_email: config.to_email.clone(),
            },
        }
    }
}

/// Everything that happened to one accepted submission.
#[derive(Debug)]
pub struct SubmissionOutcome {
    /// The record as stored, or the in-memory stand-in when storing failed
    pub submission: Submission,
    pub persistence: Result<(), StoreError>,
    pub operator_dispatch: Result<Delivery, DispatchError>,
    pub client_dispatch: Result<Delivery, DispatchError>,
}

impl SubmissionOutcome {
    pub fn persisted(&self) -> bool {
        self.persistence.is_ok()
    }

    pub fn emails_delivered(&self) -> bool {
        self.operator_dispatch.is_ok() && self.client_dispatch.is_ok()
    }

    /// Body returned to the browser. Always a success body: acceptance is
    /// decoupled from storage and email delivery.
    pub fn response(&self) -> SubmissionResponse {
        let delivered = self.emails_delivered();
        let message = match (self.submission.kind(), delivered) {
            (SubmissionKind::Quote, true) => "Demande de devis envoyée avec succès",
            (SubmissionKind::Quote, false) => "Demande de devis reçue avec succès",
            (SubmissionKind::Contact, true) => "Message envoyé avec succès",
            (SubmissionKind::Contact, false) => "Message reçu avec succès",
        };

        SubmissionResponse {
            message: message.to_string(),
            id: self.submission.id.clone(),
            estimated_response: ESTIMATED_RESPONSE.to_string(),
            note: (!delivered).then(|| EMAIL_PENDING_NOTE.to_string()),
            persisted: (!self.persisted()).then_some(false),
        }
    }
}

/// JSON body of a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub message: String,
    pub id: String,
    pub estimated_response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persisted: Option<bool>,
}

/// Orchestrates intake for both submission kinds.
///
/// Holds no per-request state; one instance is shared by all requests.
pub struct SubmissionPipeline {
    store: Arc<dyn RecordStore>,
    dispatcher: Dispatcher,
    identity: MailIdentity,
}

impl SubmissionPipeline {
    pub fn new(store: Arc<dyn RecordStore>, dispatcher: Dispatcher, identity: MailIdentity) -> Self {
        Self {
            store,
            dispatcher,
            identity,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run one raw payload through the pipeline.
    pub async fn handle(
        &self,
        kind: SubmissionKind,
        payload: &Value,
    ) -> Result<SubmissionOutcome, PipelineError> {
        info!(kind = %kind, "submission_received");

        let fields = validate(kind, payload).map_err(|e| {
            warn!(kind = %kind, error = %e, "submission_rejected");
            e
        })?;

        let submitted_at = acceptance_time();
        let id = generate_id(kind, submitted_at)?;
        let candidate = Submission::new(id, fields, submitted_at);

        let (submission, persistence) = match self.store.append(candidate.clone()).await {
            Ok(stored) => {
                info!(kind = %kind, record_id = %stored.id, "submission_persisted");
                (stored, Ok(()))
            }
            Err(e) => {
                error!(
                    kind = %kind,
                    record_id = %candidate.id,
                    error = %e,
                    "submission_persist_failed"
                );
                (candidate, Err(e))
            }
        };

        let (operator_message, client_message) = self.messages_for(&submission);

        let (operator_dispatch, client_dispatch) = futures::future::join(
            self.dispatcher.send(&operator_message),
            self.dispatcher.send(&client_message),
        )
        .await;

        let outcome = SubmissionOutcome {
            submission,
            persistence,
            operator_dispatch,
            client_dispatch,
        };

        if outcome.emails_delivered() {
            info!(
                kind = %kind,
                record_id = %outcome.submission.id,
                persisted = outcome.persisted(),
                "submission_completed"
            );
        } else {
            warn!(
                kind = %kind,
                record_id = %outcome.submission.id,
                persisted = outcome.persisted(),
                operator_email_ok = outcome.operator_dispatch.is_ok(),
                client_email_ok = outcome.client_dispatch.is_ok(),
                "submission_completed_email_pending"
            );
        }

        Ok(outcome)
    }

    /// Operator notification and client acknowledgment for a submission.
    fn messages_for(&self, submission: &Submission) -> (EmailMessage, EmailMessage) {
        let rendered = render(submission, &self.identity.branding);
        let submitter = Mailbox::new(
            submission.fields.submitter_name(),
            submission.fields.email(),
        );

        let operator = EmailMessage {
            from: self.identity.sender.clone(),
            to: self.identity.operator.clone(),
            reply_to: Some(submitter.clone()),
            subject: rendered.operator_subject,
            html: rendered.operator_body,
        };

        let client = EmailMessage {
            from: self.identity.sender.clone(),
            to: submitter,
            reply_to: Some(self.identity.operator.clone()),
            subject: rendered.client_subject,
            html: rendered.client_body,
        };

        (operator, client)
    }

    /// Send the provider check email to the operator inbox.
    pub async fn send_test_email(&self) -> Result<Delivery, DispatchError> {
        let provider = self.dispatcher.mailer().name();
        let (subject, html) = render_test_email(provider, Utc::now());

        let message = EmailMessage {
            from: self.identity.sender.clone(),
            to: self.identity.operator.clone(),
            reply_to: None,
            subject,
            html,
        };

        self.dispatcher.send(&message).await
    }
}
