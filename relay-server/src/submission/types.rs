//! Submission data model.
//!
//! Records are persisted flat: `{id, ...fields, submittedAt}`. The two kinds
//! are told apart by their required fields, so a collection file can be
//! decoded without a discriminator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discriminator selecting required fields, templates and storage collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionKind {
    Quote,
    Contact,
}

/// Required fields for quote requests, in reporting order.
pub const QUOTE_REQUIRED_FIELDS: &[&str] = &[
    "firstName",
    "lastName",
    "email",
    "company",
    "industry",
    "projectType",
    "description",
    "gdprConsent",
];

/// Required fields for contact messages, in reporting order.
pub const CONTACT_REQUIRED_FIELDS: &[&str] = &["name", "email", "subject", "message", "gdprConsent"];

impl SubmissionKind {
    pub const ALL: [SubmissionKind; 2] = [SubmissionKind::Quote, SubmissionKind::Contact];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionKind::Quote => "quote",
            SubmissionKind::Contact => "contact",
        }
    }

    /// Name of the persisted collection (and of the admin listing key).
    pub fn collection(&self) -> &'static str {
        match self {
            SubmissionKind::Quote => "quotes",
            SubmissionKind::Contact => "contacts",
        }
    }

    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            SubmissionKind::Quote => QUOTE_REQUIRED_FIELDS,
            SubmissionKind::Contact => CONTACT_REQUIRED_FIELDS,
        }
    }

    /// Infer the kind of an untyped payload: quote forms always carry `firstName`.
    pub fn infer(payload: &serde_json::Value) -> Self {
        match payload.get("firstName") {
            Some(v) if !v.is_null() => SubmissionKind::Quote,
            _ => SubmissionKind::Contact,
        }
    }
}

impl std::fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields of a validated quote request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub company: String,
    pub industry: String,
    pub project_type: String,
    pub description: String,
    pub gdpr_consent: bool,
}

impl QuoteFields {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields of a validated contact message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub subject: String,
    pub message: String,
    pub gdpr_consent: bool,
}

/// Validated user-supplied fields, before server metadata is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmissionFields {
    Quote(QuoteFields),
    Contact(ContactFields),
}

impl SubmissionFields {
    pub fn kind(&self) -> SubmissionKind {
        match self {
            SubmissionFields::Quote(_) => SubmissionKind::Quote,
            SubmissionFields::Contact(_) => SubmissionKind::Contact,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            SubmissionFields::Quote(q) => &q.email,
            SubmissionFields::Contact(c) => &c.email,
        }
    }

    /// Display name of the submitter.
    pub fn submitter_name(&self) -> String {
        match self {
            SubmissionFields::Quote(q) => q.full_name(),
            SubmissionFields::Contact(c) => c.name.clone(),
        }
    }

    /// Name used in the acknowledgment salutation.
    pub fn salutation_name(&self) -> &str {
        match self {
            SubmissionFields::Quote(q) => &q.first_name,
            SubmissionFields::Contact(c) => &c.name,
        }
    }
}

/// An accepted submission with its server-assigned metadata.
///
/// Immutable once written to a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    #[serde(flatten)]
    pub fields: SubmissionFields,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(id: String, fields: SubmissionFields, submitted_at: DateTime<Utc>) -> Self {
        Self {
            id,
            fields,
            submitted_at,
        }
    }

    pub fn kind(&self) -> SubmissionKind {
        self.fields.kind()
    }
}
