//! FormRelay - intake backend for the marketing site's quote and contact forms.
//!
//! Shared library for the two binaries:
//! - `formrelay-web`: HTTP server receiving form submissions
//! - `formrelay-send-test`: one-shot mail provider check
//!
//! ## Architecture
//!
//! ```text
//! Browser → web → pipeline → validate → store → render → mail (operator + client)
//! ```
//!
//! A submission that passes validation is always accepted. Storage and email
//! failures are logged and surface only as advisory fields in the response.

pub mod config;
pub mod mail;
pub mod pipeline;
pub mod render;
pub mod store;
pub mod submission;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use mail::{build_mailer, Dispatcher, EmailMessage, MailError, Mailer, RetryPolicy};
pub use pipeline::{MailIdentity, SubmissionOutcome, SubmissionPipeline};
pub use store::{JsonFileStore, MemoryStore, RecordStore, StoreError};
pub use submission::{Submission, SubmissionKind, ValidationError};
pub use web::{router, AppState};
