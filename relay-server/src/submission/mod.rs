//! Submission model and intake.
//!
//! ```text
//! raw JSON → validate() → SubmissionFields → (+ id, submittedAt) → Submission
//! ```

pub mod id;
pub mod types;
pub mod validate;

pub use id::{acceptance_time, generate_id};
pub use types::{
    ContactFields, QuoteFields, Submission, SubmissionFields, SubmissionKind,
    CONTACT_REQUIRED_FIELDS, QUOTE_REQUIRED_FIELDS,
};
pub use validate::{validate, ValidationError};
