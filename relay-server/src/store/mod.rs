//! Append-only record storage.
//!
//! One ordered collection per [`SubmissionKind`]. Appends to the same
//! collection are serialized; records are never mutated or reordered after
//! they are written.

pub mod json_file;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::submission::{Submission, SubmissionKind};

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt collection {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode collection: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persistence capability needed by the pipeline and the admin routes.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Append a record to its kind's collection and return it as stored.
    ///
    /// `submitted_at` is raised to the previous record's stamp when an
    /// earlier-stamped request loses the race for the write lock, keeping
    /// stamps non-decreasing in insertion order.
    async fn append(&self, record: Submission) -> Result<Submission, StoreError>;

    /// All records of `kind` in insertion order.
    async fn list_all(&self, kind: SubmissionKind) -> Result<Vec<Submission>, StoreError>;

    /// Check the backing medium is reachable (health endpoint).
    async fn probe(&self) -> Result<(), StoreError>;

    /// Human-readable location of the backing medium.
    fn location(&self) -> String;
}

/// Keep stamps non-decreasing relative to the collection's last record.
pub(crate) fn order_after(previous: Option<&Submission>, mut record: Submission) -> Submission {
    if let Some(last) = previous {
        if record.submitted_at < last.submitted_at {
            record.submitted_at = last.submitted_at;
        }
    }
    record
}


#[cfg(test)]
mod tests {
    use super::test_support::contact_at;
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_order_after_raises_earlier_stamp() {
        let now = Utc::now();
        let last = contact_at("contact_2", now);
        let late = contact_at("contact_1", now - Duration::milliseconds(5));

        let stored = order_after(Some(&last), late);

        assert_eq!(stored.submitted_at, now);
        assert_eq!(stored.id, "contact_1");
    }

    #[test]
    fn test_order_after_keeps_later_stamp() {
        let now = Utc::now();
        let last = contact_at("contact_1", now);
        let next = contact_at("contact_2", now + Duration::milliseconds(5));

        let stored = order_after(Some(&last), next.clone());

        assert_eq!(stored, next);
    }
}
