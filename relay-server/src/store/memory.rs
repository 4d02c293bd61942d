//! In-memory record store. Records live for the process lifetime only.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{order_after, RecordStore, StoreError};
use crate::submission::{Submission, SubmissionKind};

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<SubmissionKind, Vec<Submission>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn append(&self, record: Submission) -> Result<Submission, StoreError> {
        let mut collections = self.collections.write().await;
        let records = collections.entry(record.kind()).or_default();

        let record = order_after(records.last(), record);
        records.push(record.clone());

        Ok(record)
    }

    async fn list_all(&self, kind: SubmissionKind) -> Result<Vec<Submission>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(&kind).cloned().unwrap_or_default())
    }

    async fn probe(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
