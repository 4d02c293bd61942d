//! JSON-file record store.
//!
//! Each kind lives in its own pretty-printed JSON array
//! (`quotes.json`, `contacts.json`). Every append reads the whole array,
//! pushes one record and rewrites it through a temp file + rename, under a
//! per-collection lock.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{order_after, RecordStore, StoreError};
use crate::submission::{Submission, SubmissionKind};

pub struct JsonFileStore {
    dir: PathBuf,
    quotes_lock: Mutex<()>,
    contacts_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            quotes_lock: Mutex::new(()),
            contacts_lock: Mutex::new(()),
        }
    }

    /// Create the data directory and empty collections if missing.
    pub async fn init(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;

        for kind in SubmissionKind::ALL {
            let path = self.path_for(kind);
            match fs::metadata(&path).await {
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    write_atomic(&path, b"[]").await?;
                    info!(collection = kind.collection(), path = %path.display(), "store_collection_created");
                }
                Err(e) => return Err(io_error(&path, e)),
            }
        }

        info!(directory = %self.dir.display(), "store_initialized");
        Ok(())
    }

    pub fn path_for(&self, kind: SubmissionKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.collection()))
    }

    fn lock_for(&self, kind: SubmissionKind) -> &Mutex<()> {
        match kind {
            SubmissionKind::Quote => &self.quotes_lock,
            SubmissionKind::Contact => &self.contacts_lock,
        }
    }

    async fn read_collection(&self, kind: SubmissionKind) -> Result<Vec<Submission>, StoreError> {
        let path = self.path_for(kind);

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&path, e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let records: Vec<Submission> =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: path.display().to_string(),
                source,
            })?;

        // A quote-shaped record in contacts.json (or vice versa) means the file was edited by hand
        if let Some(stray) = records.iter().find(|r| r.kind() != kind) {
            warn!(
                collection = kind.collection(),
                record_id = %stray.id,
                "store_foreign_record_in_collection"
            );
        }

        Ok(records)
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn append(&self, record: Submission) -> Result<Submission, StoreError> {
        let kind = record.kind();
        let _guard = self.lock_for(kind).lock().await;

        let mut records = self.read_collection(kind).await?;
        let record = order_after(records.last(), record);
        records.push(record.clone());

        let body = serde_json::to_vec_pretty(&records)?;
        write_atomic(&self.path_for(kind), &body).await?;

        info!(
            collection = kind.collection(),
            record_id = %record.id,
            total = records.len(),
            "store_record_appended"
        );

        Ok(record)
    }

    async fn list_all(&self, kind: SubmissionKind) -> Result<Vec<Submission>, StoreError> {
        // Writers replace the file by rename, so readers never see a partial array
        self.read_collection(kind).await
    }

    async fn probe(&self) -> Result<(), StoreError> {
        fs::metadata(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;
        for kind in SubmissionKind::ALL {
            let path = self.path_for(kind);
            fs::metadata(&path).await.map_err(|e| io_error(&path, e))?;
        }
        Ok(())
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}

async fn write_atomic(path: &Path, body: &[u8]) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body).await.map_err(|e| io_error(&tmp, e))?;
    fs::rename(&tmp, path).await.map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}
