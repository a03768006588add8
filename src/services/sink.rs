// Record Sink Service
// Existence checks, batched inserts with per-record fallback, and training-record export

use async_trait::async_trait;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;
use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::models::{ProcessedRecord, TrainingRecord};

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    #[error("sink rejected write: {0}")]
    Rejected(String),
}

/// Persistent-store collaborator for processed records.
#[async_trait]
pub trait ContentSink: Send + Sync {
    async fn exists(&self, id: &str) -> Result<bool, SinkError>;

    /// All-or-nothing write of one batch. Returns the number of records written.
    async fn insert_batch(&self, records: &[ProcessedRecord]) -> Result<usize, SinkError>;

    async fn insert_one(&self, record: &ProcessedRecord) -> Result<(), SinkError>;
}

/// Receives training-dataset records.
#[async_trait]
pub trait TrainingSink: Send + Sync {
    async fn write(&self, record: &TrainingRecord) -> Result<(), SinkError>;
}

/// Field checks a record must pass before it is sent anywhere.
pub fn validate_record(record: &ProcessedRecord) -> Result<(), SinkError> {
    if record.id.trim().is_empty() {
        return Err(SinkError::InvalidRecord("missing id".to_string()));
    }
    if record.source_group.trim().is_empty() {
        return Err(SinkError::InvalidRecord(format!(
            "record {} has no source_group",
            record.id
        )));
    }
    if !(0.0..=1.0).contains(&record.target_confidence) {
        return Err(SinkError::InvalidRecord(format!(
            "record {} has confidence {} outside [0, 1]",
            record.id, record.target_confidence
        )));
    }
    Ok(())
}

/// Insert `records` in chunks of `batch_size`. A failed chunk is retried one
/// record at a time. Returns `(success_count, failure_count)`; never fails.
pub async fn bulk_insert<S>(sink: &S, records: &[ProcessedRecord], batch_size: usize) -> (usize, usize)
where
    S: ContentSink + ?Sized,
{
    let batch_size = batch_size.max(1);
    let mut success = 0usize;
    let mut failed = 0usize;

    for (batch_index, chunk) in records.chunks(batch_size).enumerate() {
        let mut valid = Vec::with_capacity(chunk.len());
        for record in chunk {
            match validate_record(record) {
                Ok(()) => valid.push(record.clone()),
                Err(e) => {
                    warn!(batch = batch_index, error = %e, "sink.record.invalid");
                    failed += 1;
                }
            }
        }

        if valid.is_empty() {
            continue;
        }

        match sink.insert_batch(&valid).await {
            Ok(written) => {
                info!(batch = batch_index, written, "sink.batch.inserted");
                success += written;
                failed += valid.len().saturating_sub(written);
            }
            Err(e) => {
                warn!(
                    batch = batch_index,
                    size = valid.len(),
                    error = %e,
                    "sink.batch.failed, retrying records individually"
                );
                for record in &valid {
                    match sink.insert_one(record).await {
                        Ok(()) => success += 1,
                        Err(e) => {
                            error!(id = %record.id, error = %e, "sink.record.failed");
                            failed += 1;
                        }
                    }
                }
            }
        }
    }

    (success, failed)
}

// ============ In-memory sinks ============

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<ProcessedRecord>,
    batch_calls: usize,
}

/// In-memory sink with optional failure injection.
#[derive(Debug, Default)]
pub struct MemorySink {
    state: StdMutex<MemoryState>,
    failing_batches: HashSet<usize>,
    failing_ids: HashSet<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the n-th (0-based) `insert_batch` call fail.
    pub fn fail_batch(mut self, call: usize) -> Self {
        self.failing_batches.insert(call);
        self
    }

    /// Make any write of this id fail.
    pub fn fail_id(mut self, id: impl Into<String>) -> Self {
        self.failing_ids.insert(id.into());
        self
    }

    /// Pre-populate as if from an earlier run.
    pub fn with_records(mut self, records: Vec<ProcessedRecord>) -> Self {
        if let Ok(state) = self.state.get_mut() {
            state.records = records;
        }
        self
    }

    pub fn records(&self) -> Vec<ProcessedRecord> {
        self.state
            .lock()
            .map(|s| s.records.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, SinkError> {
        self.state
            .lock()
            .map_err(|_| SinkError::Rejected("memory sink lock poisoned".to_string()))
    }
}

#[async_trait]
impl ContentSink for MemorySink {
    async fn exists(&self, id: &str) -> Result<bool, SinkError> {
        Ok(self.lock()?.records.iter().any(|r| r.id == id))
    }

    async fn insert_batch(&self, records: &[ProcessedRecord]) -> Result<usize, SinkError> {
        let mut state = self.lock()?;
        let call = state.batch_calls;
        state.batch_calls += 1;

        if self.failing_batches.contains(&call) {
            return Err(SinkError::Rejected(format!("batch call {} failed", call)));
        }
        if let Some(bad) = records.iter().find(|r| self.failing_ids.contains(&r.id)) {
            return Err(SinkError::Rejected(format!("record {} refused", bad.id)));
        }

        state.records.extend_from_slice(records);
        Ok(records.len())
    }

    async fn insert_one(&self, record: &ProcessedRecord) -> Result<(), SinkError> {
        if self.failing_ids.contains(&record.id) {
            return Err(SinkError::Rejected(format!("record {} refused", record.id)));
        }
        self.lock()?.records.push(record.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryTrainingSink {
    records: StdMutex<Vec<TrainingRecord>>,
}

impl MemoryTrainingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TrainingRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TrainingSink for MemoryTrainingSink {
    async fn write(&self, record: &TrainingRecord) -> Result<(), SinkError> {
        self.records
            .lock()
            .map_err(|_| SinkError::Rejected("memory training sink lock poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }
}

// ============ JSON-lines sinks ============

async fn open_append(path: &Path) -> Result<File, SinkError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(OpenOptions::new().create(true).append(true).open(path).await?)
}

async fn write_and_flush(file: &mut File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await
}

/// Append `bytes` whole or not at all: a failed write is cut back to the prior length.
async fn append_all(file: &mut File, bytes: &[u8]) -> Result<(), SinkError> {
    let start = file.metadata().await?.len();
    if let Err(e) = write_and_flush(file, bytes).await {
        if let Err(rollback) = file.set_len(start).await {
            error!(error = %rollback, len = start, "sink.jsonl.rollback_failed");
        } else {
            warn!(error = %e, len = start, "sink.jsonl.write_failed, partial write removed");
        }
        return Err(e.into());
    }
    Ok(())
}

fn to_line<T: Serialize>(value: &T) -> Result<String, SinkError> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    Ok(line)
}

struct JsonLinesState {
    file: File,
    ids: HashSet<String>,
}

/// Appends processed records to a JSON-lines file. Ids already in the file
/// are loaded on open so reruns skip them.
pub struct JsonLinesSink {
    path: PathBuf,
    state: Mutex<JsonLinesState>,
}

impl JsonLinesSink {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let path = path.into();
        let ids = Self::load_ids(&path).await?;
        let file = open_append(&path).await?;
        info!(path = %path.display(), existing = ids.len(), "sink.jsonl.opened");
        Ok(Self {
            path,
            state: Mutex::new(JsonLinesState { file, ids }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the ids already stored. A trailing line without a newline is the
    /// remains of an interrupted append and is cut off.
    async fn load_ids(path: &Path) -> Result<HashSet<String>, SinkError> {
        let mut ids = HashSet::new();
        let bytes = match tokio::fs::read(path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };

        let keep = bytes.iter().rposition(|b| *b == b'\n').map_or(0, |i| i + 1);
        if keep < bytes.len() {
            warn!(
                path = %path.display(),
                dropped = bytes.len() - keep,
                "sink.jsonl.truncated_tail"
            );
            let file = OpenOptions::new().write(true).open(path).await?;
            file.set_len(keep as u64).await?;
        }

        for line in String::from_utf8_lossy(&bytes[..keep]).lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HashMap<String, serde_json::Value>>(line) {
                Ok(map) => {
                    if let Some(id) = map.get("id").and_then(|v| v.as_str()) {
                        ids.insert(id.to_string());
                    }
                }
                Err(e) => debug!(error = %e, "sink.jsonl.unreadable_line"),
            }
        }
        Ok(ids)
    }
}

#[async_trait]
impl ContentSink for JsonLinesSink {
    async fn exists(&self, id: &str) -> Result<bool, SinkError> {
        Ok(self.state.lock().await.ids.contains(id))
    }

    async fn insert_batch(&self, records: &[ProcessedRecord]) -> Result<usize, SinkError> {
        // Serialize everything first so a bad record leaves the file untouched.
        let mut buf = String::new();
        for record in records {
            buf.push_str(&to_line(record)?);
        }

        let mut state = self.state.lock().await;
        append_all(&mut state.file, buf.as_bytes()).await?;
        state.ids.extend(records.iter().map(|r| r.id.clone()));
        Ok(records.len())
    }

    async fn insert_one(&self, record: &ProcessedRecord) -> Result<(), SinkError> {
        let line = to_line(record)?;
        let mut state = self.state.lock().await;
        append_all(&mut state.file, line.as_bytes()).await?;
        state.ids.insert(record.id.clone());
        Ok(())
    }
}

pub struct JsonLinesTrainingSink {
    file: Mutex<File>,
}

impl JsonLinesTrainingSink {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let file = open_append(path.as_ref()).await?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

#[async_trait]
impl TrainingSink for JsonLinesTrainingSink {
    async fn write(&self, record: &TrainingRecord) -> Result<(), SinkError> {
        let line = to_line(record)?;
        let mut file = self.file.lock().await;
        append_all(&mut file, line.as_bytes()).await
    }
}
