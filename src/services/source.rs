// Content Source
// Lazy, finite stream of raw posts/comments consumed one record at a time

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::debug;

use crate::models::RawContentRecord;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("source I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed record on line {line}: {message}")]
    Malformed { line: usize, message: String },
}

/// Content-source collaborator. Not restartable: once `None` is returned the stream is done.
#[async_trait]
pub trait ContentSource: Send {
    async fn next_record(&mut self) -> Option<Result<RawContentRecord, SourceError>>;
}

/// Admission rules applied while reading: group allowlist, per-group cap,
/// duplicate ids and records with no text at all.
#[derive(Debug, Default)]
pub struct SourceFilter {
    groups: Option<HashSet<String>>,
    max_per_group: Option<usize>,
    seen_ids: HashSet<String>,
    per_group: HashMap<String, usize>,
}

impl SourceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only admit these groups. An empty list admits everything.
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let groups: HashSet<String> = groups.into_iter().map(Into::into).collect();
        self.groups = if groups.is_empty() { None } else { Some(groups) };
        self
    }

    pub fn with_max_per_group(mut self, max: usize) -> Self {
        self.max_per_group = Some(max);
        self
    }

    pub fn admit(&mut self, record: &RawContentRecord) -> bool {
        if let Some(groups) = &self.groups {
            if !groups.contains(&record.source_group) {
                debug!(id = %record.id, group = %record.source_group, "source.skip.group");
                return false;
            }
        }

        if record.title_str().trim().is_empty() && record.body.trim().is_empty() {
            debug!(id = %record.id, "source.skip.no_text");
            return false;
        }

        if !self.seen_ids.insert(record.id.clone()) {
            debug!(id = %record.id, "source.skip.duplicate");
            return false;
        }

        let count = self.per_group.entry(record.source_group.clone()).or_insert(0);
        if let Some(max) = self.max_per_group {
            if *count >= max {
                debug!(id = %record.id, group = %record.source_group, max, "source.skip.group_cap");
                return false;
            }
        }
        *count += 1;
        true
    }
}

/// One JSON-encoded `RawContentRecord` per line. Blank lines are ignored.
pub struct JsonLinesSource<R> {
    lines: Lines<R>,
    line_no: usize,
    filter: SourceFilter,
}

impl JsonLinesSource<BufReader<File>> {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let file = File::open(path.as_ref()).await?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesSource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            filter: SourceFilter::new(),
        }
    }

    pub fn with_filter(mut self, filter: SourceFilter) -> Self {
        self.filter = filter;
        self
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> ContentSource for JsonLinesSource<R> {
    async fn next_record(&mut self) -> Option<Result<RawContentRecord, SourceError>> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            let record: RawContentRecord = match serde_json::from_str(&line) {
                Ok(record) => record,
                Err(e) => {
                    return Some(Err(SourceError::Malformed {
                        line: self.line_no,
                        message: e.to_string(),
                    }))
                }
            };

            if self.filter.admit(&record) {
                return Some(Ok(record));
            }
        }
    }
}

/// In-memory source, yields records in order without filtering.
#[derive(Debug, Default)]
pub struct VecSource {
    records: VecDeque<RawContentRecord>,
}

impl VecSource {
    pub fn new(records: Vec<RawContentRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }
}

#[async_trait]
impl ContentSource for VecSource {
    async fn next_record(&mut self) -> Option<Result<RawContentRecord, SourceError>> {
        self.records.pop_front().map(Ok)
    }
}
