// Content Pipeline
// Pulls raw records from a source, classifies and separates them, builds views,
// and flushes processed records to the sink in batches

use chrono::Utc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::{
    LanguageCategory, ProcessedRecord, RawContentRecord, RunSummary, TrainingRecord, ViewMetadata,
};

use super::config_store::{AppConfig, PipelineConfig, TrainingConfig};
use super::content_views::{build_training_record, build_views};
use super::detection::{DetectorConfigError, LanguageDetector};
use super::sink::{bulk_insert, ContentSink, TrainingSink};
use super::source::{ContentSource, SourceError};
use super::training_validator::{check_training_content, TrainingRejection};

/// Per-record failure. Counted and logged; never stops the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("record has no id")]
    MissingId,
    #[error("record {0} has no source group")]
    MissingSourceGroup(String),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Raised after the pending batch has been flushed; `summary` covers the work done so far.
    #[error("content source failed: {error}")]
    Source {
        #[source]
        error: SourceError,
        summary: Box<RunSummary>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyText,
    NonTarget,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedItem {
    pub record: ProcessedRecord,
    /// Training record, or why the target text was not fit for training.
    pub training: Result<TrainingRecord, TrainingRejection>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Processed(Box<ProcessedItem>),
    Skipped(SkipReason),
}

pub struct ContentPipeline {
    detector: LanguageDetector,
    pipeline: PipelineConfig,
    training: TrainingConfig,
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

impl ContentPipeline {
    pub fn new(config: &AppConfig) -> Result<Self, DetectorConfigError> {
        let detector = LanguageDetector::new(config.detection.clone())?;
        Ok(Self::with_detector(
            detector,
            config.pipeline.clone(),
            config.training.clone(),
        ))
    }

    pub fn with_detector(
        detector: LanguageDetector,
        pipeline: PipelineConfig,
        training: TrainingConfig,
    ) -> Self {
        Self {
            detector,
            pipeline,
            training,
        }
    }

    pub fn detector(&self) -> &LanguageDetector {
        &self.detector
    }

    /// Classify one record and build its sink and training records. No I/O.
    pub fn process_record(&self, raw: &RawContentRecord) -> Result<RecordOutcome, ProcessError> {
        if raw.id.trim().is_empty() {
            return Err(ProcessError::MissingId);
        }
        if raw.source_group.trim().is_empty() {
            return Err(ProcessError::MissingSourceGroup(raw.id.clone()));
        }

        let combined = raw.combined_text();
        if combined.is_empty() {
            return Ok(RecordOutcome::Skipped(SkipReason::EmptyText));
        }

        let detection = self.detector.detect(&raw.body, raw.title_str());
        let (target_text, latin_text) = match detection.category {
            LanguageCategory::NonTarget => return Ok(RecordOutcome::Skipped(SkipReason::NonTarget)),
            LanguageCategory::MixedContent => {
                let separated = self.detector.separate(&combined);
                (separated.target_text, separated.latin_text)
            }
            LanguageCategory::PureTarget => (combined.clone(), String::new()),
        };

        let metadata = ViewMetadata {
            content_type: raw.content_type,
            source_group: raw.source_group.clone(),
            platform: self.pipeline.platform.clone(),
            language_category: detection.category,
            target_confidence: detection.target_confidence,
        };
        let views = build_views(raw.title_str(), &raw.body, &target_text, &latin_text, &metadata);

        let training_text = if target_text.trim().is_empty() {
            views.clean.clone()
        } else {
            target_text.clone()
        };

        let record = ProcessedRecord {
            id: raw.id.clone(),
            content_type: raw.content_type,
            source_group: raw.source_group.clone(),
            title: raw.title.clone().and_then(non_empty),
            body: non_empty(raw.body.clone()),
            language_category: detection.category,
            target_confidence: detection.target_confidence,
            target_text: non_empty(target_text),
            latin_text: non_empty(latin_text),
            llm_clean_text: views.clean.clone(),
            llm_compact_text: views.compact.clone(),
            llm_context_text: views.context.clone(),
            token_count_estimate: views.token_estimates.clean,
            created_at: Some(raw.created_at),
            parent_id: raw.parent_id.clone(),
        };

        let training = check_training_content(
            &training_text,
            self.training.min_length,
            self.training.max_length,
        )
        .map(|()| build_training_record(&record, &views, &self.pipeline.platform));

        Ok(RecordOutcome::Processed(Box::new(ProcessedItem { record, training })))
    }

    /// Drain `source` into `sink` until it is exhausted or `cancel` fires.
    /// Cancellation lets the record in hand finish and flushes the pending batch.
    pub async fn run(
        &self,
        source: &mut dyn ContentSource,
        sink: &dyn ContentSink,
        training_sink: Option<&dyn TrainingSink>,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, PipelineError> {
        let batch_size = self.pipeline.batch_size.max(1);
        let mut summary = RunSummary::new(Uuid::new_v4().to_string());
        let mut batch: Vec<ProcessedRecord> = Vec::with_capacity(batch_size);

        info!(run_id = %summary.run_id, batch_size, "pipeline.run.start");

        loop {
            if cancel.is_cancelled() {
                info!(run_id = %summary.run_id, "pipeline.cancelled");
                break;
            }

            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(run_id = %summary.run_id, "pipeline.cancelled during fetch");
                    break;
                }
                next = source.next_record() => next,
            };

            let raw = match next {
                None => break,
                Some(Ok(raw)) => raw,
                Some(Err(e @ SourceError::Malformed { .. })) => {
                    warn!(run_id = %summary.run_id, error = %e, "pipeline.record.unreadable");
                    summary.failed += 1;
                    continue;
                }
                Some(Err(e)) => {
                    error!(run_id = %summary.run_id, error = %e, "pipeline.source.failed");
                    self.flush(sink, &mut batch, &mut summary).await;
                    summary.finished_at = Some(Utc::now());
                    return Err(PipelineError::Source {
                        error: e,
                        summary: Box::new(summary),
                    });
                }
            };

            self.handle_record(&raw, sink, training_sink, &mut batch, &mut summary)
                .await;

            if batch.len() >= batch_size {
                self.flush(sink, &mut batch, &mut summary).await;
            }
        }

        self.flush(sink, &mut batch, &mut summary).await;
        summary.finished_at = Some(Utc::now());

        info!(
            run_id = %summary.run_id,
            processed = summary.processed,
            pure_target = summary.pure_target,
            mixed_content = summary.mixed_content,
            non_target = summary.non_target,
            skipped_existing = summary.skipped_existing,
            skipped_empty = summary.skipped_empty,
            failed = summary.failed,
            inserted = summary.inserted,
            failed_inserts = summary.failed_inserts,
            training_exported = summary.training_exported,
            "pipeline.run.finished"
        );

        Ok(summary)
    }

    async fn handle_record(
        &self,
        raw: &RawContentRecord,
        sink: &dyn ContentSink,
        training_sink: Option<&dyn TrainingSink>,
        batch: &mut Vec<ProcessedRecord>,
        summary: &mut RunSummary,
    ) {
        if batch.iter().any(|r| r.id == raw.id) {
            summary.skipped_existing += 1;
            return;
        }
        match sink.exists(&raw.id).await {
            Ok(true) => {
                debug!(id = %raw.id, "pipeline.skip.existing");
                summary.skipped_existing += 1;
                return;
            }
            Ok(false) => {}
            Err(e) => warn!(id = %raw.id, error = %e, "sink.exists failed, treating record as new"),
        }

        let item = match self.process_record(raw) {
            Ok(RecordOutcome::Processed(item)) => item,
            Ok(RecordOutcome::Skipped(SkipReason::EmptyText)) => {
                summary.skipped_empty += 1;
                return;
            }
            Ok(RecordOutcome::Skipped(SkipReason::NonTarget)) => {
                summary.processed += 1;
                summary.non_target += 1;
                self.report_progress(summary);
                return;
            }
            Err(e) => {
                warn!(id = %raw.id, error = %e, "pipeline.record.failed");
                summary.failed += 1;
                return;
            }
        };

        let ProcessedItem { record, training } = *item;
        summary.processed += 1;
        match record.language_category {
            LanguageCategory::PureTarget => summary.pure_target += 1,
            LanguageCategory::MixedContent => summary.mixed_content += 1,
            LanguageCategory::NonTarget => summary.non_target += 1,
        }

        match (training, training_sink) {
            (Ok(training), Some(out)) => match out.write(&training).await {
                Ok(()) => summary.training_exported += 1,
                Err(e) => warn!(id = %record.id, error = %e, "training.export.failed"),
            },
            (Err(reason), Some(_)) => {
                debug!(id = %record.id, reason = %reason, "training.export.rejected")
            }
            (_, None) => {}
        }

        batch.push(record);
        self.report_progress(summary);
    }

    fn report_progress(&self, summary: &RunSummary) {
        let every = self.pipeline.progress_every;
        if every > 0 && summary.processed % every == 0 {
            info!(
                run_id = %summary.run_id,
                processed = summary.processed,
                pure_target = summary.pure_target,
                mixed_content = summary.mixed_content,
                non_target = summary.non_target,
                "pipeline.progress"
            );
        }
    }

    async fn flush(
        &self,
        sink: &dyn ContentSink,
        batch: &mut Vec<ProcessedRecord>,
        summary: &mut RunSummary,
    ) {
        if batch.is_empty() {
            return;
        }
        let (ok, failed) = bulk_insert(sink, batch, self.pipeline.batch_size).await;
        summary.inserted += ok;
        summary.failed_inserts += failed;
        info!(
            run_id = %summary.run_id,
            size = batch.len(),
            inserted = ok,
            failed,
            "pipeline.batch.flushed"
        );
        batch.clear();
    }
}
