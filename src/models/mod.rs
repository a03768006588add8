// Marathi Sieve Data Models
// Records flowing from the content source through detection to the sink

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============ Raw Content ============

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Post,
    Comment,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One post or comment as yielded by the content source. Never mutated after it is yielded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawContentRecord {
    pub id: String,
    pub content_type: ContentType,
    pub source_group: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl RawContentRecord {
    pub fn title_str(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// Title and body joined by a single space, trimmed.
    pub fn combined_text(&self) -> String {
        format!("{} {}", self.title_str(), self.body).trim().to_string()
    }
}

// ============ Detection ============

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LanguageCategory {
    PureTarget,
    MixedContent,
    NonTarget,
}

impl LanguageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PureTarget => "pure_target",
            Self::MixedContent => "mixed_content",
            Self::NonTarget => "non_target",
        }
    }
}

impl fmt::Display for LanguageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Share of characters per script. All zero for empty text, otherwise sums to 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct ScriptRatios {
    pub target_script: f64,
    pub latin_script: f64,
    pub other: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct WordCounts {
    pub target: usize,
    pub latin: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionResult {
    pub target_confidence: f64,
    pub latin_confidence: f64,
    pub mixed_confidence: f64,
    pub category: LanguageCategory,
    pub script_ratios: ScriptRatios,
    pub word_counts: WordCounts,
}

impl DetectionResult {
    /// Result for input with nothing to analyze.
    pub fn empty() -> Self {
        Self {
            target_confidence: 0.0,
            latin_confidence: 0.0,
            mixed_confidence: 0.0,
            category: LanguageCategory::NonTarget,
            script_ratios: ScriptRatios::default(),
            word_counts: WordCounts::default(),
        }
    }
}

/// Sentence-level partition of a text into target-language and Latin-script parts.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SeparatedText {
    pub target_text: String,
    pub latin_text: String,
}

// ============ LLM Content Views ============

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SegmentedViews {
    pub sentences: Vec<String>,
    pub target_sentences: Vec<String>,
    pub latin_sentences: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct TokenEstimates {
    pub compact: f64,
    pub context: f64,
    pub clean: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingPromptOutput {
    pub target_content: String,
    pub latin_content: String,
    pub language_category: LanguageCategory,
    pub confidence: f64,
}

/// Instruction-style view for fine-tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingPrompt {
    pub instruction: String,
    pub input: String,
    pub output: TrainingPromptOutput,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmContentViews {
    pub clean: String,
    pub compact: String,
    pub context: String,
    pub segmented: SegmentedViews,
    pub training: TrainingPrompt,
    pub token_estimates: TokenEstimates,
}

/// Record-level facts the view builder needs besides the text itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewMetadata {
    pub content_type: ContentType,
    pub source_group: String,
    /// Content platform the group lives on, e.g. `reddit`.
    pub platform: String,
    pub language_category: LanguageCategory,
    pub target_confidence: f64,
}

// ============ Sink Records ============

/// Field set the sink stores for every accepted record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessedRecord {
    pub id: String,
    pub content_type: ContentType,
    pub source_group: String,
    pub title: Option<String>,
    pub body: Option<String>,
    pub language_category: LanguageCategory,
    pub target_confidence: f64,
    pub target_text: Option<String>,
    pub latin_text: Option<String>,
    pub llm_clean_text: String,
    pub llm_compact_text: String,
    pub llm_context_text: String,
    pub token_count_estimate: f64,
    pub created_at: Option<DateTime<Utc>>,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingMetadata {
    pub language: String,
    pub category: LanguageCategory,
    pub confidence: f64,
    pub content_type: ContentType,
    pub source_group: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextFormats {
    pub raw: String,
    pub clean: String,
    pub compact: String,
    pub context: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingRecord {
    pub id: String,
    pub source: String,
    pub metadata: TrainingMetadata,
    pub text_formats: TextFormats,
    pub language_separated: SeparatedText,
    pub segmented: SegmentedViews,
    pub token_estimates: TokenEstimates,
}

// ============ Run Summary ============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub run_id: String,
    pub processed: usize,
    pub pure_target: usize,
    pub mixed_content: usize,
    pub non_target: usize,
    pub skipped_existing: usize,
    pub skipped_empty: usize,
    pub failed: usize,
    pub inserted: usize,
    pub failed_inserts: usize,
    pub training_exported: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            processed: 0,
            pure_target: 0,
            mixed_content: 0,
            non_target: 0,
            skipped_existing: 0,
            skipped_empty: 0,
            failed: 0,
            inserted: 0,
            failed_inserts: 0,
            training_exported: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}
