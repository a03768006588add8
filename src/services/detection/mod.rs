// Detection Module
// Marathi / code-switched detection organized into specialized submodules:
// - script_analyzer: script composition ratios and core-letter density
// - lexicon: Devanagari/Latin tokenization and vocabulary hits
// - patterns: Marathi-leaning diacritic and letter patterns
// - classifier: weighted confidences, category decision, injected DetectorConfig
// - separator: per-sentence language bucketing of mixed text

pub mod script_analyzer;
pub mod lexicon;
pub mod patterns;
pub mod classifier;
pub mod separator;

// Re-export commonly used items
pub use script_analyzer::{is_devanagari, script_ratios, target_char_density, DEVANAGARI_RANGE};
pub use lexicon::Lexicon;
pub use patterns::PatternSet;
pub use classifier::{
    CategoryThresholds,
    DetectorConfig,
    DetectorConfigError,
    LanguageDetector,
    LatinWeights,
    SeparationThresholds,
    TargetWeights,
};
pub use separator::{split_sentences, Assignment, LATIN_SENTENCE_JOINER, TARGET_SENTENCE_JOINER};
