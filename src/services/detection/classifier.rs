// Language Classifier
// Combines script, lexical, pattern and core-letter signals into confidences and a category
//
// The classifier is a pure function of its input and the immutable DetectorConfig it was
// built with. Decisions use unrounded scores; rounding happens only on the returned values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{DetectionResult, LanguageCategory, ScriptRatios, WordCounts};

use super::lexicon::{Lexicon, DEFAULT_LATIN_WORDS, DEFAULT_TARGET_WORDS};
use super::patterns::{PatternSet, DEFAULT_PATTERNS};
use super::script_analyzer::{script_ratios, target_char_density, DEVANAGARI_RANGE};

/// Classic Marathi vowels and consonants (plus anusvara/visarga), no virama or vowel signs.
pub const DEFAULT_CORE_LETTERS: &str =
    "आइईउऊएऐओऔअंःकखगघङचछजझञटठडढणतथदधनपफबभमयरलवशषसहळऱ";

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Error, Debug)]
pub enum DetectorConfigError {
    #[error("target weights must sum to 1.0, got {0}")]
    WeightSum(f64),
    #[error("weight {name} must be within [0, 1], got {value}")]
    WeightRange { name: &'static str, value: f64 },
    #[error("invalid target script range {start:#06X}..={end:#06X}")]
    ScriptRange { start: u32, end: u32 },
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TargetWeights {
    pub script_ratio: f64,
    pub word_ratio: f64,
    pub pattern_score: f64,
    pub advanced_score: f64,
}

impl Default for TargetWeights {
    fn default() -> Self {
        Self {
            script_ratio: 0.30,
            word_ratio: 0.35,
            pattern_score: 0.20,
            advanced_score: 0.15,
        }
    }
}

impl TargetWeights {
    pub fn sum(&self) -> f64 {
        self.script_ratio + self.word_ratio + self.pattern_score + self.advanced_score
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LatinWeights {
    pub script_ratio: f64,
    pub word_ratio: f64,
}

impl Default for LatinWeights {
    fn default() -> Self {
        Self {
            script_ratio: 0.6,
            word_ratio: 0.4,
        }
    }
}

/// Category cut-offs, checked in order: pure, mixed by confidence, mixed by script share.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CategoryThresholds {
    pub pure_target: f64,
    pub mixed_target: f64,
    pub mixed_latin: f64,
    pub script_fallback: f64,
}

impl Default for CategoryThresholds {
    fn default() -> Self {
        Self {
            pure_target: 0.95,
            mixed_target: 0.60,
            mixed_latin: 0.20,
            script_fallback: 0.30,
        }
    }
}

/// Per-sentence assignment cut-offs used by the separator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeparationThresholds {
    pub target_confidence: f64,
    pub ambiguous_script: f64,
}

impl Default for SeparationThresholds {
    fn default() -> Self {
        Self {
            target_confidence: 0.70,
            ambiguous_script: 0.30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    pub target_range: (u32, u32),
    pub target_words: Vec<String>,
    pub latin_words: Vec<String>,
    pub patterns: Vec<String>,
    pub core_letters: String,
    pub target_weights: TargetWeights,
    pub latin_weights: LatinWeights,
    pub thresholds: CategoryThresholds,
    pub separation: SeparationThresholds,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            target_range: DEVANAGARI_RANGE,
            target_words: DEFAULT_TARGET_WORDS.iter().map(|w| w.to_string()).collect(),
            latin_words: DEFAULT_LATIN_WORDS.iter().map(|w| w.to_string()).collect(),
            patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
            core_letters: DEFAULT_CORE_LETTERS.to_string(),
            target_weights: TargetWeights::default(),
            latin_weights: LatinWeights::default(),
            thresholds: CategoryThresholds::default(),
            separation: SeparationThresholds::default(),
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), DetectorConfigError> {
        let (start, end) = self.target_range;
        if start > end || char::from_u32(start).is_none() || char::from_u32(end).is_none() {
            return Err(DetectorConfigError::ScriptRange { start, end });
        }

        let w = &self.target_weights;
        let named = [
            ("target.script_ratio", w.script_ratio),
            ("target.word_ratio", w.word_ratio),
            ("target.pattern_score", w.pattern_score),
            ("target.advanced_score", w.advanced_score),
            ("latin.script_ratio", self.latin_weights.script_ratio),
            ("latin.word_ratio", self.latin_weights.word_ratio),
        ];
        for (name, value) in named {
            if !(0.0..=1.0).contains(&value) {
                return Err(DetectorConfigError::WeightRange { name, value });
            }
        }

        let sum = w.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(DetectorConfigError::WeightSum(sum));
        }
        Ok(())
    }
}

/// Deterministic multi-signal Marathi detector.
#[derive(Debug, Clone)]
pub struct LanguageDetector {
    config: DetectorConfig,
    lexicon: Lexicon,
    patterns: PatternSet,
}

impl LanguageDetector {
    pub fn new(config: DetectorConfig) -> Result<Self, DetectorConfigError> {
        config.validate()?;
        let lexicon = Lexicon::new(&config.target_words, &config.latin_words);
        let patterns = PatternSet::compile(&config.patterns)?;
        Ok(Self {
            config,
            lexicon,
            patterns,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn script_ratios(&self, text: &str) -> ScriptRatios {
        script_ratios(text, self.config.target_range)
    }

    pub fn word_counts(&self, text: &str) -> WordCounts {
        let (target, latin) = self.lexicon.word_counts(text, self.config.target_range);
        WordCounts { target, latin }
    }

    pub fn pattern_score(&self, text: &str) -> f64 {
        self.patterns.score(text)
    }

    pub fn advanced_score(&self, text: &str) -> f64 {
        target_char_density(text, &self.config.core_letters, self.config.target_range)
    }

    /// Score `title + " " + text` and decide its category.
    pub fn detect(&self, text: &str, title: &str) -> DetectionResult {
        let full_text = format!("{} {}", title, text);
        let full_text = full_text.trim();
        if full_text.is_empty() {
            return DetectionResult::empty();
        }

        let ratios = self.script_ratios(full_text);
        let words = self.word_counts(full_text);
        let pattern_score = self.pattern_score(full_text);
        let advanced_score = self.advanced_score(full_text);

        let total_words = (words.target + words.latin).max(1) as f64;
        let word_ratio = words.target as f64 / total_words;
        let latin_word_ratio = words.latin as f64 / total_words;

        let tw = &self.config.target_weights;
        let target_confidence = tw.script_ratio * ratios.target_script
            + tw.word_ratio * word_ratio
            + tw.pattern_score * pattern_score
            + tw.advanced_score * advanced_score;

        let lw = &self.config.latin_weights;
        let latin_confidence =
            lw.script_ratio * ratios.latin_script + lw.word_ratio * latin_word_ratio;

        let category = self.categorize(target_confidence, latin_confidence, &ratios);

        DetectionResult {
            target_confidence: round3(target_confidence),
            latin_confidence: round3(latin_confidence),
            mixed_confidence: round3((target_confidence + latin_confidence).min(1.0)),
            category,
            script_ratios: ratios,
            word_counts: words,
        }
    }

    fn categorize(&self, target: f64, latin: f64, ratios: &ScriptRatios) -> LanguageCategory {
        let t = &self.config.thresholds;
        if target >= t.pure_target {
            LanguageCategory::PureTarget
        } else if target >= t.mixed_target && latin >= t.mixed_latin {
            LanguageCategory::MixedContent
        } else if ratios.target_script >= t.script_fallback {
            LanguageCategory::MixedContent
        } else {
            LanguageCategory::NonTarget
        }
    }
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default()).expect("built-in detector config")
    }
}

#[inline]
fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(DetectorConfig::default().validate().is_ok());
        assert!((TargetWeights::default().sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input() {
        let detector = LanguageDetector::default();
        let result = detector.detect("", "");
        assert_eq!(result, DetectionResult::empty());
        assert_eq!(result.category, LanguageCategory::NonTarget);
        assert_eq!(detector.detect("   ", "  ").target_confidence, 0.0);
    }

    #[test]
    fn test_no_letters_is_non_target() {
        let detector = LanguageDetector::default();
        let result = detector.detect("12345 !!! ###", "");
        assert_eq!(result.category, LanguageCategory::NonTarget);
        assert_eq!(result.target_confidence, 0.0);
        assert_eq!(result.latin_confidence, 0.0);
    }

    #[test]
    fn test_vocabulary_sentence_scores() {
        // 10 Devanagari chars over 13, all four words in the vocabulary,
        // 2 vowel-sign matches, 6 of 10 chars are core letters.
        let detector = LanguageDetector::default();
        let result = detector.detect("आहे आणि मी तू", "");
        let expected = 0.30 * (10.0 / 13.0) + 0.35 + 0.20 * (2.0 / 13.0) + 0.15 * 0.6;
        assert!((result.target_confidence - round3(expected)).abs() < 1e-9);
        assert_eq!(result.word_counts, WordCounts { target: 4, latin: 0 });
        assert_eq!(result.latin_confidence, 0.0);
        // Below the pure threshold, caught by the script-share rule.
        assert_eq!(result.category, LanguageCategory::MixedContent);
    }

    #[test]
    fn test_word_heavy_config_reaches_pure() {
        let config = DetectorConfig {
            target_weights: TargetWeights {
                script_ratio: 0.0,
                word_ratio: 1.0,
                pattern_score: 0.0,
                advanced_score: 0.0,
            },
            ..DetectorConfig::default()
        };
        let detector = LanguageDetector::new(config).unwrap();
        let result = detector.detect("आहे आणि मी तू", "");
        assert_eq!(result.target_confidence, 1.0);
        assert_eq!(result.category, LanguageCategory::PureTarget);
    }

    #[test]
    fn test_pure_wins_regardless_of_latin() {
        let config = DetectorConfig {
            target_weights: TargetWeights {
                script_ratio: 0.0,
                word_ratio: 1.0,
                pattern_score: 0.0,
                advanced_score: 0.0,
            },
            ..DetectorConfig::default()
        };
        let detector = LanguageDetector::new(config).unwrap();
        // Latin letters present but no Latin vocabulary hits
        let result = detector.detect("आहे xyz qqq आणि", "");
        assert!(result.latin_confidence > 0.2);
        assert_eq!(result.category, LanguageCategory::PureTarget);
    }

    #[test]
    fn test_code_switched_is_mixed() {
        let detector = LanguageDetector::default();
        let result = detector.detect("This is good. हे चांगले आहे.", "");
        assert_eq!(result.category, LanguageCategory::MixedContent);
        assert_eq!(result.word_counts, WordCounts { target: 2, latin: 3 });
        assert!(result.latin_confidence > 0.0);
    }

    #[test]
    fn test_english_is_non_target() {
        let detector = LanguageDetector::default();
        let result = detector.detect("What a good day this was", "Weather");
        assert_eq!(result.category, LanguageCategory::NonTarget);
        assert_eq!(result.target_confidence, 0.0);
        assert!(result.latin_confidence > 0.5);
    }

    #[test]
    fn test_title_is_included() {
        let detector = LanguageDetector::default();
        let with_title = detector.detect("", "मराठी");
        assert_eq!(with_title.word_counts.target, 1);
    }

    #[test]
    fn test_detect_is_deterministic() {
        let detector = LanguageDetector::default();
        let text = "पुणे is a good शहर, आणि मुंबई पण!";
        let a = detector.detect(text, "title");
        let b = detector.detect(text, "title");
        assert_eq!(a, b);
        assert_eq!(a.target_confidence.to_bits(), b.target_confidence.to_bits());
    }

    #[test]
    fn test_adding_target_words_does_not_decrease_confidence() {
        let detector = LanguageDetector::default();
        let mut text = String::from("this is a simple english line");
        let mut prev = detector.detect(&text, "").target_confidence;
        for word in ["आहे", "आणि", "मराठी", "पुणे", "छान"] {
            text.push(' ');
            text.push_str(word);
            let next = detector.detect(&text, "").target_confidence;
            assert!(next >= prev, "{next} < {prev} after adding {word}");
            prev = next;
        }
    }

    #[test]
    fn test_mixed_confidence_is_capped() {
        let detector = LanguageDetector::default();
        let result = detector.detect("good आहे", "");
        assert!(result.mixed_confidence <= 1.0);
    }

    #[test]
    fn test_rejects_bad_weight_sum() {
        let config = DetectorConfig {
            target_weights: TargetWeights {
                script_ratio: 0.5,
                ..TargetWeights::default()
            },
            ..DetectorConfig::default()
        };
        assert!(matches!(
            LanguageDetector::new(config),
            Err(DetectorConfigError::WeightSum(_))
        ));
    }

    #[test]
    fn test_rejects_inverted_range_and_bad_pattern() {
        let config = DetectorConfig {
            target_range: (0x097F, 0x0900),
            ..DetectorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DetectorConfigError::ScriptRange { .. })
        ));

        let config = DetectorConfig {
            patterns: vec!["(".to_string()],
            ..DetectorConfig::default()
        };
        assert!(matches!(
            LanguageDetector::new(config),
            Err(DetectorConfigError::Pattern(_))
        ));
    }

    #[test]
    fn test_config_round_trips_through_json_with_defaults() {
        let parsed: DetectorConfig =
            serde_json::from_str(r#"{"thresholds":{"pure_target":0.9}}"#).unwrap();
        assert_eq!(parsed.thresholds.pure_target, 0.9);
        assert_eq!(parsed.thresholds.mixed_target, 0.60);
        assert_eq!(parsed.target_words.len(), DEFAULT_TARGET_WORDS.len());
    }
}
