// Sentence Separator
// Splits code-switched text into sentences and buckets each one by language

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{LanguageCategory, SeparatedText};

use super::classifier::LanguageDetector;

/// Joins target-language sentences.
pub const TARGET_SENTENCE_JOINER: &str = " । ";
/// Joins Latin-script sentences.
pub const LATIN_SENTENCE_JOINER: &str = ". ";

fn terminator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[।!?.\n]+").expect("sentence terminator regex"))
}

/// Split on danda, `.`, `!`, `?` and newlines; terminators are dropped, pieces trimmed.
pub fn split_sentences(text: &str) -> Vec<&str> {
    terminator_re()
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Where a single sentence goes. A sentence may land in both buckets or in neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Assignment {
    pub target: bool,
    pub latin: bool,
}

impl LanguageDetector {
    pub fn assign_sentence(&self, sentence: &str) -> Assignment {
        let detection = self.detect(sentence, "");
        let sep = &self.config().separation;

        if detection.category == LanguageCategory::PureTarget
            || detection.target_confidence > sep.target_confidence
        {
            return Assignment { target: true, latin: false };
        }
        if detection.latin_confidence > detection.target_confidence {
            return Assignment { target: false, latin: true };
        }

        let ratios = detection.script_ratios;
        Assignment {
            target: ratios.target_script > sep.ambiguous_script,
            latin: ratios.latin_script > sep.ambiguous_script,
        }
    }

    /// Partition `text` sentence by sentence, preserving order within each side.
    pub fn separate(&self, text: &str) -> SeparatedText {
        if text.is_empty() {
            return SeparatedText::default();
        }

        let mut target_sentences: Vec<&str> = Vec::new();
        let mut latin_sentences: Vec<&str> = Vec::new();

        for sentence in split_sentences(text) {
            let assignment = self.assign_sentence(sentence);
            if assignment.target {
                target_sentences.push(sentence);
            }
            if assignment.latin {
                latin_sentences.push(sentence);
            }
        }

        SeparatedText {
            target_text: target_sentences.join(TARGET_SENTENCE_JOINER),
            latin_text: latin_sentences.join(LATIN_SENTENCE_JOINER),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_drops_terminators_and_blanks() {
        let parts = split_sentences("एक। two!! three?\n\n  चार . ");
        assert_eq!(parts, vec!["एक", "two", "three", "चार"]);
    }

    #[test]
    fn test_empty_input() {
        let detector = LanguageDetector::default();
        assert_eq!(detector.separate(""), SeparatedText::default());
        assert_eq!(detector.separate(" .\n! "), SeparatedText::default());
    }

    #[test]
    fn test_separates_english_and_marathi_sentences() {
        let detector = LanguageDetector::default();
        let separated = detector.separate("This is good. हे चांगले आहे.");
        assert_eq!(separated.latin_text, "This is good");
        assert_eq!(separated.target_text, "हे चांगले आहे");
    }

    #[test]
    fn test_vocabulary_sentence_goes_to_target() {
        let detector = LanguageDetector::default();
        let separated = detector.separate("आहे आणि मी तू");
        assert_eq!(separated.target_text, "आहे आणि मी तू");
        assert_eq!(separated.latin_text, "");
    }

    #[test]
    fn test_order_is_preserved_per_side() {
        let detector = LanguageDetector::default();
        let text = "हे चांगले आहे। This is good। मराठी छान आहे। What was that";
        let separated = detector.separate(text);
        assert_eq!(separated.target_text, "हे चांगले आहे । मराठी छान आहे");
        assert_eq!(separated.latin_text, "This is good. What was that");
    }

    #[test]
    fn test_symbols_only_sentence_is_dropped() {
        let detector = LanguageDetector::default();
        let separated = detector.separate("12345. हे चांगले आहे");
        assert_eq!(separated.target_text, "हे चांगले आहे");
        assert_eq!(separated.latin_text, "");
    }

    #[test]
    fn test_ambiguous_dual_script_sentence_lands_in_both() {
        let detector = LanguageDetector::default();
        // No vocabulary hits on either side, roughly half of each script.
        let assignment = detector.assign_sentence("कटपट xyzw");
        assert_eq!(assignment, Assignment { target: true, latin: true });
    }
}
