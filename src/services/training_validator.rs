// Training Content Validator
// Accepts or rejects a language-separated span for model-training use

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

use super::detection::is_devanagari;

pub const DEFAULT_MIN_LENGTH: usize = 10;
pub const DEFAULT_MAX_LENGTH: usize = 2048;
const MIN_TARGET_SCRIPT_CHARS: usize = 3;

/// Why content was rejected. Only the first failing check is reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrainingRejection {
    #[error("empty content")]
    Empty,
    #[error("content too short ({actual} < {min})")]
    TooShort { actual: usize, min: usize },
    #[error("content too long ({actual} > {max})")]
    TooLong { actual: usize, max: usize },
    #[error("insufficient meaningful content")]
    InsufficientMeaningful,
    #[error("insufficient target-script characters ({found} < 3)")]
    InsufficientTargetScript { found: usize },
}

/// Whitespace, digits, punctuation and combining marks. Devanagari vowel signs and
/// viramas are marks, so only base letters count as meaningful.
fn non_meaningful_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s\d\W\p{M}]").expect("non-meaningful regex"))
}

/// Length, meaningful-character and Devanagari-density checks, in that order.
pub fn check_training_content(
    content: &str,
    min_length: usize,
    max_length: usize,
) -> Result<(), TrainingRejection> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(TrainingRejection::Empty);
    }

    let len = trimmed.chars().count();
    if len < min_length {
        return Err(TrainingRejection::TooShort {
            actual: len,
            min: min_length,
        });
    }
    if len > max_length {
        return Err(TrainingRejection::TooLong {
            actual: len,
            max: max_length,
        });
    }

    let meaningful = non_meaningful_re().replace_all(trimmed, "");
    if meaningful.chars().count() < min_length / 2 {
        return Err(TrainingRejection::InsufficientMeaningful);
    }

    let found = trimmed.chars().filter(|c| is_devanagari(*c)).count();
    if found < MIN_TARGET_SCRIPT_CHARS {
        return Err(TrainingRejection::InsufficientTargetScript { found });
    }

    Ok(())
}

/// `(valid, reason)` form of [`check_training_content`].
pub fn validate_for_training(content: &str, min_length: usize, max_length: usize) -> (bool, String) {
    match check_training_content(content, min_length, max_length) {
        Ok(()) => (true, "valid for training".to_string()),
        Err(rejection) => (false, rejection.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(content: &str) -> (bool, String) {
        validate_for_training(content, DEFAULT_MIN_LENGTH, DEFAULT_MAX_LENGTH)
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(validate("   \n"), (false, "empty content".to_string()));
    }

    #[test]
    fn test_too_short() {
        let (valid, reason) = validate("short");
        assert!(!valid);
        assert!(reason.contains("too short"));
        assert!(reason.contains("5 < 10"));
    }

    #[test]
    fn test_length_check_precedes_script_check() {
        // Too short and no Devanagari at all: the length reason wins.
        assert_eq!(
            check_training_content("abc", 10, 2048),
            Err(TrainingRejection::TooShort { actual: 3, min: 10 })
        );
    }

    #[test]
    fn test_too_long() {
        let long = "मराठी ".repeat(100);
        assert_eq!(
            check_training_content(&long, 10, 50),
            Err(TrainingRejection::TooLong {
                actual: long.trim().chars().count(),
                max: 50
            })
        );
    }

    #[test]
    fn test_insufficient_meaningful_content() {
        assert_eq!(
            check_training_content("12345 !!! ### 678", 10, 2048),
            Err(TrainingRejection::InsufficientMeaningful)
        );
    }

    #[test]
    fn test_vowel_signs_are_not_meaningful() {
        // 11 chars but only 4 base letters; the vowel signs do not count.
        assert_eq!(
            check_training_content("कि कि कि कि", 10, 2048),
            Err(TrainingRejection::InsufficientMeaningful)
        );
        assert_eq!(check_training_content("कि कि कि किक", 10, 2048), Ok(()));
    }

    #[test]
    fn test_insufficient_target_script() {
        let (valid, reason) = validate("This is a perfectly fine English sentence");
        assert!(!valid);
        assert!(reason.starts_with("insufficient target-script characters"));
    }

    #[test]
    fn test_valid_marathi() {
        assert_eq!(check_training_content("हे चांगले आहे, मराठी छान आहे", 10, 2048), Ok(()));
        assert!(validate("हे चांगले आहे, मराठी छान आहे").0);
    }

    #[test]
    fn test_length_counts_chars() {
        // 5 chars, 15 UTF-8 bytes
        assert!(matches!(
            check_training_content("मराठी", 10, 2048),
            Err(TrainingRejection::TooShort { actual: 5, .. })
        ));
    }
}
