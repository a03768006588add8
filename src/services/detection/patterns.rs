// Pattern Matcher
// Marathi-leaning diacritics and letters not shared with closely related scripts

use regex::Regex;

/// Retroflex ळ, ऱ, anusvara/visarga, nukta, dependent vowel signs ु..ै.
pub const DEFAULT_PATTERNS: &[&str] = &[
    r"[ळ]",
    r"[ऱ]",
    r"[\u{0902}\u{0903}]",
    r"[\u{093C}]",
    r"[\u{0941}-\u{0948}]",
];

#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    pub fn compile<I>(sources: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let patterns = sources
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn total_matches(&self, text: &str) -> usize {
        self.patterns.iter().map(|re| re.find_iter(text).count()).sum()
    }

    /// Total matches divided by the character count, capped at 1.
    pub fn score(&self, text: &str) -> f64 {
        let len = text.chars().count();
        if len == 0 {
            return 0.0;
        }
        (self.total_matches(text) as f64 / len as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> PatternSet {
        PatternSet::compile(DEFAULT_PATTERNS).unwrap()
    }

    #[test]
    fn test_empty_scores_zero() {
        assert_eq!(defaults().score(""), 0.0);
    }

    #[test]
    fn test_counts_marks_and_letters() {
        // ळ, े (vowel sign), ं (anusvara)
        let set = defaults();
        assert_eq!(set.total_matches("बाळे"), 2);
        assert_eq!(set.total_matches("चांगले"), 2);
        assert_eq!(set.total_matches("english only"), 0);
    }

    #[test]
    fn test_score_is_capped() {
        let set = PatternSet::compile([r".", r"."]).unwrap();
        assert_eq!(set.score("ab"), 1.0);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(PatternSet::compile(["[unclosed"]).is_err());
    }
}
