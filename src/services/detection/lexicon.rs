// Lexical Matcher
// Tokenizes Devanagari and Latin runs and matches them against curated vocabularies

use std::collections::HashSet;

use super::script_analyzer::in_range;

/// Function words, place names and common verbs/adjectives in Marathi.
pub const DEFAULT_TARGET_WORDS: &[&str] = &[
    "आहे", "आणि", "तर", "पण", "मी", "तू", "तो", "ती", "ते", "आम्ही", "तुम्ही",
    "काय", "कसे", "कुठे", "केव्हा", "कोण", "किती", "कशासाठी", "कसा", "कसं",
    "मराठी", "महाराष्ट्र", "मुंबई", "पुणे", "नागपूर", "कोल्हापूर", "नाशिक",
    "छान", "चांगले", "वाईट", "मोठे", "लहान", "नवीन", "जुने", "गरम", "थंड",
    "घर", "शाळा", "कॉलेज", "ऑफिस", "दुकान", "हॉस्पिटल", "स्टेशन",
    "खाणे", "पिणे", "येणे", "जाणे", "बघणे", "ऐकणे", "बोलणे", "वाचणे", "लिहिणे",
    "होय", "नाही", "ठीक", "चल", "अरे", "अहो", "काहीही", "सगळे", "काही", "सर्व",
];

/// Common English function words and adjectives seen in code-switched text.
pub const DEFAULT_LATIN_WORDS: &[&str] = &[
    "the", "and", "or", "but", "is", "are", "was", "were", "have", "has", "had",
    "will", "would", "could", "should", "can", "may", "might", "must",
    "this", "that", "these", "those", "what", "where", "when", "why", "how",
    "good", "bad", "big", "small", "new", "old", "hot", "cold", "fast", "slow",
];

/// Exact-match vocabularies. Latin entries are stored lower-cased.
#[derive(Debug, Clone)]
pub struct Lexicon {
    target_words: HashSet<String>,
    latin_words: HashSet<String>,
}

impl Lexicon {
    pub fn new<T, L>(target_words: T, latin_words: L) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        L: IntoIterator,
        L::Item: AsRef<str>,
    {
        Self {
            target_words: target_words
                .into_iter()
                .map(|w| w.as_ref().trim().to_string())
                .filter(|w| !w.is_empty())
                .collect(),
            latin_words: latin_words
                .into_iter()
                .map(|w| w.as_ref().trim().to_ascii_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    pub fn is_target_word(&self, word: &str) -> bool {
        self.target_words.contains(word)
    }

    pub fn is_latin_word(&self, word: &str) -> bool {
        self.latin_words.contains(&word.to_ascii_lowercase())
    }

    /// Count vocabulary hits as `(target, latin)`.
    pub fn word_counts(&self, text: &str, target_range: (u32, u32)) -> (usize, usize) {
        let target_hits = target_script_words(text, target_range)
            .filter(|w| self.is_target_word(w))
            .count();
        let latin_hits = latin_words(text)
            .filter(|w| self.is_latin_word(w))
            .count();
        (target_hits, latin_hits)
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_WORDS, DEFAULT_LATIN_WORDS)
    }
}

/// Maximal runs of characters satisfying `pred`.
fn runs<'a, F>(text: &'a str, pred: F) -> impl Iterator<Item = &'a str> + 'a
where
    F: Fn(char) -> bool + 'a,
{
    text.split(move |c: char| !pred(c)).filter(|w| !w.is_empty())
}

pub fn target_script_words(text: &str, target_range: (u32, u32)) -> impl Iterator<Item = &str> {
    runs(text, move |c| in_range(c, target_range))
}

pub fn latin_words(text: &str) -> impl Iterator<Item = &str> {
    runs(text, |c| c.is_ascii_alphabetic())
}
