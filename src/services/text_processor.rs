// Text Processing Service
// Markup cleanup, Devanagari normalization, hint-driven sentence segmentation and token estimates

use htmlentity::entity::{decode, ICodedDataTrait};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

use crate::models::LanguageCategory;

/// Rough tokens-per-word factor for mixed Marathi/English text.
pub const TOKENS_PER_WORD: f64 = 1.3;

/// One ordered markup substitution. Flags such as multiline are inline in the pattern.
struct MarkupRule {
    pattern: Regex,
    replacement: &'static str,
}

fn markup_rules() -> &'static [MarkupRule] {
    static RULES: OnceLock<Vec<MarkupRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        // Order matters: bold before italic, spoilers before quote markers.
        [
            (r"\*\*(.*?)\*\*", "$1"),        // bold
            (r"\*(.*?)\*", "$1"),            // italic
            (r"~~(.*?)~~", "$1"),            // strikethrough
            (r"\[([^\]]+)\]\([^)]+\)", "$1"), // [text](url) -> text
            (r">!([^!]+)!<", "$1"),          // spoiler
            (r"(?m)^>\s*", ""),              // quote marker
            (r"(?m)^\s*\*\s+", ""),          // list bullet
            (r"(?m)^\s*\d+\.\s+", ""),       // numbered list
        ]
        .into_iter()
        .map(|(pattern, replacement)| MarkupRule {
            pattern: Regex::new(pattern).expect("markup regex"),
            replacement,
        })
        .collect()
    })
}

/// Devanagari punctuation folded to ASCII, and invisible joiners dropped.
const SCRIPT_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("।", "."),
    ("॥", ".."),
    ("\u{200C}", ""),
    ("\u{200D}", ""),
    ("\u{FEFF}", ""),
];

/// Unescape HTML entities and strip post markup (emphasis, links, spoilers, quotes, lists).
pub fn clean_markup(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut s = decode(text.as_bytes())
        .to_string()
        .unwrap_or_else(|_| text.to_string());

    for rule in markup_rules() {
        s = rule.pattern.replace_all(&s, rule.replacement).into_owned();
    }

    s.trim().to_string()
}

/// NFKC, fold Devanagari full stops to ASCII, drop zero-width joiners and BOM.
/// Spacing around the folded stops is left as written. Idempotent.
pub fn normalize_script(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut s: String = text.nfkc().collect();
    for (from, to) in SCRIPT_SUBSTITUTIONS {
        s = s.replace(from, to);
    }

    // Dropping joiners can leave combining marks adjacent; recompose.
    s.nfkc().collect()
}

/// Which sentence boundaries to trust when segmenting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageHint {
    Target,
    Foreign,
    Mixed,
}

impl From<LanguageCategory> for LanguageHint {
    fn from(category: LanguageCategory) -> Self {
        match category {
            LanguageCategory::PureTarget => Self::Target,
            LanguageCategory::MixedContent => Self::Mixed,
            LanguageCategory::NonTarget => Self::Foreign,
        }
    }
}

fn target_boundary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Dandas are already folded to periods by normalize_script.
    RE.get_or_init(|| Regex::new(r"[।॥.]+\s*").expect("target boundary regex"))
}

fn foreign_boundary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+\s+").expect("foreign boundary regex"))
}

fn danda_boundary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[।॥]+\s*").expect("danda boundary regex"))
}

fn push_trimmed<'a>(out: &mut Vec<String>, pieces: impl Iterator<Item = &'a str>) {
    out.extend(
        pieces
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    );
}

/// Clean, normalize, then split into sentences according to `hint`.
pub fn segment_sentences(text: &str, hint: LanguageHint) -> Vec<String> {
    if text.is_empty() {
        return vec![];
    }

    let text = normalize_script(&clean_markup(text));
    let mut sentences = Vec::new();

    match hint {
        LanguageHint::Target => push_trimmed(&mut sentences, target_boundary_re().split(&text)),
        LanguageHint::Foreign => push_trimmed(&mut sentences, foreign_boundary_re().split(&text)),
        LanguageHint::Mixed => {
            for segment in danda_boundary_re().split(&text) {
                if segment.chars().any(|c| c.is_ascii_alphabetic()) {
                    push_trimmed(&mut sentences, foreign_boundary_re().split(segment));
                } else {
                    push_trimmed(&mut sentences, target_boundary_re().split(segment));
                }
            }
        }
    }

    sentences
}

/// Whitespace word count times a fixed factor. Not a tokenizer.
pub fn estimate_tokens(text: &str) -> f64 {
    text.split_whitespace().count() as f64 * TOKENS_PER_WORD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_markup_strips_emphasis_and_links() {
        let input = "**bold** and *it* ~~gone~~ [पुणे](https://example.com/pune)";
        assert_eq!(clean_markup(input), "bold and it gone पुणे");
    }

    #[test]
    fn test_clean_markup_unescapes_entities() {
        assert_eq!(clean_markup("Tom &amp; Jerry &quot;live&quot;"), "Tom & Jerry \"live\"");
    }

    #[test]
    fn test_clean_markup_strips_block_markers() {
        let input = "&gt; quoted line\n* first item\n2. numbered item";
        assert_eq!(clean_markup(input), "quoted line\nfirst item\nnumbered item");
    }

    #[test]
    fn test_clean_markup_reveals_spoilers() {
        assert_eq!(clean_markup("&gt;!secret!&lt; आहे"), "secret आहे");
    }

    #[test]
    fn test_clean_markup_empty() {
        assert_eq!(clean_markup(""), "");
        assert_eq!(clean_markup("   "), "");
    }

    #[test]
    fn test_normalize_script_folds_dandas_and_joiners() {
        assert_eq!(normalize_script("मराठी।  भाषा॥"), "मराठी.  भाषा..");
        assert_eq!(normalize_script("क्\u{200D}ष\u{FEFF}"), "क्ष");
    }

    #[test]
    fn test_normalize_script_keeps_spacing_around_stops() {
        assert_eq!(normalize_script("मी।तू"), "मी.तू");
        assert_eq!(normalize_script("किंमत 3.14 रुपये ।"), "किंमत 3.14 रुपये .");
    }

    #[test]
    fn test_normalize_script_applies_nfkc() {
        assert_eq!(normalize_script("ﬁne ＡＢＣ"), "fine ABC");
    }

    #[test]
    fn test_normalize_script_is_idempotent() {
        let samples = [
            "",
            "हे चांगले आहे। This is good॥",
            "क\u{200C}\u{093C}ख\u{200D}\u{0941}",
            "ﬁ ＡＢＣ \u{FEFF}मी",
            "  spaced   ।   out  ",
        ];
        for s in samples {
            let once = normalize_script(s);
            assert_eq!(normalize_script(&once), once, "input {s:?}");
        }
    }

    #[test]
    fn test_segment_target_hint() {
        let sentences = segment_sentences("हे चांगले आहे। मराठी छान आहे॥", LanguageHint::Target);
        assert_eq!(sentences, vec!["हे चांगले आहे", "मराठी छान आहे"]);
    }

    #[test]
    fn test_segment_foreign_hint_keeps_decimals() {
        let sentences = segment_sentences("Pi is 3.14 roughly. That was easy!", LanguageHint::Foreign);
        assert_eq!(sentences, vec!["Pi is 3.14 roughly", "That was easy!"]);
    }

    #[test]
    fn test_segment_mixed_hint() {
        let sentences = segment_sentences(
            "Hello there. How are you? हे चांगले आहे। मराठी छान",
            LanguageHint::Mixed,
        );
        assert_eq!(
            sentences,
            vec!["Hello there", "How are you", "हे चांगले आहे", "मराठी छान"]
        );

        let sentences = segment_sentences("हे चांगले आहे। मराठी छान", LanguageHint::Mixed);
        assert_eq!(sentences, vec!["हे चांगले आहे", "मराठी छान"]);
    }

    #[test]
    fn test_segment_empty() {
        assert!(segment_sentences("", LanguageHint::Mixed).is_empty());
        assert!(segment_sentences(" ** ** ", LanguageHint::Target).is_empty());
    }

    #[test]
    fn test_hint_from_category() {
        assert_eq!(LanguageHint::from(LanguageCategory::PureTarget), LanguageHint::Target);
        assert_eq!(LanguageHint::from(LanguageCategory::MixedContent), LanguageHint::Mixed);
        assert_eq!(LanguageHint::from(LanguageCategory::NonTarget), LanguageHint::Foreign);
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0.0);
        assert!((estimate_tokens("Hello मराठी world") - 3.9).abs() < 1e-9);
    }
}
