// Content View Builder
// Produces the LLM-facing text views and the training-dataset record for one item

use crate::models::{
    LlmContentViews, ProcessedRecord, SegmentedViews, SeparatedText, TextFormats, TokenEstimates,
    TrainingMetadata, TrainingPrompt, TrainingPromptOutput, TrainingRecord, ViewMetadata,
};

use super::text_processor::{
    clean_markup, estimate_tokens, normalize_script, segment_sentences, LanguageHint,
};

const TARGET_TITLE_LABEL: &str = "शीर्षक";
const LATIN_TITLE_LABEL: &str = "Title";
const TARGET_TEXT_LABEL: &str = "मराठी";
const LATIN_TEXT_LABEL: &str = "English";
const COMPACT_SEPARATOR: &str = " | ";
const PARAGRAPH_SEPARATOR: &str = "\n\n";
const TRAINING_LANGUAGE: &str = "marathi";

/// Build every view from raw title/body and the separated language text.
/// Pure: identical inputs always give identical views.
pub fn build_views(
    title: &str,
    body: &str,
    target_text: &str,
    latin_text: &str,
    metadata: &ViewMetadata,
) -> LlmContentViews {
    let title = clean_markup(title);
    let body = clean_markup(body);
    let target_text = normalize_script(target_text);
    let latin_text = clean_markup(latin_text);

    let compact = compact_view(&title, &target_text, &latin_text);
    let context = context_view(&title, &body, &target_text, &latin_text, metadata);
    let clean = join_non_empty(&[&title, &body], PARAGRAPH_SEPARATOR);

    let combined = format!("{} {}", title, body);
    let segmented = SegmentedViews {
        sentences: segment_sentences(combined.trim(), metadata.language_category.into()),
        target_sentences: if target_text.is_empty() {
            vec![]
        } else {
            segment_sentences(&target_text, LanguageHint::Target)
        },
        latin_sentences: if latin_text.is_empty() {
            vec![]
        } else {
            segment_sentences(&latin_text, LanguageHint::Foreign)
        },
    };

    let training = TrainingPrompt {
        instruction: format!(
            "Analyze this {} from {}",
            metadata.content_type,
            group_label(&metadata.platform, &metadata.source_group)
        ),
        input: format!("{}{}{}", title, PARAGRAPH_SEPARATOR, body)
            .trim()
            .to_string(),
        output: TrainingPromptOutput {
            target_content: target_text.clone(),
            latin_content: latin_text.clone(),
            language_category: metadata.language_category,
            confidence: metadata.target_confidence,
        },
    };

    let token_estimates = TokenEstimates {
        compact: estimate_tokens(&compact),
        context: estimate_tokens(&context),
        clean: estimate_tokens(&clean),
    };

    LlmContentViews {
        clean,
        compact,
        context,
        segmented,
        training,
        token_estimates,
    }
}

/// How the platform itself writes a group name: `r/<group>` on reddit,
/// `<platform>/<group>` elsewhere.
fn group_label(platform: &str, group: &str) -> String {
    if platform.eq_ignore_ascii_case("reddit") {
        format!("r/{}", group)
    } else {
        format!("{}/{}", platform, group)
    }
}

fn join_non_empty(parts: &[&str], separator: &str) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(separator)
}

fn compact_view(title: &str, target_text: &str, latin_text: &str) -> String {
    let mut parts = Vec::new();
    if !title.is_empty() {
        let label = if target_text.is_empty() {
            LATIN_TITLE_LABEL
        } else {
            TARGET_TITLE_LABEL
        };
        parts.push(format!("{}: {}", label, title));
    }
    if !target_text.is_empty() {
        parts.push(format!("{}: {}", TARGET_TEXT_LABEL, target_text));
    }
    if !latin_text.is_empty() {
        parts.push(format!("{}: {}", LATIN_TEXT_LABEL, latin_text));
    }
    parts.join(COMPACT_SEPARATOR)
}

fn context_view(
    title: &str,
    body: &str,
    target_text: &str,
    latin_text: &str,
    metadata: &ViewMetadata,
) -> String {
    let mut parts = Vec::new();
    match (title.is_empty(), body.is_empty()) {
        (false, false) => {
            parts.push(format!(
                "{} from {}: {}",
                metadata.content_type, metadata.source_group, title
            ));
            parts.push(body.to_string());
        }
        (false, true) => parts.push(title.to_string()),
        (true, false) => parts.push(body.to_string()),
        (true, true) => {}
    }

    if !target_text.is_empty() && !latin_text.is_empty() {
        parts.push(format!("Marathi content: {}", target_text));
        parts.push(format!("English content: {}", latin_text));
    }

    parts.join(PARAGRAPH_SEPARATOR)
}

/// Training-dataset entry for an accepted record.
pub fn build_training_record(
    record: &ProcessedRecord,
    views: &LlmContentViews,
    platform: &str,
) -> TrainingRecord {
    TrainingRecord {
        id: record.id.clone(),
        source: format!("{}_r_{}", platform, record.source_group),
        metadata: TrainingMetadata {
            language: TRAINING_LANGUAGE.to_string(),
            category: record.language_category,
            confidence: record.target_confidence,
            content_type: record.content_type,
            source_group: record.source_group.clone(),
            created_at: record.created_at,
        },
        text_formats: TextFormats {
            raw: record.body.clone().unwrap_or_default(),
            clean: views.clean.clone(),
            compact: views.compact.clone(),
            context: views.context.clone(),
        },
        language_separated: SeparatedText {
            target_text: record.target_text.clone().unwrap_or_default(),
            latin_text: record.latin_text.clone().unwrap_or_default(),
        },
        segmented: views.segmented.clone(),
        token_estimates: views.token_estimates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentType, LanguageCategory};

    fn metadata(category: LanguageCategory) -> ViewMetadata {
        ViewMetadata {
            content_type: ContentType::Post,
            source_group: "marathi".to_string(),
            platform: "reddit".to_string(),
            language_category: category,
            target_confidence: 0.5,
        }
    }

    #[test]
    fn test_compact_with_target_text() {
        let views = build_views(
            "Pune",
            "This is good. हे चांगले आहे.",
            "हे चांगले आहे",
            "This is good",
            &metadata(LanguageCategory::MixedContent),
        );
        assert_eq!(
            views.compact,
            "शीर्षक: Pune | मराठी: हे चांगले आहे | English: This is good"
        );
    }

    #[test]
    fn test_compact_without_target_text() {
        let views = build_views("Hello", "", "", "Hello world", &metadata(LanguageCategory::NonTarget));
        assert_eq!(views.compact, "Title: Hello | English: Hello world");
    }

    #[test]
    fn test_compact_omits_empty_parts() {
        let views = build_views("", "body", "", "", &metadata(LanguageCategory::NonTarget));
        assert_eq!(views.compact, "");
    }

    #[test]
    fn test_context_with_both_languages() {
        let views = build_views(
            "Pune",
            "Body text",
            "हे चांगले आहे",
            "This is good",
            &metadata(LanguageCategory::MixedContent),
        );
        assert_eq!(
            views.context,
            "post from marathi: Pune\n\nBody text\n\nMarathi content: हे चांगले आहे\n\nEnglish content: This is good"
        );
    }

    #[test]
    fn test_context_degrades_to_single_paragraph() {
        let md = metadata(LanguageCategory::PureTarget);
        assert_eq!(build_views("फक्त शीर्षक", "", "", "", &md).context, "फक्त शीर्षक");
        assert_eq!(build_views("", "फक्त मजकूर", "", "", &md).context, "फक्त मजकूर");
        assert_eq!(build_views("", "", "", "", &md).context, "");
    }

    #[test]
    fn test_clean_joins_title_and_body() {
        let md = metadata(LanguageCategory::PureTarget);
        let views = build_views("**Title**", "[body](http://x.y)", "", "", &md);
        assert_eq!(views.clean, "Title\n\nbody");
        assert_eq!(build_views("", "only body", "", "", &md).clean, "only body");
    }

    #[test]
    fn test_target_text_is_normalized() {
        let views = build_views(
            "",
            "",
            "हे चांगले आहे। छान",
            "",
            &metadata(LanguageCategory::PureTarget),
        );
        assert_eq!(views.compact, "मराठी: हे चांगले आहे. छान");
        assert_eq!(views.segmented.target_sentences, vec!["हे चांगले आहे", "छान"]);
        assert!(views.segmented.latin_sentences.is_empty());
    }

    #[test]
    fn test_segmented_uses_category_hint() {
        let views = build_views(
            "Pune",
            "Hello there. How are you? हे चांगले आहे। छान",
            "",
            "Hello there. How are you?",
            &metadata(LanguageCategory::MixedContent),
        );
        assert_eq!(
            views.segmented.sentences,
            vec!["Pune Hello there", "How are you", "हे चांगले आहे", "छान"]
        );
        assert_eq!(
            views.segmented.latin_sentences,
            vec!["Hello there", "How are you?"]
        );
    }

    #[test]
    fn test_token_estimates() {
        let views = build_views("a b", "c d e", "", "", &metadata(LanguageCategory::NonTarget));
        assert!((views.token_estimates.clean - 5.0 * 1.3).abs() < 1e-9);
        assert!((views.token_estimates.compact - 3.0 * 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_training_prompt_view() {
        let views = build_views("T", "B", "मी", "", &metadata(LanguageCategory::PureTarget));
        assert_eq!(views.training.instruction, "Analyze this post from r/marathi");
        assert_eq!(views.training.input, "T\n\nB");
        assert_eq!(views.training.output.target_content, "मी");
        assert_eq!(views.training.output.language_category, LanguageCategory::PureTarget);
    }

    #[test]
    fn test_training_prompt_names_other_platforms() {
        let md = ViewMetadata {
            content_type: ContentType::Comment,
            platform: "lemmy".to_string(),
            ..metadata(LanguageCategory::PureTarget)
        };
        let views = build_views("", "मी आहे", "मी आहे", "", &md);
        assert_eq!(views.training.instruction, "Analyze this comment from lemmy/marathi");
    }

    #[test]
    fn test_views_are_reproducible() {
        let md = metadata(LanguageCategory::MixedContent);
        let a = build_views("t", "This is good. हे चांगले आहे.", "हे चांगले आहे", "This is good", &md);
        let b = build_views("t", "This is good. हे चांगले आहे.", "हे चांगले आहे", "This is good", &md);
        assert_eq!(a, b);
    }
}
