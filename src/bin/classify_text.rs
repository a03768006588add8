use anyhow::{Context, Result};
use marathi_sieve::models::{
    ContentType, DetectionResult, LanguageCategory, LlmContentViews, SeparatedText, ViewMetadata,
};
use marathi_sieve::services::{build_views, validate_for_training, AppConfig, LanguageDetector};
use serde::Serialize;

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

/// First argument that is neither a flag nor a flag's value.
fn positional(args: &[String]) -> Option<String> {
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            iter.next();
            continue;
        }
        return Some(arg.clone());
    }
    None
}

#[derive(Serialize)]
struct Report<'a> {
    detection: DetectionResult,
    separated: SeparatedText,
    training_check: TrainingCheck,
    views: Option<LlmContentViews>,
    group: &'a str,
}

#[derive(Serialize)]
struct TrainingCheck {
    valid: bool,
    reason: String,
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage:\n  classify_text [--file <path> | <text>] [--title <title>] [--group <source_group>]\n\nPrints detection scores, sentence separation and content views as JSON."
        );
        return Ok(());
    }

    let text = match parse_arg_value(&args, "--file") {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("read file failed: {}", path))?,
        None => positional(&args).unwrap_or_default(),
    };
    let title = parse_arg_value(&args, "--title").unwrap_or_default();
    let group = parse_arg_value(&args, "--group").unwrap_or_else(|| "marathi".to_string());

    let config = AppConfig::default();
    let detector = LanguageDetector::new(config.detection.clone())?;

    let detection = detector.detect(&text, &title);
    let combined = format!("{} {}", title, text).trim().to_string();
    let separated = match detection.category {
        LanguageCategory::MixedContent => detector.separate(&combined),
        LanguageCategory::PureTarget => SeparatedText {
            target_text: combined.clone(),
            latin_text: String::new(),
        },
        LanguageCategory::NonTarget => Default::default(),
    };

    let (valid, reason) = validate_for_training(
        &separated.target_text,
        config.training.min_length,
        config.training.max_length,
    );

    let views = (detection.category != LanguageCategory::NonTarget).then(|| {
        let metadata = ViewMetadata {
            content_type: ContentType::Post,
            source_group: group.clone(),
            platform: config.pipeline.platform.clone(),
            language_category: detection.category,
            target_confidence: detection.target_confidence,
        };
        build_views(&title, &text, &separated.target_text, &separated.latin_text, &metadata)
    });

    let report = Report {
        detection,
        separated,
        training_check: TrainingCheck { valid, reason },
        views,
        group: &group,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
