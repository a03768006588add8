use anyhow::{bail, Context, Result};
use marathi_sieve::services::{
    AppConfig, ConfigStore, ContentPipeline, JsonLinesSink, JsonLinesSource,
    JsonLinesTrainingSink, PipelineError, SourceFilter, TrainingSink,
};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const USAGE: &str = "Usage:\n  sieve <input.jsonl> --out <processed.jsonl> [--training-out <training.jsonl>] [--config <config.json>] [--batch-size <n>] [--all-groups]\n\nNotes:\n  - Input holds one raw post/comment JSON object per line.\n  - Records already present in --out are skipped.\n  - Ctrl-C stops fetching, finishes the current record and flushes the pending batch.";

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn load_config(path: Option<String>) -> Result<AppConfig> {
    let store = match path {
        Some(p) => ConfigStore::from_file(PathBuf::from(p)),
        None => match ConfigStore::default_config_dir() {
            Some(dir) => ConfigStore::new(dir),
            None => return Ok(AppConfig::default()),
        },
    };
    let mut config = store.load().map_err(anyhow::Error::msg)?;
    config.apply_env_overrides();
    info!(config = %store.config_file().display(), "config.loaded");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || has_flag(&args, "--help") {
        eprintln!("{}", USAGE);
        return Ok(());
    }

    marathi_sieve::init_logging();

    let input = PathBuf::from(&args[1]);
    let Some(out) = parse_arg_value(&args, "--out") else {
        bail!("missing --out <processed.jsonl>\n\n{}", USAGE);
    };
    let training_out = parse_arg_value(&args, "--training-out");

    let mut config = load_config(parse_arg_value(&args, "--config"))?;
    if let Some(raw) = parse_arg_value(&args, "--batch-size") {
        config.pipeline.batch_size = raw
            .parse()
            .with_context(|| format!("invalid --batch-size {:?}", raw))?;
    }

    let pipeline = ContentPipeline::new(&config).context("invalid detection config")?;

    let groups = if has_flag(&args, "--all-groups") {
        Vec::new()
    } else {
        config.pipeline.source_groups.clone()
    };
    let filter = SourceFilter::new()
        .with_groups(groups)
        .with_max_per_group(config.pipeline.max_items_per_group);
    let mut source = JsonLinesSource::open(&input)
        .await
        .with_context(|| format!("failed to open {}", input.display()))?
        .with_filter(filter);

    let sink = JsonLinesSink::open(&out)
        .await
        .with_context(|| format!("failed to open {}", out))?;
    let training_sink = match &training_out {
        Some(path) => Some(
            JsonLinesTrainingSink::open(path)
                .await
                .with_context(|| format!("failed to open {}", path))?,
        ),
        None => None,
    };

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing current record");
            ctrl_c_token.cancel();
        }
    });

    let result = pipeline
        .run(
            &mut source,
            &sink,
            training_sink.as_ref().map(|s| s as &dyn TrainingSink),
            &cancel,
        )
        .await;

    let summary = match result {
        Ok(summary) => summary,
        Err(PipelineError::Source { error, summary }) => {
            eprintln!("{}", serde_json::to_string_pretty(&summary)?);
            return Err(error).context("content source failed");
        }
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    if cancel.is_cancelled() {
        info!("Run interrupted; partial results written to {}", sink.path().display());
    }
    Ok(())
}
