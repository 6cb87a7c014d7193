// CLI command handlers

use crate::api::{classify_value_with, install_pipeline, installed_pipeline};
use crate::cli::{Cli, Commands, ConfigCommands, ThresholdArgs, DEFAULT_MODEL_DIR};
use crate::models::{BatchItemRequest, BatchItemResponse, BatchSummary, ClassifyResponse, VerdictCategory};
use crate::services::config_store::{AppConfig, ConfigStore, DetectionConfig, DetectionOverrides};
use crate::services::detection::Pipeline;
use crate::services::model_store::ModelStore;
use crate::services::text_processor::preview;
use anyhow::{anyhow, Context, Result};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

pub async fn dispatch(cli: Cli) -> Result<()> {
    let store = config_store(&cli)?;
    match &cli.command {
        Commands::Classify { text, file, thresholds } => {
            let input = read_input(text.as_deref(), file.as_deref())?;
            let pipeline = load_pipeline(&cli, &store, thresholds)?;
            install_pipeline(pipeline)?;
            let response = crate::api::classify_text(&input)?;
            print_response(&response, cli.json)
        }
        Commands::Batch { input, output, parallel, thresholds } => {
            let pipeline = load_pipeline(&cli, &store, thresholds)?;
            install_pipeline(pipeline)?;
            run_batch(input, output.as_deref(), *parallel).await
        }
        Commands::Config { command } => run_config(&cli, &store, command),
    }
}

fn config_store(cli: &Cli) -> Result<ConfigStore> {
    let dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => ConfigStore::default_config_dir().ok_or_else(|| anyhow!("no config directory available"))?,
    };
    Ok(ConfigStore::new(dir))
}

fn load_app_config(store: &ConfigStore) -> Result<AppConfig> {
    store.load().map_err(|e| anyhow!(e))
}

fn resolve_model_dir(cli: &Cli, app: &AppConfig) -> PathBuf {
    cli.model_dir
        .clone()
        .or_else(|| app.model_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR))
}

/// Merged field by field. Precedence: CLI flags, then settings the user
/// saved, then the model directory's config.json, then built-in defaults.
fn resolve_detection_config(
    app: &AppConfig,
    recommended: Option<&DetectionOverrides>,
    args: &ThresholdArgs,
) -> DetectionConfig {
    let model_layer = recommended.cloned().unwrap_or_default();
    args.overrides().or(&app.detection).or(&model_layer).resolve()
}

fn load_pipeline(cli: &Cli, store: &ConfigStore, args: &ThresholdArgs) -> Result<Pipeline> {
    let app = load_app_config(store)?;
    let model_dir = resolve_model_dir(cli, &app);
    let bundle = ModelStore::new(&model_dir)
        .load()
        .with_context(|| format!("failed to load models from {}", model_dir.display()))?;
    let config = resolve_detection_config(&app, bundle.recommended.as_ref(), args);
    info!(
        model_dir = %model_dir.display(),
        sensitivity = config.sensitivity.as_str(),
        min_words = config.min_words,
        "pipeline.configured"
    );
    Ok(bundle.into_pipeline(&config))
}

fn read_input(text: Option<&str>, file: Option<&Path>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text.to_string());
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
    Ok(buf)
}

fn headline(category: VerdictCategory) -> &'static str {
    match category {
        VerdictCategory::Human => "Likely Human-Written",
        VerdictCategory::AiAttributed => "Likely AI-Generated",
        VerdictCategory::AiUncertain => "AI-Generated (Uncertain Attribution)",
        VerdictCategory::Uncertain => "Uncertain",
    }
}

fn print_response(response: &ClassifyResponse, json: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, response)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "{}", headline(response.category))?;
    if let Some(reason) = &response.reason {
        writeln!(out, "{}", reason)?;
    }
    if let Some(confidence) = response.confidence {
        writeln!(out, "Detector confidence: {:.3}", confidence)?;
    }
    if !response.details.top_candidates.is_empty() {
        writeln!(out, "Top candidates:")?;
        for candidate in &response.details.top_candidates {
            writeln!(out, "  {:<10} {:>8.3}", candidate.model.as_str(), candidate.score)?;
        }
    }
    Ok(())
}

fn read_lines(input: &Path) -> Result<Vec<String>> {
    let content = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?
    };
    Ok(content.lines().map(|l| l.to_string()).collect())
}

fn classify_line(pipeline: &Pipeline, line_no: usize, line: &str) -> BatchItemResponse {
    let fallback_id = format!("line-{}", line_no);
    let request: BatchItemRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            return BatchItemResponse {
                id: fallback_id,
                result: None,
                error: Some(format!("invalid JSON: {}", e)),
            }
        }
    };
    let id = request.id_string().unwrap_or(fallback_id);
    match classify_value_with(pipeline, &request.text) {
        Ok(result) => BatchItemResponse { id, result: Some(result), error: None },
        Err(e) => BatchItemResponse { id, result: None, error: Some(e.to_string()) },
    }
}

pub async fn run_batch(input: &Path, output: Option<&Path>, parallel: usize) -> Result<()> {
    let pipeline = installed_pipeline()?.clone();
    let lines = read_lines(input)?;
    let t0 = Instant::now();

    let semaphore = Arc::new(Semaphore::new(parallel.max(1)));
    let mut tasks = JoinSet::new();
    for (idx, line) in lines.into_iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let pipeline = pipeline.clone();
        tasks.spawn_blocking(move || {
            let _permit = permit;
            (idx, classify_line(&pipeline, idx + 1, &line))
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        results.push(joined.context("batch worker panicked")?);
    }
    results.sort_by_key(|(idx, _)| *idx);

    let mut summary = BatchSummary::default();
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(std::io::BufWriter::new(std::io::stdout())),
    };
    for (_, item) in &results {
        if let Some(err) = &item.error {
            warn!(id = %item.id, error = %err, "batch.item_failed");
        }
        summary.record(item);
        serde_json::to_writer(&mut writer, item)?;
        writeln!(writer)?;
    }
    writer.flush()?;

    info!(
        count = summary.count,
        failed = summary.fail_count,
        elapsed_ms = t0.elapsed().as_millis(),
        "batch.completed"
    );
    eprintln!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn run_config(cli: &Cli, store: &ConfigStore, command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Path => {
            println!("{}", store.config_file().display());
            Ok(())
        }
        ConfigCommands::Show => {
            let app = load_app_config(store)?;
            let model_dir = resolve_model_dir(cli, &app);
            let recommended = ModelStore::new(&model_dir).load_recommended().unwrap_or_else(|e| {
                warn!(error = %e, "model config unreadable");
                None
            });
            let config = resolve_detection_config(&app, recommended.as_ref(), &ThresholdArgs::default());
            let effective = serde_json::json!({
                "configFile": store.config_file(),
                "configFileExists": store.exists(),
                "modelDir": model_dir,
                "userSettings": app.detection,
                "modelSettings": recommended,
                "detection": config,
                "thresholds": config.gate_thresholds(),
            });
            println!("{}", serde_json::to_string_pretty(&effective)?);
            Ok(())
        }
        ConfigCommands::Set { thresholds, default_model_dir } => {
            let flags = thresholds.overrides();
            let mut app = store
                .update_detection(|detection| *detection = flags.or(detection))
                .map_err(|e| anyhow!(e))?;
            if let Some(dir) = default_model_dir {
                store.set_model_dir(dir).map_err(|e| anyhow!(e))?;
                app.model_dir = Some(dir.clone());
            }
            info!(file = %store.config_file().display(), "config.saved");
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&app)?);
            } else {
                println!("Saved {}", store.config_file().display());
                println!("{}", preview(&serde_json::to_string(&app.detection)?, 200));
            }
            Ok(())
        }
    }
}
