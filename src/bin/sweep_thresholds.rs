use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use stylotrace_lib::services::config_store::DetectionOverrides;
use stylotrace_lib::services::evaluation::{score_samples, sweep_gap, threshold_range, LabeledSample};
use stylotrace_lib::services::model_store::ModelStore;

#[derive(Parser, Debug)]
#[command(
    name = "sweep_thresholds",
    about = "Replay the confidence gate over a labeled JSONL set for a range of gap thresholds"
)]
struct Args {
    /// JSONL lines of {"text": ..., "label": "human" | "ai" | <model name>}
    #[arg(long)]
    input: PathBuf,
    #[arg(long, env = "STYLOTRACE_MODEL_DIR", default_value = "saved_models")]
    model_dir: PathBuf,
    #[arg(long, default_value_t = 0.0)]
    gap_start: f64,
    #[arg(long, default_value_t = 0.5)]
    gap_end: f64,
    #[arg(long, default_value_t = 0.05)]
    gap_step: f64,
    /// Override the binary-stage confidence floor
    #[arg(long)]
    floor: Option<f64>,
    /// Override the minimum top1 attribution score
    #[arg(long)]
    min_score: Option<f64>,
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let bundle = ModelStore::new(&args.model_dir)
        .load()
        .with_context(|| format!("failed to load models from {}", args.model_dir.display()))?;
    let flags = DetectionOverrides {
        binary_confidence_floor: args.floor,
        min_score_threshold: args.min_score,
        ..DetectionOverrides::default()
    };
    let config = flags.or(&bundle.recommended.clone().unwrap_or_default()).resolve();
    let pipeline = bundle.into_pipeline(&config);

    let content = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let samples: Vec<LabeledSample> = content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| serde_json::from_str(l).with_context(|| format!("line {}: invalid sample", i + 1)))
        .collect::<Result<_>>()?;

    let scored = score_samples(&pipeline, &samples).map_err(anyhow::Error::msg)?;
    let gaps = threshold_range(args.gap_start, args.gap_end, args.gap_step).map_err(anyhow::Error::msg)?;
    let rows = sweep_gap(
        &scored,
        config.gate_thresholds(),
        &gaps,
        config.human_class_is_human,
        config.min_words,
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("Samples: {}", samples.len());
    println!(
        "{:>6} {:>9} {:>9} {:>9} {:>10} {:>10} {:>10} {:>9}",
        "gap", "abstain", "det_acc", "det_f1", "attributed", "attr_prec", "attr_cov", "ai_uncert"
    );
    for row in &rows {
        println!(
            "{:>6.3} {:>9} {:>9.3} {:>9.3} {:>10} {:>10.3} {:>10.3} {:>9}",
            row.thresholds.gap_threshold,
            row.detection.abstained,
            row.detection.accuracy,
            row.detection.f1,
            row.attributed,
            row.attribution_precision,
            row.attribution_coverage,
            row.ai_uncertain,
        );
    }
    Ok(())
}
