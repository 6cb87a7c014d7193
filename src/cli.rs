use crate::services::config_store::DetectionOverrides;
use crate::services::detection::DetectionSensitivity;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_MODEL_DIR: &str = "saved_models";

#[derive(Parser, Debug)]
#[command(name = "stylotrace", version, about = "Human vs. AI text detection with conservative model attribution")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "STYLOTRACE_MODEL_DIR",
        help = "Directory holding vocabulary.json, human_ai_model.json and attrib_model.json"
    )]
    pub model_dir: Option<PathBuf>,
    #[arg(long, global = true, env = "STYLOTRACE_CONFIG_DIR", help = "Override the user config directory")]
    pub config_dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a single text
    Classify {
        #[arg(long, conflicts_with = "file", help = "Text to classify (defaults to stdin)")]
        text: Option<String>,
        #[arg(long, help = "Read the text from a file")]
        file: Option<PathBuf>,
        #[command(flatten)]
        thresholds: ThresholdArgs,
    },
    /// Classify JSON lines of {"id", "text"} concurrently
    Batch {
        #[arg(long, help = "JSONL input file, '-' for stdin")]
        input: PathBuf,
        #[arg(long, help = "JSONL output file (defaults to stdout)")]
        output: Option<PathBuf>,
        #[arg(long, default_value_t = 4)]
        parallel: usize,
        #[command(flatten)]
        thresholds: ThresholdArgs,
    },
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Persist threshold settings to the user config
    Set {
        #[command(flatten)]
        thresholds: ThresholdArgs,
        #[arg(long, help = "Model directory to use when --model-dir is not given")]
        default_model_dir: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ThresholdArgs {
    #[arg(long, value_enum, help = "Threshold preset; low makes the fewest claims")]
    pub sensitivity: Option<DetectionSensitivity>,
    #[arg(long = "floor", help = "Minimum binary-stage confidence")]
    pub binary_confidence_floor: Option<f64>,
    #[arg(long = "gap", help = "Minimum top1 - top2 attribution gap")]
    pub gap_threshold: Option<f64>,
    #[arg(long = "min-score", help = "Minimum top1 attribution score")]
    pub min_score_threshold: Option<f64>,
    #[arg(long, help = "Texts with fewer words are reported as uncertain")]
    pub min_words: Option<usize>,
    #[arg(long, help = "Number of attribution candidates to report")]
    pub top_k: Option<usize>,
    #[arg(long, help = "Treat a top-ranked human attribution class as a human verdict")]
    pub human_class_is_human: bool,
}

impl ThresholdArgs {
    /// The flags as the topmost settings layer.
    pub fn overrides(&self) -> DetectionOverrides {
        DetectionOverrides {
            sensitivity: self.sensitivity,
            min_words: self.min_words,
            binary_confidence_floor: self.binary_confidence_floor,
            gap_threshold: self.gap_threshold,
            min_score_threshold: self.min_score_threshold,
            top_k: self.top_k,
            human_class_is_human: self.human_class_is_human.then_some(true),
        }
    }
}
