use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the classification entry points.
///
/// Degenerate text (empty or very short) is not an error; it flows through
/// and comes back as an `uncertain` verdict.
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("model not loaded: install a pipeline before classifying")]
    ModelNotLoaded,
    #[error("a pipeline is already installed for this process")]
    AlreadyInstalled,
}

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid vocabulary: {0}")]
    InvalidVocabulary(String),
    #[error("{model} expects {expected} coefficients, vocabulary has {actual} features")]
    DimensionMismatch {
        model: String,
        expected: usize,
        actual: usize,
    },
    #[error("unknown model label '{0}' in attribution model")]
    UnknownLabel(String),
    #[error("duplicate model label '{0}' in attribution model")]
    DuplicateLabel(String),
    #[error("attribution model has no classes")]
    NoClasses,
    #[error("invalid calibration: {0}")]
    InvalidCalibration(String),
}
