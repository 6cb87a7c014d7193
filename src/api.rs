// Process-wide classification entry points.
// A pipeline is installed once at startup and shared read-only afterwards.

use crate::error::ClassifyError;
use crate::models::ClassifyResponse;
use crate::services::detection::Pipeline;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::info;

static PIPELINE: OnceLock<Pipeline> = OnceLock::new();

/// Install the pipeline used by `classify_text`. Only the first call wins.
pub fn install_pipeline(pipeline: Pipeline) -> Result<(), ClassifyError> {
    let thresholds = *pipeline.gate().thresholds();
    PIPELINE.set(pipeline).map_err(|_| ClassifyError::AlreadyInstalled)?;
    info!(
        floor = thresholds.binary_confidence_floor,
        gap = thresholds.gap_threshold,
        min_score = thresholds.min_score_threshold,
        "pipeline.installed"
    );
    Ok(())
}

pub fn installed_pipeline() -> Result<&'static Pipeline, ClassifyError> {
    PIPELINE.get().ok_or(ClassifyError::ModelNotLoaded)
}

pub fn classify_text(text: &str) -> Result<ClassifyResponse, ClassifyError> {
    Ok(installed_pipeline()?.respond(text))
}

/// Classify a JSON payload: either a bare string or `{"text": "..."}`.
pub fn classify_value(value: &Value) -> Result<ClassifyResponse, ClassifyError> {
    let pipeline = installed_pipeline()?;
    classify_value_with(pipeline, value)
}

pub fn classify_value_with(pipeline: &Pipeline, value: &Value) -> Result<ClassifyResponse, ClassifyError> {
    let text = text_from_value(value)?;
    Ok(pipeline.respond(text))
}

pub fn text_from_value(value: &Value) -> Result<&str, ClassifyError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Object(map) => match map.get("text") {
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(ClassifyError::InvalidInput(format!(
                "field 'text' must be a string, got {}",
                json_type(other)
            ))),
            None => Err(ClassifyError::InvalidInput("missing field 'text'".to_string())),
        },
        other => Err(ClassifyError::InvalidInput(format!(
            "expected a string, got {}",
            json_type(other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
