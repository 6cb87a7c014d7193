// Binary Detector
// Linear human/AI hyperplane with a monotonic confidence transform

use crate::error::ModelLoadError;
use crate::models::{DetectionLabel, DetectionResult, FeatureVector};
use serde::{Deserialize, Serialize};

use super::HumanAiClassifier;

/// How the signed margin becomes a reported confidence.
///
/// Both variants depend only on `|raw_score|` and are non-decreasing in it, so
/// a point further from the boundary never reports less confidence.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Calibration {
    /// Raw distance to the boundary, unbounded.
    #[default]
    Margin,
    /// `2 * sigmoid(scale * |margin|) - 1`, in [0, 1).
    Logistic { scale: f64 },
}

impl Calibration {
    pub fn confidence(&self, raw_score: f64) -> f64 {
        let margin = raw_score.abs();
        match self {
            Self::Margin => margin,
            // 2σ(x) - 1 == tanh(x / 2), which stays accurate for large x.
            Self::Logistic { scale } => (scale * margin / 2.0).tanh(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelLoadError> {
        match self {
            Self::Margin => Ok(()),
            Self::Logistic { scale } if scale.is_finite() && *scale > 0.0 => Ok(()),
            Self::Logistic { scale } => Err(ModelLoadError::InvalidCalibration(format!(
                "logistic scale must be positive and finite, got {}",
                scale
            ))),
        }
    }
}

/// Positive decision values mean AI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinaryDetector {
    pub coef: Vec<f64>,
    #[serde(default, alias = "bias")]
    pub intercept: f64,
    #[serde(default)]
    pub calibration: Calibration,
}

impl BinaryDetector {
    pub fn new(coef: Vec<f64>, intercept: f64, calibration: Calibration) -> Self {
        Self { coef, intercept, calibration }
    }

    /// Check the artifact against the vocabulary dimension.
    pub fn validate(&self, dim: usize) -> Result<(), ModelLoadError> {
        if self.coef.len() != dim {
            return Err(ModelLoadError::DimensionMismatch {
                model: "human/ai model".to_string(),
                expected: self.coef.len(),
                actual: dim,
            });
        }
        self.calibration.validate()
    }

    pub fn decision_function(&self, features: &FeatureVector) -> f64 {
        features.dot(&self.coef) + self.intercept
    }
}

impl HumanAiClassifier for BinaryDetector {
    fn classify(&self, features: &FeatureVector) -> DetectionResult {
        let raw_score = self.decision_function(features);
        // A point exactly on the boundary is not evidence of AI authorship.
        let label = if raw_score > 0.0 { DetectionLabel::Ai } else { DetectionLabel::Human };
        DetectionResult {
            label,
            confidence: self.calibration.confidence(raw_score),
            raw_score,
        }
    }
}
