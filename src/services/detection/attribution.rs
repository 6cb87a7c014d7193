// Attribution Classifier
// One-vs-rest linear scores per source-model label, ranked with a fixed tie-break

use crate::error::ModelLoadError;
use crate::models::{AttributionResult, FeatureVector, ModelLabel, RankedLabel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

use super::Attributor;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelClassArtifact {
    pub label: String,
    pub coef: Vec<f64>,
    #[serde(default, alias = "bias")]
    pub intercept: f64,
}

/// On-disk form of the attribution model (`attrib_model.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionArtifact {
    pub classes: Vec<LabelClassArtifact>,
}

#[derive(Debug, Clone)]
pub struct LabelScorer {
    pub label: ModelLabel,
    pub coef: Vec<f64>,
    pub intercept: f64,
}

impl LabelScorer {
    fn score(&self, features: &FeatureVector) -> f64 {
        features.dot(&self.coef) + self.intercept
    }
}

#[derive(Debug, Clone)]
pub struct AttributionClassifier {
    scorers: Vec<LabelScorer>,
}

impl AttributionClassifier {
    pub fn new(scorers: Vec<LabelScorer>) -> Self {
        Self { scorers }
    }

    /// Resolve artifact labels to `ModelLabel`s and check every row against
    /// the vocabulary dimension.
    pub fn from_artifact(artifact: AttributionArtifact, dim: usize) -> Result<Self, ModelLoadError> {
        if artifact.classes.is_empty() {
            return Err(ModelLoadError::NoClasses);
        }
        let mut seen = HashSet::new();
        let mut scorers = Vec::with_capacity(artifact.classes.len());
        for class in artifact.classes {
            let label = ModelLabel::parse(&class.label)
                .ok_or_else(|| ModelLoadError::UnknownLabel(class.label.clone()))?;
            if !seen.insert(label) {
                return Err(ModelLoadError::DuplicateLabel(class.label));
            }
            if class.coef.len() != dim {
                return Err(ModelLoadError::DimensionMismatch {
                    model: format!("attribution class '{}'", class.label),
                    expected: class.coef.len(),
                    actual: dim,
                });
            }
            if label == ModelLabel::NotApplicable {
                warn!(raw_label = %class.label, "attribution model carries a human class");
            }
            scorers.push(LabelScorer {
                label,
                coef: class.coef,
                intercept: class.intercept,
            });
        }
        Ok(Self { scorers })
    }

    pub fn labels(&self) -> Vec<ModelLabel> {
        self.scorers.iter().map(|s| s.label).collect()
    }
}

impl Attributor for AttributionClassifier {
    fn attribute(&self, features: &FeatureVector) -> AttributionResult {
        rank_scores(
            self.scorers
                .iter()
                .map(|s| RankedLabel { label: s.label, score: s.score(features) })
                .collect(),
        )
    }
}

/// NaN sinks to the bottom and -0.0 ties with 0.0.
fn sort_key(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else if score == 0.0 {
        0.0
    } else {
        score
    }
}

/// Order scores descending; equal scores fall back to label priority so the
/// ranking never depends on table order.
pub fn rank_scores(mut scores: Vec<RankedLabel>) -> AttributionResult {
    scores.sort_by(|a, b| {
        sort_key(b.score)
            .total_cmp(&sort_key(a.score))
            .then_with(|| a.label.priority().cmp(&b.label.priority()))
    });
    AttributionResult { ranked: scores }
}
