// Detection Module
// Two-stage classification core organized into specialized submodules:
// - features: TF-IDF n-gram extraction over the fitted vocabulary
// - binary: human vs. AI linear detector with confidence calibration
// - attribution: per-model one-vs-rest linear scores
// - gate: threshold policy producing the final verdict
// - pipeline: orchestration with the attribution short-circuit

pub mod features;
pub mod binary;
pub mod attribution;
pub mod gate;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::models::{AttributionResult, DetectionResult, FeatureVector};

/// Stage one: decides human vs. AI for a feature vector.
pub trait HumanAiClassifier: Send + Sync {
    fn classify(&self, features: &FeatureVector) -> DetectionResult;
}

/// Stage two: ranks source-model labels for a feature vector.
pub trait Attributor: Send + Sync {
    fn attribute(&self, features: &FeatureVector) -> AttributionResult;
}

pub use features::{Analyzer, FeatureExtractor, Norm, Vocabulary};
pub use binary::{BinaryDetector, Calibration};
pub use attribution::{rank_scores, AttributionArtifact, AttributionClassifier, LabelClassArtifact, LabelScorer};
pub use gate::{ConfidenceGate, DetectionSensitivity, GateThresholds};
pub use pipeline::{Classification, Pipeline, PipelineOptions};
