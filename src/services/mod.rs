// Stylotrace Core Services

pub mod text_processor;
pub mod config_store;
pub mod model_store;
pub mod detection;
pub mod evaluation;

pub use text_processor::*;
pub use config_store::*;
pub use model_store::*;

// Re-export the detection core
pub use detection::{
    AttributionClassifier,
    BinaryDetector,
    Calibration,
    Classification,
    ConfidenceGate,
    DetectionSensitivity,
    FeatureExtractor,
    GateThresholds,
    Pipeline,
    PipelineOptions,
    Vocabulary,
};
