// Model Store
// Loads pre-trained artifacts from a model directory into an immutable bundle

use crate::error::ModelLoadError;
use crate::services::config_store::{DetectionConfig, DetectionOverrides};
use crate::services::detection::{
    AttributionArtifact, AttributionClassifier, BinaryDetector, FeatureExtractor, Pipeline, Vocabulary,
};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub const VOCABULARY_FILE: &str = "vocabulary.json";
pub const HUMAN_AI_MODEL_FILE: &str = "human_ai_model.json";
pub const ATTRIBUTION_MODEL_FILE: &str = "attrib_model.json";
pub const MODEL_CONFIG_FILE: &str = "config.json";

/// Everything the pipeline needs, validated against one feature space.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub extractor: FeatureExtractor,
    pub detector: BinaryDetector,
    pub attributor: AttributionClassifier,
    /// Thresholds shipped next to the weights, if any.
    pub recommended: Option<DetectionOverrides>,
}

impl ModelBundle {
    pub fn from_parts(
        vocabulary: Vocabulary,
        detector: BinaryDetector,
        attribution: AttributionArtifact,
        recommended: Option<DetectionOverrides>,
    ) -> Result<Self, ModelLoadError> {
        let extractor = FeatureExtractor::new(vocabulary)?;
        let dim = extractor.dim();
        detector.validate(dim)?;
        let attributor = AttributionClassifier::from_artifact(attribution, dim)?;
        Ok(Self { extractor, detector, attributor, recommended })
    }

    /// Freeze the bundle behind shared pointers and bind a gate to it.
    pub fn into_pipeline(self, config: &DetectionConfig) -> Pipeline {
        Pipeline::new(
            Arc::new(self.extractor),
            Arc::new(self.detector),
            Arc::new(self.attributor),
            config.gate(),
            config.pipeline_options(),
        )
    }
}

pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T, ModelLoadError> {
        let path = self.dir.join(name);
        let content = fs::read_to_string(&path).map_err(|source| ModelLoadError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ModelLoadError::Parse { path, source })
    }

    /// Load the optional `config.json` that ships with the weights.
    pub fn load_recommended(&self) -> Result<Option<DetectionOverrides>, ModelLoadError> {
        if !self.dir.join(MODEL_CONFIG_FILE).exists() {
            return Ok(None);
        }
        self.read_json(MODEL_CONFIG_FILE).map(Some)
    }

    pub fn load(&self) -> Result<ModelBundle, ModelLoadError> {
        let t0 = Instant::now();
        let vocabulary: Vocabulary = self.read_json(VOCABULARY_FILE)?;
        let detector: BinaryDetector = self.read_json(HUMAN_AI_MODEL_FILE)?;
        let attribution: AttributionArtifact = self.read_json(ATTRIBUTION_MODEL_FILE)?;
        let recommended = self.load_recommended()?;

        let bundle = ModelBundle::from_parts(vocabulary, detector, attribution, recommended)?;
        info!(
            dir = %self.dir.display(),
            features = bundle.extractor.dim(),
            labels = ?bundle.attributor.labels(),
            has_config = bundle.recommended.is_some(),
            load_ms = t0.elapsed().as_millis(),
            "model.loaded"
        );
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModelLabel, Verdict};
    use crate::services::detection::fixtures;

    fn write_fixture_dir(dir: &Path) {
        fs::write(dir.join(VOCABULARY_FILE), serde_json::to_string(&fixtures::vocabulary()).unwrap()).unwrap();
        fs::write(dir.join(HUMAN_AI_MODEL_FILE), serde_json::to_string(&fixtures::detector()).unwrap()).unwrap();
        fs::write(
            dir.join(ATTRIBUTION_MODEL_FILE),
            serde_json::to_string(&fixtures::attribution_artifact()).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_load_round_trip_and_classify() {
        let tmp = tempfile::tempdir().unwrap();
        write_fixture_dir(tmp.path());
        fs::write(tmp.path().join(MODEL_CONFIG_FILE), r#"{"min_words": 5}"#).unwrap();

        let bundle = ModelStore::new(tmp.path()).load().unwrap();
        let config = bundle.recommended.clone().unwrap().resolve();
        assert_eq!(config.min_words, 5);
        assert_eq!(
            bundle.attributor.labels(),
            vec![ModelLabel::Gpt, ModelLabel::Llama, ModelLabel::Claude]
        );

        let pipeline = bundle.into_pipeline(&config);
        assert_eq!(pipeline.run(fixtures::GPT_TEXT), Verdict::LikelyAiAttributed(ModelLabel::Gpt));
        assert_eq!(pipeline.run(fixtures::HUMAN_TEXT), Verdict::LikelyHuman);
    }

    #[test]
    fn test_missing_config_is_optional() {
        let tmp = tempfile::tempdir().unwrap();
        write_fixture_dir(tmp.path());
        assert!(ModelStore::new(tmp.path()).load().unwrap().recommended.is_none());
    }

    #[test]
    fn test_missing_artifact_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ModelStore::new(tmp.path()).load().unwrap_err();
        assert!(matches!(err, ModelLoadError::Io { .. }));
    }

    #[test]
    fn test_malformed_artifact_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        write_fixture_dir(tmp.path());
        fs::write(tmp.path().join(HUMAN_AI_MODEL_FILE), "{not json").unwrap();
        let err = ModelStore::new(tmp.path()).load().unwrap_err();
        assert!(matches!(err, ModelLoadError::Parse { .. }));
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let mut detector = fixtures::detector();
        detector.coef.pop();
        let err = ModelBundle::from_parts(
            fixtures::vocabulary(),
            detector,
            fixtures::attribution_artifact(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ModelLoadError::DimensionMismatch { .. }));
    }
}
