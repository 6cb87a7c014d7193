// Detection Pipeline
// short-text guard -> features -> binary -> (attribution) -> gate
//
// The guard counts words on normalized text; the extractor sees the trimmed
// input unchanged, since the vocabulary was fitted on raw characters.
//
// Attribution only runs for text that clears the AI-detection bar, so a
// human or uncertain verdict can never carry a model name.

use crate::models::{
    AttributionResult, CandidateScore, ClassificationDetails, ClassifyResponse, DetectionResult,
    Verdict,
};
use crate::services::text_processor::{normalize_text, word_count};
use std::sync::Arc;
use tracing::debug;

use super::attribution::AttributionClassifier;
use super::binary::BinaryDetector;
use super::features::FeatureExtractor;
use super::gate::ConfidenceGate;
use super::{Attributor, HumanAiClassifier};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Texts with fewer words are returned as uncertain without scoring.
    pub min_words: usize,
    /// Candidates reported in the response details.
    pub top_k: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { min_words: 30, top_k: 3 }
    }
}

/// Verdict plus the intermediate stage outputs that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub verdict: Verdict,
    pub word_count: usize,
    pub detection: Option<DetectionResult>,
    pub attribution: Option<AttributionResult>,
    pub reason: String,
}

impl Classification {
    pub fn into_response(self, top_k: usize) -> ClassifyResponse {
        let top_candidates = self
            .attribution
            .as_ref()
            .map(|a| {
                a.top_k(top_k)
                    .iter()
                    .map(|r| CandidateScore { model: r.label, score: round3(r.score) })
                    .collect()
            })
            .unwrap_or_default();

        ClassifyResponse {
            category: self.verdict.category(),
            model: self.verdict.model().map(|m| m.as_str().to_string()),
            confidence: self.detection.map(|d| round3(d.confidence)),
            reason: Some(self.reason),
            details: ClassificationDetails {
                word_count: self.word_count,
                raw_score: self.detection.map(|d| round3(d.raw_score)),
                confidence_gap: self
                    .attribution
                    .as_ref()
                    .and_then(|a| a.confidence_gap())
                    .map(round3),
                top_candidates,
            },
            request_id: uuid::Uuid::new_v4().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Orchestrates the two classifier stages and the gate.
///
/// Stage implementations are generic so tests can substitute instrumented
/// classifiers; production code uses the defaults. All state is shared
/// read-only, so a pipeline can be cloned into any number of worker threads.
pub struct Pipeline<B = BinaryDetector, A = AttributionClassifier> {
    extractor: Arc<FeatureExtractor>,
    detector: Arc<B>,
    attributor: Arc<A>,
    gate: ConfidenceGate,
    options: PipelineOptions,
}

impl<B, A> Clone for Pipeline<B, A> {
    fn clone(&self) -> Self {
        Self {
            extractor: Arc::clone(&self.extractor),
            detector: Arc::clone(&self.detector),
            attributor: Arc::clone(&self.attributor),
            gate: self.gate,
            options: self.options,
        }
    }
}

impl<B: HumanAiClassifier, A: Attributor> Pipeline<B, A> {
    pub fn new(
        extractor: Arc<FeatureExtractor>,
        detector: Arc<B>,
        attributor: Arc<A>,
        gate: ConfidenceGate,
        options: PipelineOptions,
    ) -> Self {
        Self { extractor, detector, attributor, gate, options }
    }

    /// Same models, different policy.
    pub fn with_gate(&self, gate: ConfidenceGate, options: PipelineOptions) -> Self {
        Self { gate, options, ..self.clone() }
    }

    pub fn gate(&self) -> &ConfidenceGate {
        &self.gate
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn run(&self, text: &str) -> Verdict {
        self.classify(text).verdict
    }

    pub fn respond(&self, text: &str) -> ClassifyResponse {
        self.classify(text).into_response(self.options.top_k)
    }

    /// Score a text with both stages but without applying the gate.
    /// Attribution is computed only for AI detections.
    pub fn score(&self, text: &str) -> Option<(DetectionResult, Option<AttributionResult>)> {
        let features = self.extractor.extract(text.trim());
        if features.is_zero() {
            return None;
        }
        let detection = self.detector.classify(&features);
        let attribution = match detection.label {
            crate::models::DetectionLabel::Ai => Some(self.attributor.attribute(&features)),
            crate::models::DetectionLabel::Human => None,
        };
        Some((detection, attribution))
    }

    pub fn classify(&self, text: &str) -> Classification {
        let words = word_count(&normalize_text(text));

        if words < self.options.min_words {
            debug!(words, min_words = self.options.min_words, "pipeline.short_text");
            return Classification {
                verdict: Verdict::Uncertain,
                word_count: words,
                detection: None,
                attribution: None,
                reason: format!("Text too short ({} words)", words),
            };
        }

        let features = self.extractor.extract(text.trim());
        if features.is_zero() {
            debug!(words, "pipeline.no_known_features");
            return Classification {
                verdict: Verdict::Uncertain,
                word_count: words,
                detection: None,
                attribution: None,
                reason: "No known n-gram features in text".to_string(),
            };
        }

        let detection = self.detector.classify(&features);
        let attribution = if self.gate.needs_attribution(&detection) {
            Some(self.attributor.attribute(&features))
        } else {
            None
        };
        let verdict = self.gate.decide(&detection, attribution.as_ref());

        debug!(
            words,
            nnz = features.nnz(),
            raw_score = detection.raw_score,
            confidence = detection.confidence,
            attributed = attribution.is_some(),
            category = verdict.category().as_str(),
            "pipeline.classified"
        );

        let reason = self.explain(verdict, &detection, attribution.as_ref());
        Classification {
            verdict,
            word_count: words,
            detection: Some(detection),
            attribution,
            reason,
        }
    }

    fn explain(
        &self,
        verdict: Verdict,
        detection: &DetectionResult,
        attribution: Option<&AttributionResult>,
    ) -> String {
        match verdict {
            Verdict::LikelyHuman => "The text shows high stylistic variability and does not strongly match \
                known AI generation patterns."
                .to_string(),
            Verdict::LikelyAiAttributed(label) => format!(
                "The text most closely resembles {}. Confidence gap: {:.3}",
                label.display_name(),
                attribution.and_then(|a| a.confidence_gap()).unwrap_or(0.0)
            ),
            Verdict::AiUncertainAttribution => "The text appears AI-generated, but its style is similar \
                to multiple models. A confident attribution cannot be made."
                .to_string(),
            Verdict::Uncertain => format!(
                "Detector confidence {:.3} is below the {:.3} floor; no reliable determination.",
                detection.confidence,
                self.gate.thresholds().binary_confidence_floor
            ),
        }
    }
}
