// Confidence Gate
// Threshold policy turning detection + attribution scores into a verdict.
// Sensitivity picks the threshold preset; it never changes raw scores.

use crate::models::{AttributionResult, DetectionLabel, DetectionResult, ModelLabel, Verdict};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DetectionSensitivity {
    Low,
    #[default]
    Medium,
    High,
}

impl DetectionSensitivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateThresholds {
    /// Below this binary-stage confidence the verdict is `Uncertain`.
    pub binary_confidence_floor: f64,
    /// Minimum top1 - top2 attribution gap for a named model.
    pub gap_threshold: f64,
    /// Minimum top1 attribution score for a named model.
    pub min_score_threshold: f64,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self::for_sensitivity(DetectionSensitivity::Medium)
    }
}

impl GateThresholds {
    /// Low sensitivity makes the fewest claims.
    pub fn for_sensitivity(sensitivity: DetectionSensitivity) -> Self {
        match sensitivity {
            DetectionSensitivity::Low => Self {
                binary_confidence_floor: 0.75,
                gap_threshold: 0.25,
                min_score_threshold: 0.25,
            },
            DetectionSensitivity::Medium => Self {
                binary_confidence_floor: 0.5,
                gap_threshold: 0.15,
                min_score_threshold: 0.0,
            },
            DetectionSensitivity::High => Self {
                binary_confidence_floor: 0.35,
                gap_threshold: 0.10,
                min_score_threshold: 0.0,
            },
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct ConfidenceGate {
    thresholds: GateThresholds,
    human_class_is_human: bool,
}

impl ConfidenceGate {
    pub fn new(thresholds: GateThresholds) -> Self {
        Self { thresholds, human_class_is_human: false }
    }

    /// When the attribution model's top class is a human class, report
    /// `LikelyHuman` instead of `AiUncertainAttribution`.
    pub fn with_human_class_override(mut self, enabled: bool) -> Self {
        self.human_class_is_human = enabled;
        self
    }

    pub fn thresholds(&self) -> &GateThresholds {
        &self.thresholds
    }

    fn clears_floor(&self, detection: &DetectionResult) -> bool {
        // NaN compares false and never clears the floor.
        detection.confidence >= self.thresholds.binary_confidence_floor
    }

    /// Whether `decide` will look at an attribution for this detection.
    pub fn needs_attribution(&self, detection: &DetectionResult) -> bool {
        self.clears_floor(detection) && detection.label == DetectionLabel::Ai
    }

    pub fn decide(&self, detection: &DetectionResult, attribution: Option<&AttributionResult>) -> Verdict {
        if !self.clears_floor(detection) {
            return Verdict::Uncertain;
        }
        if detection.label == DetectionLabel::Human {
            return Verdict::LikelyHuman;
        }

        let Some(attribution) = attribution else {
            return Verdict::AiUncertainAttribution;
        };
        let (Some(top1), Some(gap)) = (attribution.top1(), attribution.confidence_gap()) else {
            return Verdict::AiUncertainAttribution;
        };

        if top1.label == ModelLabel::NotApplicable {
            return if self.human_class_is_human {
                Verdict::LikelyHuman
            } else {
                Verdict::AiUncertainAttribution
            };
        }

        if gap >= self.thresholds.gap_threshold && top1.score >= self.thresholds.min_score_threshold {
            Verdict::LikelyAiAttributed(top1.label)
        } else {
            Verdict::AiUncertainAttribution
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RankedLabel, VerdictCategory};

    fn scenario_gate() -> ConfidenceGate {
        ConfidenceGate::new(GateThresholds {
            binary_confidence_floor: 0.5,
            gap_threshold: 0.3,
            min_score_threshold: 0.1,
        })
    }

    fn ai(confidence: f64) -> DetectionResult {
        DetectionResult { label: DetectionLabel::Ai, confidence, raw_score: confidence }
    }

    fn human(confidence: f64) -> DetectionResult {
        DetectionResult { label: DetectionLabel::Human, confidence, raw_score: -confidence }
    }

    fn ranked(pairs: &[(ModelLabel, f64)]) -> AttributionResult {
        AttributionResult {
            ranked: pairs.iter().map(|&(label, score)| RankedLabel { label, score }).collect(),
        }
    }

    #[test]
    fn test_thresholds_order() {
        let low = GateThresholds::for_sensitivity(DetectionSensitivity::Low);
        let mid = GateThresholds::for_sensitivity(DetectionSensitivity::Medium);
        let high = GateThresholds::for_sensitivity(DetectionSensitivity::High);
        assert!(low.gap_threshold > mid.gap_threshold);
        assert!(mid.gap_threshold > high.gap_threshold);
        assert!(low.binary_confidence_floor > mid.binary_confidence_floor);
        assert!(mid.binary_confidence_floor > high.binary_confidence_floor);
    }

    #[test]
    fn test_sensitivity_parse_is_strict() {
        let parse = |s: &str| <DetectionSensitivity as ValueEnum>::from_str(s, true);
        assert_eq!(parse("HIGH"), Ok(DetectionSensitivity::High));
        assert_eq!(parse("medium"), Ok(DetectionSensitivity::Medium));
        assert!(parse("extreme").is_err());
        assert!(parse("").is_err());
        let json: DetectionSensitivity = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(json, DetectionSensitivity::Low);
        assert!(serde_json::from_str::<DetectionSensitivity>("\"extreme\"").is_err());
    }

    #[test]
    fn test_strong_attribution() {
        let attribution = ranked(&[(ModelLabel::Gpt, 0.9), (ModelLabel::Llama, 0.2)]);
        let verdict = scenario_gate().decide(&ai(0.95), Some(&attribution));
        assert_eq!(verdict, Verdict::LikelyAiAttributed(ModelLabel::Gpt));
    }

    #[test]
    fn test_narrow_gap_is_uncertain_attribution() {
        let attribution = ranked(&[(ModelLabel::Gpt, 0.55), (ModelLabel::Llama, 0.50)]);
        let verdict = scenario_gate().decide(&ai(0.95), Some(&attribution));
        assert_eq!(verdict, Verdict::AiUncertainAttribution);
    }

    #[test]
    fn test_weak_binary_signal_overrides_everything() {
        let strong = ranked(&[(ModelLabel::Gpt, 0.9), (ModelLabel::Llama, 0.2)]);
        let gate = scenario_gate();
        assert_eq!(gate.decide(&ai(0.10), Some(&strong)), Verdict::Uncertain);
        assert_eq!(gate.decide(&ai(0.10), None), Verdict::Uncertain);
        assert_eq!(gate.decide(&human(0.10), None), Verdict::Uncertain);
        assert_eq!(gate.decide(&ai(f64::NAN), Some(&strong)), Verdict::Uncertain);
    }

    #[test]
    fn test_human_ignores_attribution() {
        let strong = ranked(&[(ModelLabel::Gpt, 0.9), (ModelLabel::Llama, 0.2)]);
        let gate = scenario_gate();
        assert_eq!(gate.decide(&human(0.6), Some(&strong)), Verdict::LikelyHuman);
        assert_eq!(gate.decide(&human(50.0), None), Verdict::LikelyHuman);
        assert!(!gate.needs_attribution(&human(50.0)));
        assert!(!gate.needs_attribution(&ai(0.2)));
        assert!(gate.needs_attribution(&ai(0.9)));
    }

    #[test]
    fn test_low_top_score_blocks_attribution() {
        let attribution = ranked(&[(ModelLabel::Claude, 0.05), (ModelLabel::Qwen, -0.8)]);
        assert_eq!(
            scenario_gate().decide(&ai(0.9), Some(&attribution)),
            Verdict::AiUncertainAttribution
        );
    }

    #[test]
    fn test_single_label_uses_top_score_as_gap() {
        let gate = scenario_gate();
        assert_eq!(
            gate.decide(&ai(0.9), Some(&ranked(&[(ModelLabel::Mistral, 0.4)]))),
            Verdict::LikelyAiAttributed(ModelLabel::Mistral)
        );
        assert_eq!(
            gate.decide(&ai(0.9), Some(&ranked(&[(ModelLabel::Mistral, 0.2)]))),
            Verdict::AiUncertainAttribution
        );
        assert_eq!(gate.decide(&ai(0.9), Some(&ranked(&[]))), Verdict::AiUncertainAttribution);
        assert_eq!(gate.decide(&ai(0.9), None), Verdict::AiUncertainAttribution);
    }

    #[test]
    fn test_human_class_on_top() {
        let attribution = ranked(&[(ModelLabel::NotApplicable, 0.9), (ModelLabel::Gpt, 0.1)]);
        let gate = scenario_gate();
        assert_eq!(gate.decide(&ai(0.9), Some(&attribution)), Verdict::AiUncertainAttribution);
        let gate = gate.with_human_class_override(true);
        assert_eq!(gate.decide(&ai(0.9), Some(&attribution)), Verdict::LikelyHuman);
    }

    #[test]
    fn test_widening_gap_only_moves_towards_attribution() {
        let gate = scenario_gate();
        let top2 = 0.4;
        let mut flipped = false;
        for step in 0..100 {
            let top1 = top2 + step as f64 * 0.01;
            let attribution = ranked(&[(ModelLabel::Gemini, top1), (ModelLabel::Gpt, top2)]);
            let verdict = gate.decide(&ai(0.95), Some(&attribution));
            if flipped {
                assert_eq!(verdict, Verdict::LikelyAiAttributed(ModelLabel::Gemini));
            } else if verdict != Verdict::AiUncertainAttribution {
                assert_eq!(verdict, Verdict::LikelyAiAttributed(ModelLabel::Gemini));
                flipped = true;
            }
        }
        assert!(flipped);
    }

    #[test]
    fn test_every_input_maps_to_one_category() {
        let gate = scenario_gate();
        let labels = [DetectionLabel::Human, DetectionLabel::Ai];
        let confidences = [0.0, 0.1, 0.5, 0.95, 3.0];
        let attributions = [
            None,
            Some(ranked(&[(ModelLabel::Gpt, 0.9), (ModelLabel::Llama, 0.2)])),
            Some(ranked(&[(ModelLabel::Gpt, 0.55), (ModelLabel::Llama, 0.5)])),
        ];
        for label in labels {
            for &confidence in &confidences {
                for attribution in &attributions {
                    let detection = DetectionResult { label, confidence, raw_score: 0.0 };
                    let verdict = gate.decide(&detection, attribution.as_ref());
                    let category = verdict.category();
                    match verdict {
                        Verdict::LikelyHuman => assert_eq!(category, VerdictCategory::Human),
                        Verdict::LikelyAiAttributed(_) => {
                            assert_eq!(category, VerdictCategory::AiAttributed);
                            assert_eq!(label, DetectionLabel::Ai);
                        }
                        Verdict::AiUncertainAttribution => {
                            assert_eq!(category, VerdictCategory::AiUncertain);
                            assert_eq!(label, DetectionLabel::Ai);
                        }
                        Verdict::Uncertain => assert_eq!(category, VerdictCategory::Uncertain),
                    }
                    if label == DetectionLabel::Human && confidence >= 0.5 {
                        assert_eq!(verdict, Verdict::LikelyHuman);
                    }
                }
            }
        }
    }
}
