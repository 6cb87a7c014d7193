// Threshold Evaluation
// Scores a labeled set once, then replays the gate under different thresholds

use crate::models::{AttributionResult, DetectionResult, ModelLabel, Verdict, VerdictCategory};
use crate::services::detection::{ConfidenceGate, GateThresholds, Pipeline};
use crate::services::text_processor::{normalize_text, word_count};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledSample {
    pub text: String,
    /// "human", "ai", or a model name such as "gpt-4".
    pub label: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TrueLabel {
    Human,
    Ai(Option<ModelLabel>),
}

impl TrueLabel {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().eq_ignore_ascii_case("ai") {
            return Some(Self::Ai(None));
        }
        match ModelLabel::parse(raw)? {
            ModelLabel::NotApplicable => Some(Self::Human),
            label => Some(Self::Ai(Some(label))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoredSample {
    pub truth: TrueLabel,
    pub word_count: usize,
    pub scores: Option<(DetectionResult, Option<AttributionResult>)>,
}

pub fn score_samples(pipeline: &Pipeline, samples: &[LabeledSample]) -> Result<Vec<ScoredSample>, String> {
    samples
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            let truth = TrueLabel::parse(&sample.label)
                .ok_or_else(|| format!("sample {}: unknown label '{}'", i, sample.label))?;
            Ok(ScoredSample {
                truth,
                word_count: word_count(&normalize_text(&sample.text)),
                scores: pipeline.score(&sample.text),
            })
        })
        .collect()
}

/// Gate outcome for a pre-scored sample, mirroring `Pipeline::classify`.
pub fn replay(sample: &ScoredSample, gate: &ConfidenceGate, min_words: usize) -> Verdict {
    if sample.word_count < min_words {
        return Verdict::Uncertain;
    }
    match &sample.scores {
        Some((detection, attribution)) => gate.decide(detection, attribution.as_ref()),
        None => Verdict::Uncertain,
    }
}

/// Human/AI confusion counts, AI as the positive class. Abstentions are
/// counted separately and excluded from the rates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfusionSummary {
    pub total: usize,
    pub abstained: usize,
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    pub r#fn: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepRow {
    pub thresholds: GateThresholds,
    pub detection: ConfusionSummary,
    pub attributed: usize,
    pub attributed_correct: usize,
    pub ai_uncertain: usize,
    /// Correct attributions over attributions made.
    pub attribution_precision: f64,
    /// Attributions made over AI samples with a known source model.
    pub attribution_coverage: f64,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

pub fn evaluate(samples: &[ScoredSample], gate: &ConfidenceGate, min_words: usize) -> SweepRow {
    let mut cm = ConfusionSummary { total: samples.len(), ..Default::default() };
    let mut attributed = 0;
    let mut attributed_correct = 0;
    let mut ai_uncertain = 0;
    let mut labeled_ai = 0;

    for sample in samples {
        let verdict = replay(sample, gate, min_words);
        if let TrueLabel::Ai(Some(_)) = sample.truth {
            labeled_ai += 1;
        }
        let predicted_ai = match verdict.category() {
            VerdictCategory::Uncertain => {
                cm.abstained += 1;
                continue;
            }
            VerdictCategory::Human => false,
            VerdictCategory::AiAttributed => {
                attributed += 1;
                if let (TrueLabel::Ai(Some(truth)), Some(model)) = (sample.truth, verdict.model()) {
                    if truth == model {
                        attributed_correct += 1;
                    }
                }
                true
            }
            VerdictCategory::AiUncertain => {
                ai_uncertain += 1;
                true
            }
        };
        match (sample.truth, predicted_ai) {
            (TrueLabel::Ai(_), true) => cm.tp += 1,
            (TrueLabel::Ai(_), false) => cm.r#fn += 1,
            (TrueLabel::Human, true) => cm.fp += 1,
            (TrueLabel::Human, false) => cm.tn += 1,
        }
    }

    cm.accuracy = ratio(cm.tp + cm.tn, cm.total - cm.abstained);
    cm.precision = ratio(cm.tp, cm.tp + cm.fp);
    cm.recall = ratio(cm.tp, cm.tp + cm.r#fn);
    cm.f1 = if cm.precision + cm.recall > 0.0 {
        2.0 * cm.precision * cm.recall / (cm.precision + cm.recall)
    } else {
        0.0
    };

    SweepRow {
        thresholds: *gate.thresholds(),
        detection: cm,
        attributed,
        attributed_correct,
        ai_uncertain,
        attribution_precision: ratio(attributed_correct, attributed),
        attribution_coverage: ratio(attributed, labeled_ai),
    }
}

/// Evaluate each gap threshold with the other thresholds held fixed.
pub fn sweep_gap(
    samples: &[ScoredSample],
    base: GateThresholds,
    gaps: &[f64],
    human_class_is_human: bool,
    min_words: usize,
) -> Vec<SweepRow> {
    gaps.iter()
        .map(|&gap_threshold| {
            let gate = ConfidenceGate::new(GateThresholds { gap_threshold, ..base })
                .with_human_class_override(human_class_is_human);
            evaluate(samples, &gate, min_words)
        })
        .collect()
}

/// Most thresholds a single sweep will evaluate.
pub const MAX_SWEEP_STEPS: usize = 10_000;

/// `start, start + step, ...` up to and including `end` (within rounding).
pub fn threshold_range(start: f64, end: f64, step: f64) -> Result<Vec<f64>, String> {
    if !(start.is_finite() && end.is_finite() && step.is_finite()) {
        return Err(format!("sweep bounds must be finite (start {}, end {}, step {})", start, end, step));
    }
    if step <= 0.0 || end < start {
        return Ok(vec![start]);
    }
    let steps = ((end - start) / step + 1e-9).floor();
    if steps >= MAX_SWEEP_STEPS as f64 {
        return Err(format!(
            "step {} over [{}, {}] needs more than {} thresholds",
            step, start, end, MAX_SWEEP_STEPS
        ));
    }
    Ok((0..=steps as usize).map(|i| start + step * i as f64).collect())
}
