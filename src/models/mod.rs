// Stylotrace Data Models
// Shared types for the detection pipeline and its serialized records

use serde::{Deserialize, Serialize};
use std::fmt;

// ============ Source Model Labels ============

/// Closed set of source-model families the attribution stage can name.
///
/// Declaration order is the tie-break priority used when two labels score
/// exactly the same; do not reorder without retraining expectations.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum ModelLabel {
    #[serde(rename = "gpt")]
    Gpt,
    #[serde(rename = "claude")]
    Claude,
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "llama")]
    Llama,
    #[serde(rename = "mistral")]
    Mistral,
    #[serde(rename = "qwen")]
    Qwen,
    #[serde(rename = "deepseek")]
    DeepSeek,
    /// Reserved for human-written text; never a valid attribution.
    #[serde(rename = "not_applicable")]
    NotApplicable,
}

impl ModelLabel {
    pub const ALL: [ModelLabel; 8] = [
        ModelLabel::Gpt,
        ModelLabel::Claude,
        ModelLabel::Gemini,
        ModelLabel::Llama,
        ModelLabel::Mistral,
        ModelLabel::Qwen,
        ModelLabel::DeepSeek,
        ModelLabel::NotApplicable,
    ];

    /// Parse a label as written by training tooling ("gpt-4o", "LLaMA-family",
    /// "human_story", ...). Matching is by family prefix, case-insensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim().to_lowercase();
        if s.is_empty() {
            return None;
        }
        if s.starts_with("human") || matches!(s.as_str(), "not_applicable" | "n/a" | "none") {
            return Some(Self::NotApplicable);
        }
        const PREFIXES: &[(&str, ModelLabel)] = &[
            ("gpt", ModelLabel::Gpt),
            ("chatgpt", ModelLabel::Gpt),
            ("openai", ModelLabel::Gpt),
            ("claude", ModelLabel::Claude),
            ("anthropic", ModelLabel::Claude),
            ("gemini", ModelLabel::Gemini),
            ("bard", ModelLabel::Gemini),
            ("palm", ModelLabel::Gemini),
            ("llama", ModelLabel::Llama),
            ("meta-llama", ModelLabel::Llama),
            ("mistral", ModelLabel::Mistral),
            ("mixtral", ModelLabel::Mistral),
            ("qwen", ModelLabel::Qwen),
            ("deepseek", ModelLabel::DeepSeek),
        ];
        PREFIXES
            .iter()
            .find(|(prefix, _)| s.starts_with(prefix))
            .map(|(_, label)| *label)
    }

    /// Stable identifier used in serialized records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gpt => "gpt",
            Self::Claude => "claude",
            Self::Gemini => "gemini",
            Self::Llama => "llama",
            Self::Mistral => "mistral",
            Self::Qwen => "qwen",
            Self::DeepSeek => "deepseek",
            Self::NotApplicable => "not_applicable",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gpt => "GPT-family",
            Self::Claude => "Claude-family",
            Self::Gemini => "Gemini-family",
            Self::Llama => "LLaMA-family",
            Self::Mistral => "Mistral-family",
            Self::Qwen => "Qwen-family",
            Self::DeepSeek => "DeepSeek-family",
            Self::NotApplicable => "n/a",
        }
    }

    /// Position in the tie-break priority list (lower wins).
    pub fn priority(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ModelLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============ Feature Vector ============

/// Sparse TF-IDF vector: `(feature index, weight)` pairs sorted by index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureVector {
    pub dim: usize,
    pub entries: Vec<(u32, f64)>,
}

impl FeatureVector {
    pub fn zeros(dim: usize) -> Self {
        Self { dim, entries: Vec::new() }
    }

    pub fn is_zero(&self) -> bool {
        self.entries.iter().all(|(_, w)| *w == 0.0)
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: u32) -> f64 {
        self.entries
            .binary_search_by_key(&index, |(i, _)| *i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    /// Dot product against a dense coefficient row.
    pub fn dot(&self, coef: &[f64]) -> f64 {
        self.entries
            .iter()
            .map(|(i, w)| coef.get(*i as usize).copied().unwrap_or(0.0) * w)
            .sum()
    }
}

// ============ Stage Results ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionLabel {
    Human,
    Ai,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub label: DetectionLabel,
    /// Monotonic in |raw_score|; bounded to [0, 1) only under logistic calibration.
    pub confidence: f64,
    pub raw_score: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedLabel {
    pub label: ModelLabel,
    pub score: f64,
}

/// Attribution scores, descending; ties ordered by `ModelLabel::priority`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttributionResult {
    pub ranked: Vec<RankedLabel>,
}

impl AttributionResult {
    pub fn top1(&self) -> Option<&RankedLabel> {
        self.ranked.first()
    }

    pub fn top2(&self) -> Option<&RankedLabel> {
        self.ranked.get(1)
    }

    /// top1 - top2, or top1 alone when only one label exists.
    pub fn confidence_gap(&self) -> Option<f64> {
        let top1 = self.top1()?;
        Some(match self.top2() {
            Some(top2) => top1.score - top2.score,
            None => top1.score,
        })
    }

    pub fn top_k(&self, k: usize) -> &[RankedLabel] {
        &self.ranked[..k.min(self.ranked.len())]
    }
}

// ============ Verdict ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Verdict {
    LikelyHuman,
    LikelyAiAttributed(ModelLabel),
    AiUncertainAttribution,
    Uncertain,
}

impl Verdict {
    pub fn category(&self) -> VerdictCategory {
        match self {
            Self::LikelyHuman => VerdictCategory::Human,
            Self::LikelyAiAttributed(_) => VerdictCategory::AiAttributed,
            Self::AiUncertainAttribution => VerdictCategory::AiUncertain,
            Self::Uncertain => VerdictCategory::Uncertain,
        }
    }

    pub fn model(&self) -> Option<ModelLabel> {
        match self {
            Self::LikelyAiAttributed(label) => Some(*label),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictCategory {
    Human,
    AiAttributed,
    AiUncertain,
    Uncertain,
}

impl VerdictCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::AiAttributed => "ai_attributed",
            Self::AiUncertain => "ai_uncertain",
            Self::Uncertain => "uncertain",
        }
    }
}

// ============ Classification Response ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateScore {
    pub model: ModelLabel,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationDetails {
    pub word_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_gap: Option<f64>,
    #[serde(default)]
    pub top_candidates: Vec<CandidateScore>,
}

/// Externally visible record for one classified text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyResponse {
    pub category: VerdictCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub details: ClassificationDetails,
    pub request_id: String,
    pub version: String,
}

// ============ Batch ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItemRequest {
    /// Any JSON scalar; numbers are echoed back as their text form.
    #[serde(default)]
    pub id: serde_json::Value,
    /// Left untyped so a non-string `text` surfaces as InvalidInput per item.
    #[serde(default)]
    pub text: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItemResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ClassifyResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub count: usize,
    pub fail_count: usize,
    pub human: usize,
    pub ai_attributed: usize,
    pub ai_uncertain: usize,
    pub uncertain: usize,
}

impl BatchItemRequest {
    /// The caller's id as a string, or `None` when absent, null or empty.
    pub fn id_string(&self) -> Option<String> {
        match &self.id {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl BatchSummary {
    pub fn record(&mut self, item: &BatchItemResponse) {
        self.count += 1;
        match item.result.as_ref().map(|r| r.category) {
            Some(VerdictCategory::Human) => self.human += 1,
            Some(VerdictCategory::AiAttributed) => self.ai_attributed += 1,
            Some(VerdictCategory::AiUncertain) => self.ai_uncertain += 1,
            Some(VerdictCategory::Uncertain) => self.uncertain += 1,
            None => self.fail_count += 1,
        }
    }
}
