// Feature Extraction
// TF-IDF weighted n-gram vectors over a vocabulary fitted at training time

use crate::error::ModelLoadError;
use crate::models::FeatureVector;
use crate::services::text_processor::{char_ngrams, word_ngrams, word_tokens};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Analyzer {
    #[default]
    Word,
    Char,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    None,
}

/// Fitted vocabulary and IDF table. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vocabulary {
    #[serde(default)]
    pub analyzer: Analyzer,
    #[serde(default = "default_ngram_range", alias = "ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default, alias = "sublinear_tf")]
    pub sublinear_tf: bool,
    #[serde(default)]
    pub norm: Norm,
    /// n-gram -> feature index
    pub terms: HashMap<String, u32>,
    /// IDF weight per feature index
    pub idf: Vec<f64>,
}

fn default_ngram_range() -> (usize, usize) { (1, 3) }
fn default_true() -> bool { true }

impl Vocabulary {
    pub fn dim(&self) -> usize {
        self.idf.len()
    }

    pub fn validate(&self) -> Result<(), ModelLoadError> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ModelLoadError::InvalidVocabulary(format!(
                "bad n-gram range ({}, {})",
                min_n, max_n
            )));
        }
        if self.terms.len() != self.idf.len() {
            return Err(ModelLoadError::InvalidVocabulary(format!(
                "{} terms but {} idf weights",
                self.terms.len(),
                self.idf.len()
            )));
        }
        let mut seen = HashSet::with_capacity(self.terms.len());
        for (term, &idx) in &self.terms {
            if idx as usize >= self.idf.len() {
                return Err(ModelLoadError::InvalidVocabulary(format!(
                    "term '{}' has out-of-range index {}",
                    term, idx
                )));
            }
            if !seen.insert(idx) {
                return Err(ModelLoadError::InvalidVocabulary(format!(
                    "index {} assigned to more than one term",
                    idx
                )));
            }
        }
        if let Some(bad) = self.idf.iter().find(|w| !w.is_finite()) {
            return Err(ModelLoadError::InvalidVocabulary(format!("non-finite idf weight {}", bad)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    vocab: Vocabulary,
}

impl FeatureExtractor {
    pub fn new(vocab: Vocabulary) -> Result<Self, ModelLoadError> {
        vocab.validate()?;
        Ok(Self { vocab })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn dim(&self) -> usize {
        self.vocab.dim()
    }

    fn ngrams(&self, text: &str) -> Vec<String> {
        let (min_n, max_n) = self.vocab.ngram_range;
        match self.vocab.analyzer {
            Analyzer::Word => {
                let tokens = word_tokens(text, self.vocab.lowercase);
                word_ngrams(&tokens, min_n, max_n)
            }
            Analyzer::Char => char_ngrams(text, min_n, max_n, self.vocab.lowercase),
        }
    }

    /// Map text to its TF-IDF vector. Empty or fully out-of-vocabulary text
    /// gives the zero vector.
    pub fn extract(&self, text: &str) -> FeatureVector {
        let dim = self.dim();
        if text.trim().is_empty() {
            return FeatureVector::zeros(dim);
        }

        let mut counts: HashMap<u32, f64> = HashMap::new();
        for gram in self.ngrams(text) {
            if let Some(&idx) = self.vocab.terms.get(&gram) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(u32, f64)> = counts
            .into_iter()
            .map(|(idx, count)| {
                let tf = if self.vocab.sublinear_tf { 1.0 + count.ln() } else { count };
                (idx, tf * self.vocab.idf[idx as usize])
            })
            .filter(|(_, w)| *w != 0.0)
            .collect();
        entries.sort_by_key(|(idx, _)| *idx);

        if self.vocab.norm == Norm::L2 {
            let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                for entry in entries.iter_mut() {
                    entry.1 /= norm;
                }
            }
        }

        FeatureVector { dim, entries }
    }
}
