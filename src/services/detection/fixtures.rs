// Small hand-computable model shared by the unit tests.
// Terms are unigrams with idf 1.0 and L2 norm, so the weights of a text are
// counts divided by the vector length.

use super::{
    AttributionArtifact, AttributionClassifier, BinaryDetector, Calibration, FeatureExtractor,
    LabelClassArtifact, Norm, Vocabulary, Analyzer,
};

pub const TERMS: [&str; 8] = [
    "delve", "tapestry", "honestly", "lol", "furthermore", "crucial", "vibrant", "realm",
];

/// delve x2, tapestry x1: strongly GPT.
pub const GPT_TEXT: &str = "We delve into the tapestry of ideas and delve deeper still";
/// honestly x1, lol x2: strongly human.
pub const HUMAN_TEXT: &str = "honestly lol this was so much fun lol";
/// delve x1, honestly x1: exactly on the boundary.
pub const BOUNDARY_TEXT: &str = "delve honestly into the old stories here";
/// Claude and LLaMA terms in equal measure: AI, but no clear source.
pub const MIXED_TEXT: &str = "furthermore it is crucial to keep vibrant work in this realm";
/// No vocabulary term at all.
pub const OOV_TEXT: &str = "nothing in this sentence is known to the model";

pub fn vocabulary() -> Vocabulary {
    Vocabulary {
        analyzer: Analyzer::Word,
        ngram_range: (1, 3),
        lowercase: true,
        sublinear_tf: false,
        norm: Norm::L2,
        terms: TERMS.iter().enumerate().map(|(i, t)| (t.to_string(), i as u32)).collect(),
        idf: vec![1.0; TERMS.len()],
    }
}

pub fn extractor() -> FeatureExtractor {
    FeatureExtractor::new(vocabulary()).expect("fixture vocabulary")
}

pub fn detector() -> BinaryDetector {
    BinaryDetector::new(vec![2.0, 2.0, -2.0, -3.0, 1.5, 1.5, 1.5, 1.5], 0.0, Calibration::Margin)
}

pub fn attribution_artifact() -> AttributionArtifact {
    let row = |hot: &[usize]| {
        let mut coef = vec![0.0; TERMS.len()];
        for &i in hot {
            coef[i] = 2.0;
        }
        coef
    };
    AttributionArtifact {
        classes: vec![
            LabelClassArtifact { label: "gpt-4".to_string(), coef: row(&[0, 1]), intercept: -0.5 },
            LabelClassArtifact { label: "llama-2".to_string(), coef: row(&[6, 7]), intercept: -0.5 },
            LabelClassArtifact { label: "claude-2".to_string(), coef: row(&[4, 5]), intercept: -0.5 },
        ],
    }
}

pub fn attributor() -> AttributionClassifier {
    AttributionClassifier::from_artifact(attribution_artifact(), TERMS.len()).expect("fixture attribution")
}
