//! TF-IDF vectorizer followed by a linear decision function, loaded from a
//! JSON artifact. This is the only code that knows the artifact layout.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Result;
use ndarray::Array1;
use regex::Regex;
use serde::Deserialize;

use super::Classifier;
use crate::error::ModelError;

const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Norm {
    L1,
    L2,
}

#[derive(Debug, Deserialize)]
struct VectorizerSpec {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    #[serde(default = "default_lowercase")]
    lowercase: bool,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default)]
    stop_words: Vec<String>,
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default = "default_norm")]
    norm: Option<Norm>,
    #[serde(default = "default_token_pattern")]
    token_pattern: String,
}

fn default_lowercase() -> bool {
    true
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

fn default_classes() -> [i64; 2] {
    [0, 1]
}

#[derive(Debug, Deserialize)]
struct Artifact {
    vectorizer: VectorizerSpec,
    coef: Vec<f64>,
    intercept: f64,
    #[serde(default = "default_classes")]
    classes: [i64; 2],
}

#[derive(Debug)]
pub struct LinearTextClassifier {
    vocabulary: HashMap<String, usize>,
    idf: Array1<f64>,
    lowercase: bool,
    ngram_range: (usize, usize),
    stop_words: HashSet<String>,
    sublinear_tf: bool,
    norm: Option<Norm>,
    token_pattern: Regex,
    coef: Array1<f64>,
    intercept: f64,
    classes: [i64; 2],
}

impl LinearTextClassifier {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let reader = BufReader::new(File::open(path)?);
        let artifact: Artifact = serde_json::from_reader(reader)?;
        Self::from_artifact(artifact)
    }

    #[cfg(test)]
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Self::from_artifact(serde_json::from_str(json)?)
    }

    fn from_artifact(artifact: Artifact) -> Result<Self, ModelError> {
        let Artifact {
            vectorizer,
            coef,
            intercept,
            classes,
        } = artifact;

        let n_features = coef.len();
        if n_features == 0 {
            return Err(ModelError::Invalid("empty coefficient vector".into()));
        }
        if vectorizer.idf.len() != n_features {
            return Err(ModelError::Invalid(format!(
                "idf has {} entries but coef has {}",
                vectorizer.idf.len(),
                n_features
            )));
        }
        if let Some((term, &index)) = vectorizer
            .vocabulary
            .iter()
            .find(|(_, index)| **index >= n_features)
        {
            return Err(ModelError::Invalid(format!(
                "vocabulary term '{}' maps to index {} (only {} features)",
                term, index, n_features
            )));
        }
        let (min_n, max_n) = vectorizer.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ModelError::Invalid(format!(
                "bad ngram_range ({}, {})",
                min_n, max_n
            )));
        }
        let token_pattern = Regex::new(&vectorizer.token_pattern)
            .map_err(|e| ModelError::Invalid(format!("bad token_pattern: {}", e)))?;

        Ok(Self {
            vocabulary: vectorizer.vocabulary,
            idf: Array1::from(vectorizer.idf),
            lowercase: vectorizer.lowercase,
            ngram_range: vectorizer.ngram_range,
            stop_words: vectorizer.stop_words.into_iter().collect(),
            sublinear_tf: vectorizer.sublinear_tf,
            norm: vectorizer.norm,
            token_pattern,
            coef: Array1::from(coef),
            intercept,
            classes,
        })
    }

    pub fn n_features(&self) -> usize {
        self.coef.len()
    }

    fn terms(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let tokens: Vec<&str> = self
            .token_pattern
            .find_iter(&text)
            .map(|m| m.as_str())
            .filter(|t| !self.stop_words.contains(*t))
            .collect();

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n.min(tokens.len()) {
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }

    fn transform(&self, text: &str) -> Array1<f64> {
        let mut features = Array1::<f64>::zeros(self.n_features());
        for term in self.terms(text) {
            if let Some(&index) = self.vocabulary.get(&term) {
                features[index] += 1.0;
            }
        }

        if self.sublinear_tf {
            features.mapv_inplace(|tf| if tf > 0.0 { 1.0 + tf.ln() } else { 0.0 });
        }
        features *= &self.idf;

        let scale = match self.norm {
            Some(Norm::L2) => features.dot(&features).sqrt(),
            Some(Norm::L1) => features.iter().map(|v| v.abs()).sum(),
            None => 1.0,
        };
        if scale > 0.0 {
            features /= scale;
        }
        features
    }

    pub fn decision_function(&self, text: &str) -> f64 {
        self.transform(text).dot(&self.coef) + self.intercept
    }
}

impl Classifier for LinearTextClassifier {
    fn predict(&self, batch: &[String]) -> Result<Vec<i64>> {
        Ok(batch
            .iter()
            .map(|text| {
                if self.decision_function(text) > 0.0 {
                    self.classes[1]
                } else {
                    self.classes[0]
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::fixtures::SAMPLE_ARTIFACT;
    use crate::classifier::Label;

    fn sample() -> LinearTextClassifier {
        LinearTextClassifier::from_json(SAMPLE_ARTIFACT).unwrap()
    }

    #[test]
    fn scores_sample_texts() {
        let model = sample();
        assert_eq!(model.classify("this is fake").unwrap(), Label::Fake);
        assert_eq!(model.classify("Official REPORT").unwrap(), Label::Real);
        // Nothing in the vocabulary: only the intercept remains.
        assert!((model.decision_function("zzz qqq") + 0.2).abs() < 1e-9);
    }

    #[test]
    fn single_known_term_is_unit_normalised() {
        let model = sample();
        assert!((model.decision_function("fake") - 1.8).abs() < 1e-9);
    }

    #[test]
    fn predict_keeps_batch_order() {
        let model = sample();
        let batch = vec!["a hoax".to_string(), "official report".to_string()];
        assert_eq!(model.predict(&batch).unwrap(), vec![1, 0]);
    }

    #[test]
    fn repeated_calls_are_deterministic() {
        let model = sample();
        let first = model.decision_function("fake news hoax");
        for _ in 0..5 {
            assert_eq!(model.decision_function("fake news hoax"), first);
        }
    }

    #[test]
    fn bigrams_and_custom_classes() {
        let json = r#"{
            "vectorizer": {
                "vocabulary": {"fake news": 0, "news": 1},
                "idf": [1.0, 1.0],
                "ngram_range": [1, 2],
                "norm": null
            },
            "coef": [1.0, -0.5],
            "intercept": 0.0,
            "classes": [7, 9]
        }"#;
        let model = LinearTextClassifier::from_json(json).unwrap();
        assert!((model.decision_function("fake news") - 0.5).abs() < 1e-9);
        assert_eq!(model.predict(&["news".to_string()]).unwrap(), vec![7]);
        assert_eq!(model.predict(&["fake news".to_string()]).unwrap(), vec![9]);
    }

    #[test]
    fn sublinear_tf_dampens_repeats() {
        let json = r#"{
            "vectorizer": {
                "vocabulary": {"fake": 0},
                "idf": [1.0],
                "sublinear_tf": true,
                "norm": null
            },
            "coef": [1.0],
            "intercept": 0.0
        }"#;
        let model = LinearTextClassifier::from_json(json).unwrap();
        let expected = 1.0 + 3f64.ln();
        assert!((model.decision_function("fake fake fake") - expected).abs() < 1e-9);
    }

    #[test]
    fn rejects_inconsistent_artifacts() {
        let mismatched = r#"{"vectorizer": {"vocabulary": {}, "idf": [1.0]}, "coef": [1.0, 2.0], "intercept": 0.0}"#;
        assert!(matches!(
            LinearTextClassifier::from_json(mismatched),
            Err(ModelError::Invalid(_))
        ));

        let out_of_range = r#"{"vectorizer": {"vocabulary": {"a": 3}, "idf": [1.0]}, "coef": [1.0], "intercept": 0.0}"#;
        assert!(matches!(
            LinearTextClassifier::from_json(out_of_range),
            Err(ModelError::Invalid(_))
        ));

        let bad_ngrams = r#"{"vectorizer": {"vocabulary": {}, "idf": [1.0], "ngram_range": [2, 1]}, "coef": [1.0], "intercept": 0.0}"#;
        assert!(matches!(
            LinearTextClassifier::from_json(bad_ngrams),
            Err(ModelError::Invalid(_))
        ));

        assert!(matches!(
            LinearTextClassifier::from_json("not json"),
            Err(ModelError::Format(_))
        ));
    }
}
