//! A decision tree exported from the offline training job as JSON.
//!
//! Nodes follow the scikit-learn convention: a split sends an input left
//! when `x[feature] <= threshold`, and a leaf carries the per-class
//! training sample counts in `classes` order.

use super::{ClassProbabilities, ClassifierBackend, ClassifierError, CongestionState, FEATURE_COUNT};
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

#[derive(Deserialize, Debug)]
struct TreeFile {
    #[serde(default)]
    feature_names: Vec<String>,
    classes: Vec<String>,
    nodes: Vec<TreeNode>,
}

/// Validated decision tree.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    classes: Vec<CongestionState>,
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Load and validate a tree from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse and validate a tree from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self, ClassifierError> {
        let file: TreeFile = serde_json::from_str(raw)?;
        if !file.feature_names.is_empty() && file.feature_names.len() != FEATURE_COUNT {
            return Err(ClassifierError::InvalidModel(format!(
                "expected {FEATURE_COUNT} features, model has {}",
                file.feature_names.len()
            )));
        }
        if file.classes.is_empty() {
            return Err(ClassifierError::InvalidModel("no classes".to_string()));
        }
        let classes = file
            .classes
            .iter()
            .map(|c| c.parse::<CongestionState>())
            .collect::<Result<Vec<_>, _>>()?;
        if file.nodes.is_empty() {
            return Err(ClassifierError::InvalidModel("no nodes".to_string()));
        }

        for (index, node) in file.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(ClassifierError::InvalidModel(format!(
                            "node {index} splits on unknown feature {feature}"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ClassifierError::InvalidModel(format!(
                            "node {index} has a non-finite threshold"
                        )));
                    }
                    // Children must point forward; this also rules out cycles.
                    for child in [*left, *right] {
                        if child <= index || child >= file.nodes.len() {
                            return Err(ClassifierError::InvalidModel(format!(
                                "node {index} has invalid child {child}"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != classes.len() {
                        return Err(ClassifierError::InvalidModel(format!(
                            "leaf {index} has {} values for {} classes",
                            value.len(),
                            classes.len()
                        )));
                    }
                    let total: f64 = value.iter().sum();
                    if value.iter().any(|v| !v.is_finite() || *v < 0.0) || total <= 0.0 {
                        return Err(ClassifierError::InvalidModel(format!(
                            "leaf {index} has no usable class counts"
                        )));
                    }
                }
            }
        }

        Ok(Self {
            classes,
            nodes: file.nodes,
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn leaf_for(&self, features: &[f64; FEATURE_COUNT]) -> Result<&[f64], ClassifierError> {
        if features.iter().any(|f| !f.is_finite()) {
            return Err(ClassifierError::Prediction(format!(
                "non-finite input {features:?}"
            )));
        }
        let mut index = 0;
        // Validation guarantees forward-only links, so this terminates.
        loop {
            match self.nodes.get(index) {
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    index = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Some(TreeNode::Leaf { value }) => return Ok(value.as_slice()),
                None => {
                    return Err(ClassifierError::Prediction(format!(
                        "walked off the tree at node {index}"
                    )))
                }
            }
        }
    }
}

impl ClassifierBackend for DecisionTree {
    fn predict(&self, features: &[f64; FEATURE_COUNT]) -> Result<CongestionState, ClassifierError> {
        let leaf = self.leaf_for(features)?;
        // First maximum wins, as in scikit-learn's argmax.
        let mut best = 0;
        for (i, count) in leaf.iter().enumerate() {
            if *count > leaf[best] {
                best = i;
            }
        }
        Ok(self.classes[best])
    }

    fn predict_probabilities(
        &self,
        features: &[f64; FEATURE_COUNT],
    ) -> Option<Result<ClassProbabilities, ClassifierError>> {
        let leaf = match self.leaf_for(features) {
            Ok(leaf) => leaf,
            Err(e) => return Some(Err(e)),
        };
        let total: f64 = leaf.iter().sum();
        let mut probabilities = ClassProbabilities {
            low: 0.0,
            med: 0.0,
            high: 0.0,
        };
        for (class, count) in self.classes.iter().zip(leaf.iter()) {
            let p = count / total;
            match class {
                CongestionState::Low => probabilities.low += p,
                CongestionState::Med => probabilities.med += p,
                CongestionState::High => probabilities.high += p,
            }
        }
        Some(Ok(probabilities))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::classifier::Classifier;
    use crate::derive_features;

    const REFERENCE_MODEL: &str = include_str!("../../models/traffic_model.json");

    fn reference() -> DecisionTree {
        DecisionTree::from_json(REFERENCE_MODEL).expect("reference model is valid")
    }

    #[test]
    fn reference_model_matches_training_clusters() {
        let tree = reference();
        let cases = [
            ([10.0, 10.0, 5.0, 1000.0], CongestionState::Low),
            ([60.0, 50.0, 100.0, 5000.0], CongestionState::Med),
            ([95.0, 120.0, 400.0, 12000.0], CongestionState::High),
        ];
        for (input, expected) in cases {
            assert_eq!(tree.predict(&input).expect("valid input"), expected);
        }
    }

    #[test]
    fn probabilities_sum_to_one() {
        let tree = reference();
        let p = tree
            .predict_probabilities(&[60.0, 50.0, 100.0, 5000.0])
            .expect("tree exposes probabilities")
            .expect("valid input");
        assert!((p.low + p.med + p.high - 1.0).abs() < 1e-9);
        assert!(p.med > 0.9);
    }

    #[test]
    fn model_confidence_is_rounded_percent() {
        let classifier = Classifier::Model {
            backend: Box::new(reference()),
            default_confidence: 90.0,
        };
        let features = derive_features(10.0, 100.0).expect("valid load");
        let result = classifier.classify(&features, 0.4).expect("valid input");
        assert_eq!(result.state, CongestionState::Low);
        // 1012 / 1015 samples in the low leaf
        assert_eq!(result.confidence, 99.7);
    }

    #[test]
    fn rejects_backward_links() {
        let raw = r#"{"classes":["low"],"nodes":[
            {"feature":0,"threshold":1.0,"left":0,"right":1},
            {"value":[1.0]}
        ]}"#;
        assert!(matches!(
            DecisionTree::from_json(raw),
            Err(ClassifierError::InvalidModel(_))
        ));
    }

    #[test]
    fn rejects_unknown_features_and_labels() {
        let bad_feature = r#"{"classes":["low"],"nodes":[
            {"feature":7,"threshold":1.0,"left":1,"right":2},
            {"value":[1.0]},{"value":[1.0]}
        ]}"#;
        assert!(DecisionTree::from_json(bad_feature).is_err());

        let bad_label = r#"{"classes":["severe"],"nodes":[{"value":[1.0]}]}"#;
        assert!(matches!(
            DecisionTree::from_json(bad_label),
            Err(ClassifierError::UnknownLabel(_))
        ));
    }

    #[test]
    fn rejects_mismatched_leaves() {
        let raw = r#"{"classes":["low","high"],"nodes":[{"value":[1.0]}]}"#;
        assert!(DecisionTree::from_json(raw).is_err());
        let empty = r#"{"classes":["low","high"],"nodes":[{"value":[0.0, 0.0]}]}"#;
        assert!(DecisionTree::from_json(empty).is_err());
    }

    #[test]
    fn non_finite_input_is_a_prediction_error() {
        let tree = reference();
        assert!(tree.predict(&[f64::NAN, 0.0, 0.0, 0.0]).is_err());
    }
}
