//! Congestion classification. A classifier is chosen once at start-up:
//! either a pretrained model, or the utilization threshold fallback.

mod decision_tree;
mod threshold;

pub use decision_tree::DecisionTree;
pub use threshold::{threshold_state, THRESHOLD_CONFIDENCE};

use crate::DerivedFeatures;
use aqos_config::ClassifierConfig;
use aqos_utils::rounding::round_dp;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

/// Number of model input features.
pub const FEATURE_COUNT: usize = 4;

/// Discrete congestion level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CongestionState {
    #[default]
    Low,
    Med,
    High,
}

impl CongestionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CongestionState::Low => "low",
            CongestionState::Med => "med",
            CongestionState::High => "high",
        }
    }
}

impl Display for CongestionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CongestionState {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(CongestionState::Low),
            "med" => Ok(CongestionState::Med),
            "high" => Ok(CongestionState::High),
            _ => Err(ClassifierError::UnknownLabel(s.to_string())),
        }
    }
}

/// Probability of each congestion state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassProbabilities {
    pub low: f64,
    pub med: f64,
    pub high: f64,
}

impl ClassProbabilities {
    pub fn max(&self) -> f64 {
        self.low.max(self.med).max(self.high)
    }
}

/// A pretrained congestion model.
pub trait ClassifierBackend: Send + Sync {
    /// Predict a label for `[load, delay, queue, arrivals]`.
    fn predict(&self, features: &[f64; FEATURE_COUNT]) -> Result<CongestionState, ClassifierError>;

    /// Class distribution for the same input. Models without a
    /// probability interface return `None`.
    fn predict_probabilities(
        &self,
        _features: &[f64; FEATURE_COUNT],
    ) -> Option<Result<ClassProbabilities, ClassifierError>> {
        None
    }
}

/// Result of one classification.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classification {
    pub state: CongestionState,
    /// Percent, one decimal place.
    pub confidence: f64,
    /// Wall-clock time spent predicting, in ms, two decimal places.
    pub inference_ms: f64,
}

/// Congestion classifier, selected once per process.
pub enum Classifier {
    Model {
        backend: Box<dyn ClassifierBackend>,
        default_confidence: f64,
    },
    Threshold,
}

impl Classifier {
    /// Build the classifier named by the configuration. A model that
    /// fails to load leaves the process in threshold mode for good.
    pub fn from_config(config: &ClassifierConfig) -> Self {
        let Some(path) = &config.model_path else {
            info!("No classifier model configured, using threshold classification.");
            return Classifier::Threshold;
        };
        match DecisionTree::load(path) {
            Ok(tree) => {
                info!("Loaded congestion model from {path} ({} nodes)", tree.node_count());
                Classifier::Model {
                    backend: Box::new(tree),
                    default_confidence: config.default_confidence,
                }
            }
            Err(e) => {
                warn!("Unable to load congestion model from {path}: {e}. Falling back to threshold classification.");
                Classifier::Threshold
            }
        }
    }

    pub fn is_model_backed(&self) -> bool {
        matches!(self, Classifier::Model { .. })
    }

    /// Classify the current features. `threshold` is the congestion
    /// threshold from the active policy; only the fallback uses it.
    pub fn classify(
        &self,
        features: &DerivedFeatures,
        threshold: f64,
    ) -> Result<Classification, ClassifierError> {
        let start = Instant::now();
        let (state, confidence) = match self {
            Classifier::Model {
                backend,
                default_confidence,
            } => {
                let input = features.model_input();
                let state = backend.predict(&input)?;
                let confidence = match backend.predict_probabilities(&input) {
                    Some(probabilities) => round_dp(probabilities?.max() * 100.0, 1),
                    None => *default_confidence,
                };
                (state, confidence)
            }
            Classifier::Threshold => (
                threshold_state(features.utilization_ratio, threshold),
                THRESHOLD_CONFIDENCE,
            ),
        };
        let inference_ms = round_dp(start.elapsed().as_secs_f64() * 1000.0, 2);
        Ok(Classification {
            state,
            confidence,
            inference_ms,
        })
    }
}

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Unable to read model file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to parse model: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid model: {0}")]
    InvalidModel(String),
    #[error("Unknown congestion label '{0}'")]
    UnknownLabel(String),
    #[error("Prediction failed: {0}")]
    Prediction(String),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::derive_features;

    struct LabelOnly(CongestionState);

    impl ClassifierBackend for LabelOnly {
        fn predict(&self, _: &[f64; FEATURE_COUNT]) -> Result<CongestionState, ClassifierError> {
            Ok(self.0)
        }
    }

    struct Broken;

    impl ClassifierBackend for Broken {
        fn predict(&self, _: &[f64; FEATURE_COUNT]) -> Result<CongestionState, ClassifierError> {
            Err(ClassifierError::Prediction("model exploded".to_string()))
        }
    }

    fn features(load: f64) -> DerivedFeatures {
        derive_features(load, 100.0).expect("valid load")
    }

    #[test]
    fn threshold_fallback_reports_fixed_confidence() {
        let result = Classifier::Threshold
            .classify(&features(95.0), 0.4)
            .expect("threshold never fails");
        assert_eq!(result.state, CongestionState::High);
        assert_eq!(result.confidence, 80.0);
        assert!(result.inference_ms >= 0.0);
    }

    #[test]
    fn model_without_probabilities_uses_default_confidence() {
        let classifier = Classifier::Model {
            backend: Box::new(LabelOnly(CongestionState::Med)),
            default_confidence: 90.0,
        };
        let result = classifier.classify(&features(10.0), 0.4).expect("label only");
        assert_eq!(result.state, CongestionState::Med);
        assert_eq!(result.confidence, 90.0);
        assert!(classifier.is_model_backed());
    }

    #[test]
    fn model_errors_propagate() {
        let classifier = Classifier::Model {
            backend: Box::new(Broken),
            default_confidence: 90.0,
        };
        assert!(classifier.classify(&features(10.0), 0.4).is_err());
    }

    #[test]
    fn missing_model_falls_back_to_threshold() {
        let config = ClassifierConfig {
            model_path: Some("/nonexistent/traffic_model.json".to_string()),
            default_confidence: 90.0,
        };
        assert!(!Classifier::from_config(&config).is_model_backed());
        assert!(!Classifier::from_config(&ClassifierConfig::default()).is_model_backed());
    }

    #[test]
    fn labels_round_trip_through_strings() {
        for state in [CongestionState::Low, CongestionState::Med, CongestionState::High] {
            assert_eq!(state.to_string().parse::<CongestionState>().ok(), Some(state));
        }
        assert!("severe".parse::<CongestionState>().is_err());
    }
}
