use serde::{Deserialize, Serialize};

/// Congestion classifier selection.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Path to a decision-tree artifact (JSON). If absent, or if it
    /// can't be loaded, threshold classification is used.
    pub model_path: Option<String>,

    /// Confidence reported by a model that exposes no class probabilities.
    pub default_confidence: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            default_confidence: 90.0,
        }
    }
}

impl ClassifierConfig {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if !(0.0..=100.0).contains(&self.default_confidence) {
            return Err("classifier.default_confidence must be within 0-100".to_string());
        }
        Ok(())
    }
}
