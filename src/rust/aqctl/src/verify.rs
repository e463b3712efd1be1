use anyhow::Result;
use aqos_engine::classifier::{ClassifierBackend, DecisionTree, FEATURE_COUNT};
use aqos_engine::CongestionState;
use std::fmt::Display;
use std::path::Path;

/// Canonical `[load, delay, queue, arrivals]` inputs and the state a
/// usable model must assign them.
const REFERENCE_INPUTS: [([f64; FEATURE_COUNT], CongestionState); 3] = [
    ([10.0, 10.0, 5.0, 1000.0], CongestionState::Low),
    ([60.0, 50.0, 100.0, 5000.0], CongestionState::Med),
    ([95.0, 120.0, 400.0, 12000.0], CongestionState::High),
];

pub struct Outcome {
    pub input: [f64; FEATURE_COUNT],
    pub expected: CongestionState,
    pub predicted: CongestionState,
    /// Percent, if the model exposes probabilities.
    pub confidence: Option<f64>,
}

impl Outcome {
    pub fn passed(&self) -> bool {
        self.expected == self.predicted
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?} expected {} got {}",
            self.input, self.expected, self.predicted
        )?;
        if let Some(confidence) = self.confidence {
            write!(f, " ({confidence:.1}%)")?;
        }
        if !self.passed() {
            write!(f, " MISMATCH")?;
        }
        Ok(())
    }
}

pub fn verify_model(backend: &dyn ClassifierBackend) -> Result<Vec<Outcome>> {
    let mut outcomes = Vec::with_capacity(REFERENCE_INPUTS.len());
    for (input, expected) in REFERENCE_INPUTS {
        let predicted = backend.predict(&input)?;
        let confidence = match backend.predict_probabilities(&input) {
            Some(probabilities) => Some(probabilities?.max() * 100.0),
            None => None,
        };
        outcomes.push(Outcome {
            input,
            expected,
            predicted,
            confidence,
        });
    }
    Ok(outcomes)
}

pub fn verify_model_file(path: &Path) -> Result<Vec<Outcome>> {
    let tree = DecisionTree::load(path)?;
    println!("Loaded {} ({} nodes)", path.display(), tree.node_count());
    verify_model(&tree)
}
