use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::InferenceError;

/// Allowed deviation of a probability distribution's total from 1.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// A pre-trained probabilistic classifier.
///
/// Implementations are immutable once loaded; every method takes `&self` so a
/// single instance can be shared across request threads.
pub trait Classifier: Send + Sync {
    /// Class labels in the order `predict_proba` reports them.
    fn classes(&self) -> &[String];

    /// Number of input features the model was trained on.
    fn n_features(&self) -> usize;

    /// Probability for every class, in `classes()` order.
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError>;

    /// Most probable class label.
    fn predict(&self, features: &[f64]) -> Result<String, InferenceError> {
        let proba = self.predict_proba(features)?;
        let idx = argmax(&proba).ok_or(InferenceError::EmptyArtifact)?;
        self.classes()
            .get(idx)
            .cloned()
            .ok_or_else(|| InferenceError::ShapeMismatch(format!("no label for class index {}", idx)))
    }

    /// One-line human-readable description.
    fn summary(&self) -> String {
        format!("{} classes, {} features", self.classes().len(), self.n_features())
    }
}

/// One entry of a class distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProbability {
    #[serde(rename = "class")]
    pub label: String,
    pub probability: f64,
}

/// Outcome of running a feature vector through a classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Label returned by the model's own `predict`.
    pub prediction: String,
    /// Label with the highest probability in `distribution`.
    pub label: String,
    /// Probability of `label`.
    pub confidence: f64,
    /// Every class with its probability, in the model's class order.
    pub distribution: Vec<ClassProbability>,
}

/// Runs `features` through `model` and checks the answer is self-consistent.
///
/// Fails if the feature count is wrong, the distribution has the wrong length,
/// contains non-finite values, does not sum to 1, or if the model's `predict`
/// disagrees with the argmax of its own distribution.
pub fn classify(model: &dyn Classifier, features: &[f64]) -> Result<Classification, InferenceError> {
    let expected = model.n_features();
    if features.len() != expected {
        return Err(InferenceError::DimensionMismatch { expected, got: features.len() });
    }
    if let Some(index) = features.iter().position(|v| !v.is_finite()) {
        return Err(InferenceError::NonFiniteFeature { index });
    }

    let classes = model.classes();
    let proba = model.predict_proba(features)?;
    if proba.len() != classes.len() {
        return Err(InferenceError::ShapeMismatch(format!(
            "model returned {} probabilities for {} classes",
            proba.len(),
            classes.len()
        )));
    }
    if let Some(i) = proba.iter().position(|p| !p.is_finite()) {
        return Err(InferenceError::NonFiniteProbability { class: classes[i].clone() });
    }
    if let Some(i) = proba.iter().position(|p| !(0.0..=1.0).contains(p)) {
        return Err(InferenceError::InvalidProbability { class: classes[i].clone(), value: proba[i] });
    }
    let sum: f64 = proba.iter().sum();
    if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(InferenceError::DistributionNotNormalized { sum });
    }

    let best = argmax(&proba).ok_or(InferenceError::EmptyArtifact)?;
    let label = classes[best].clone();
    let prediction = model.predict(features)?;
    if prediction != label {
        return Err(InferenceError::InconsistentPrediction { predicted: prediction, argmax: label });
    }

    let distribution = classes.iter()
        .zip(proba.iter())
        .map(|(label, &probability)| ClassProbability { label: label.clone(), probability })
        .collect();

    debug!(label = %label, confidence = proba[best], "classified feature vector");
    Ok(Classification { prediction, label, confidence: proba[best], distribution })
}

/// Index of the first maximum element; `None` for an empty slice.
pub fn argmax(v: &[f64]) -> Option<usize> {
    v.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &x)| match best {
            Some((_, b)) if b >= x => best,
            _ => Some((i, x)),
        })
        .map(|(i, _)| i)
}
