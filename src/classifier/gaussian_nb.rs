use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::classifier::adapter::Classifier;
use crate::classifier::metadata::ModelMetadata;
use crate::error::{ArtifactError, InferenceError};

/// A trained Gaussian naive Bayes model.
///
/// Parameters are per class: a prior, and a mean and variance per feature.
/// Field names follow the usual fitted-attribute names (`theta`, `var`) so an
/// exporter only has to dump them as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GaussianNb {
    /// Class labels in output order.
    pub classes: Vec<String>,
    pub class_prior: Vec<f64>,
    /// Per-class feature means, `[n_classes][n_features]`.
    pub theta: Vec<Vec<f64>>,
    /// Per-class feature variances, `[n_classes][n_features]`.
    pub var: Vec<Vec<f64>>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl GaussianNb {
    /// Builds and validates a model from its parameters.
    pub fn new(
        classes: Vec<String>,
        class_prior: Vec<f64>,
        theta: Vec<Vec<f64>>,
        var: Vec<Vec<f64>>,
    ) -> Result<GaussianNb, InferenceError> {
        let model = GaussianNb { classes, class_prior, theta, var, metadata: None };
        model.validate()?;
        Ok(model)
    }

    /// Checks that the parameter shapes agree and every variance is positive.
    pub fn validate(&self) -> Result<(), InferenceError> {
        let n_classes = self.classes.len();
        if n_classes == 0 {
            return Err(InferenceError::EmptyArtifact);
        }
        if self.class_prior.len() != n_classes
            || self.theta.len() != n_classes
            || self.var.len() != n_classes
        {
            return Err(InferenceError::ShapeMismatch(format!(
                "{} classes but {} priors, {} mean rows, {} variance rows",
                n_classes,
                self.class_prior.len(),
                self.theta.len(),
                self.var.len()
            )));
        }

        let n_features = self.theta[0].len();
        if n_features == 0 {
            return Err(InferenceError::ShapeMismatch("model has no features".into()));
        }
        for (class, (means, vars)) in self.theta.iter().zip(self.var.iter()).enumerate() {
            if means.len() != n_features || vars.len() != n_features {
                return Err(InferenceError::ShapeMismatch(format!(
                    "class {} has {} means and {} variances, expected {}",
                    class, means.len(), vars.len(), n_features
                )));
            }
            for (feature, &value) in vars.iter().enumerate() {
                if !(value > 0.0) || !value.is_finite() {
                    return Err(InferenceError::InvalidVariance { class, feature, value });
                }
            }
        }
        if self.class_prior.iter().any(|p| !(*p > 0.0) || !p.is_finite()) {
            return Err(InferenceError::ShapeMismatch("class priors must be positive".into()));
        }

        if let Some(names) = self.metadata.as_ref().and_then(|m| m.feature_names.as_ref()) {
            if names.len() != n_features {
                return Err(InferenceError::ShapeMismatch(format!(
                    "{} feature names for {} features", names.len(), n_features
                )));
            }
        }
        Ok(())
    }

    /// Unnormalized joint log-likelihood `ln P(c) + ln P(x | c)` per class.
    fn joint_log_likelihood(&self, x: &[f64]) -> Vec<f64> {
        self.class_prior.iter()
            .zip(self.theta.iter().zip(self.var.iter()))
            .map(|(prior, (means, vars))| {
                let norm: f64 = vars.iter().map(|v| (2.0 * PI * v).ln()).sum();
                let dist: f64 = x.iter().zip(means.iter().zip(vars.iter()))
                    .map(|(xi, (mu, v))| (xi - mu).powi(2) / v)
                    .sum();
                prior.ln() - 0.5 * norm - 0.5 * dist
            })
            .collect()
    }

    /// Serializes the model to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<(), ArtifactError> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes and validates a model from a JSON file written by `save_json`.
    pub fn load_json(path: &str) -> Result<GaussianNb, ArtifactError> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let model: GaussianNb = serde_json::from_reader(reader)?;
        model.validate()?;
        Ok(model)
    }
}

impl Classifier for GaussianNb {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        self.theta.first().map_or(0, Vec::len)
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        if features.len() != self.n_features() {
            return Err(InferenceError::DimensionMismatch {
                expected: self.n_features(),
                got: features.len(),
            });
        }
        let jll = self.joint_log_likelihood(features);

        // log-sum-exp keeps the normalization stable when likelihoods underflow.
        let max = jll.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return Err(InferenceError::NonFiniteProbability { class: self.classes[0].clone() });
        }
        let log_norm = max + jll.iter().map(|v| (v - max).exp()).sum::<f64>().ln();
        Ok(jll.iter().map(|v| (v - log_norm).exp()).collect())
    }

    fn summary(&self) -> String {
        format!(
            "GaussianNB({} classes, {} features)",
            self.classes.len(),
            self.n_features()
        )
    }
}
