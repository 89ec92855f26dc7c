use serde::{Deserialize, Serialize};

/// Optional annotations attached to a saved classifier.
/// All fields are Option<> so bare artifacts (parameters only) deserialize cleanly.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ModelMetadata {
    pub description: Option<String>,
    /// Names of the input features in training order
    /// (e.g. ["contrast", "correlation", "energy", "homogeneity"]).
    pub feature_names: Option<Vec<String>>,
    /// Free-form note on the training data (dataset name, date, sample count).
    pub trained_on: Option<String>,
}
