use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::classifier::adapter::{Classification, ClassProbability};
use crate::texture::features::FeatureVector;

/// What the pipeline hands to callers and to the prediction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Label from the model's own `predict`.
    pub prediction: String,
    /// Argmax label of `probabilities`; always equal to `prediction`.
    pub prediction_label: String,
    pub confidence: f64,
    pub probabilities: Vec<ClassProbability>,
    pub glcm_features: FeatureVector,
}

impl PredictionResult {
    pub fn new(classification: Classification, features: FeatureVector) -> PredictionResult {
        PredictionResult {
            prediction: classification.prediction,
            prediction_label: classification.label,
            confidence: classification.confidence,
            probabilities: classification.distribution,
            glcm_features: features,
        }
    }
}

/// A prediction from an image, with the normalized grid kept for display.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub result: PredictionResult,
    pub grayscale: GrayImage,
}
