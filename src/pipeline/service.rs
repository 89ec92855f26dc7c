use std::sync::Arc;

use image::GrayImage;
use tracing::debug;

use crate::classifier::adapter::{classify, Classifier};
use crate::classifier::gaussian_nb::GaussianNb;
use crate::error::{ArtifactError, InferenceError, PipelineError};
use crate::pipeline::result::{Prediction, PredictionResult};
use crate::preprocess::normalizer::decode_grayscale;
use crate::texture::features::{extract_features, FeatureVector};

/// Input to the pipeline once the request boundary has unpacked it.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionInput {
    /// Encoded image bytes in any supported format.
    ImageBytes(Vec<u8>),
    /// A precomputed feature vector in training order.
    Features(Vec<f64>),
}

/// Output of [`PredictionService::predict`].
#[derive(Debug, Clone)]
pub enum PredictionOutput {
    Image(Prediction),
    Features(PredictionResult),
}

impl PredictionOutput {
    pub fn result(&self) -> &PredictionResult {
        match self {
            PredictionOutput::Image(p) => &p.result,
            PredictionOutput::Features(r) => r,
        }
    }
}

/// Normalize → extract → classify, against one shared read-only model.
///
/// Cheap to clone; every clone shares the same loaded artifact. Each call works
/// on request-local buffers only, so concurrent calls need no locking.
#[derive(Clone)]
pub struct PredictionService {
    model: Arc<dyn Classifier>,
}

impl PredictionService {
    pub fn new(model: Arc<dyn Classifier>) -> PredictionService {
        PredictionService { model }
    }

    /// Loads a Gaussian naive Bayes artifact from JSON.
    pub fn from_artifact(path: &str) -> Result<PredictionService, ArtifactError> {
        let model = GaussianNb::load_json(path)?;
        Ok(PredictionService::new(Arc::new(model)))
    }

    pub fn model(&self) -> &dyn Classifier {
        self.model.as_ref()
    }

    pub fn predict(&self, input: PredictionInput) -> Result<PredictionOutput, PipelineError> {
        match input {
            PredictionInput::ImageBytes(bytes) => self.predict_image(&bytes).map(PredictionOutput::Image),
            PredictionInput::Features(values) => self.predict_features(&values).map(PredictionOutput::Features),
        }
    }

    pub fn predict_image(&self, bytes: &[u8]) -> Result<Prediction, PipelineError> {
        let (grayscale, features) = extract_from_bytes(bytes)?;
        let classification = classify(self.model(), &features.to_array())?;
        Ok(Prediction { result: PredictionResult::new(classification, features), grayscale })
    }

    pub fn predict_features(&self, values: &[f64]) -> Result<PredictionResult, PipelineError> {
        let features = FeatureVector::from_slice(values).ok_or(InferenceError::DimensionMismatch {
            expected: FeatureVector::LEN,
            got: values.len(),
        })?;
        let classification = classify(self.model(), values)?;
        Ok(PredictionResult::new(classification, features))
    }
}

/// Decodes `bytes` to grayscale and extracts its texture descriptor.
pub fn extract_from_bytes(bytes: &[u8]) -> Result<(GrayImage, FeatureVector), PipelineError> {
    let grayscale = decode_grayscale(bytes)?;
    debug!(width = grayscale.width(), height = grayscale.height(), "decoded upload");
    let features = extract_features(&grayscale)?;
    Ok((grayscale, features))
}
