//! Typed failures for every stage of the pipeline.
//!
//! Each stage has its own error enum so callers can tell apart a bad upload
//! (`DecodeError`), a numerical dead end in feature extraction
//! (`ExtractionError`) and an artifact that cannot produce a usable prediction
//! (`InferenceError`). `PipelineError` wraps all three for the request boundary.

use thiserror::Error;

/// The input bytes could not be turned into a grayscale grid.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No bytes were supplied.
    #[error("image payload is empty")]
    Empty,
    /// The bytes are not a parsable image in any supported format.
    #[error("could not decode image: {0}")]
    Malformed(#[from] image::ImageError),
    /// The image decoded but has no pixels along one axis.
    #[error("image has degenerate dimensions {width}x{height}")]
    ZeroSize { width: u32, height: u32 },
    /// A base64 image field did not contain valid base64.
    #[error("invalid base64 image payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    /// Single-channel samples fall outside the 8-bit range the extractor expects.
    #[error("single-channel samples must be 8-bit intensities, found {found}")]
    UnsupportedSampleRange { found: String },
}

/// Feature extraction hit a degeneracy it cannot resolve internally.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// A statistic came out as NaN or infinity.
    #[error("texture statistic '{feature}' is not finite")]
    NonFinite { feature: &'static str },
}

/// The classifier artifact could not produce a usable prediction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InferenceError {
    #[error("model expects {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("model has no classes")]
    EmptyArtifact,
    #[error("inconsistent model shape: {0}")]
    ShapeMismatch(String),
    #[error("variance for class {class}, feature {feature} must be positive, got {value}")]
    InvalidVariance { class: usize, feature: usize, value: f64 },
    #[error("feature {index} is not finite")]
    NonFiniteFeature { index: usize },
    #[error("probability for class '{class}' is not finite")]
    NonFiniteProbability { class: String },
    #[error("probability for class '{class}' is {value}, outside [0, 1]")]
    InvalidProbability { class: String, value: f64 },
    #[error("class probabilities sum to {sum}, expected 1")]
    DistributionNotNormalized { sum: f64 },
    #[error("model predicted '{predicted}' but the most probable class is '{argmax}'")]
    InconsistentPrediction { predicted: String, argmax: String },
}

/// Failure loading the classifier artifact at startup.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("could not read model file: {0}")]
    Io(#[from] std::io::Error),
    #[error("model file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("model failed validation: {0}")]
    Invalid(#[from] InferenceError),
}

/// Failure reading or appending the prediction log.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("prediction log I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("prediction log line {line} is corrupt: {source}")]
    Corrupt { line: usize, source: serde_json::Error },
    #[error("could not serialize log entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Any failure of the normalize → extract → classify sequence.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl PipelineError {
    /// Stable error-class indicator for structured error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Decode(_)     => "decode_error",
            PipelineError::Extraction(_) => "extraction_error",
            PipelineError::Inference(_)  => "inference_error",
        }
    }

    /// True when the failure is attributable to the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::Decode(_) | PipelineError::Inference(_))
    }
}
