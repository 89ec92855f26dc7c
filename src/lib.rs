pub mod math;
pub mod error;
pub mod preprocess;
pub mod texture;
pub mod classifier;
pub mod pipeline;
pub mod logbook;
pub mod telemetry;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use error::{ArtifactError, DecodeError, ExtractionError, InferenceError, LogError, PipelineError};
pub use preprocess::normalizer::decode_grayscale;
pub use texture::features::{extract_features, FeatureVector};
pub use classifier::{classify, Classification, ClassProbability, Classifier, GaussianNb, ModelMetadata};
pub use pipeline::{Prediction, PredictionInput, PredictionOutput, PredictionResult, PredictionService};
pub use logbook::{LogEntry, LogStats, LogStore};
