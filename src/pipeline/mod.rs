pub mod result;
pub mod service;

pub use result::{Prediction, PredictionResult};
pub use service::{extract_from_bytes, PredictionInput, PredictionOutput, PredictionService};
