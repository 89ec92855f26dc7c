pub mod glcm;
pub mod features;

pub use glcm::{Angle, CooccurrenceMatrix};
pub use features::{FeatureVector, extract_features, angle_features};
