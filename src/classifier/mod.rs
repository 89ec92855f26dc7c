pub mod adapter;
pub mod gaussian_nb;
pub mod metadata;

pub use adapter::{Classifier, Classification, ClassProbability, classify, argmax};
pub use gaussian_nb::GaussianNb;
pub use metadata::ModelMetadata;
