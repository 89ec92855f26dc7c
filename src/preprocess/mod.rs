pub mod normalizer;

pub use normalizer::{decode_grayscale, from_intensities, to_grayscale, LUMA_WEIGHTS};
