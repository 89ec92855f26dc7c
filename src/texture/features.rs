use image::GrayImage;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::error::ExtractionError;
use crate::texture::glcm::{Angle, CooccurrenceMatrix};

/// Angle-averaged GLCM texture descriptor; the classifier's only input.
///
/// Field order is the order the model was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub contrast: f64,
    pub correlation: f64,
    pub energy: f64,
    pub homogeneity: f64,
}

impl FeatureVector {
    pub const LEN: usize = 4;
    pub const NAMES: [&'static str; 4] = ["contrast", "correlation", "energy", "homogeneity"];

    pub fn to_array(&self) -> [f64; 4] {
        [self.contrast, self.correlation, self.energy, self.homogeneity]
    }

    /// Builds a vector from exactly four values in training order.
    pub fn from_slice(values: &[f64]) -> Option<FeatureVector> {
        match values {
            &[contrast, correlation, energy, homogeneity] => Some(FeatureVector {
                contrast,
                correlation,
                energy,
                homogeneity,
            }),
            _ => None,
        }
    }

    fn of_matrix(m: &CooccurrenceMatrix) -> FeatureVector {
        FeatureVector {
            contrast: m.contrast(),
            correlation: m.correlation(),
            energy: m.energy(),
            homogeneity: m.homogeneity(),
        }
    }
}

/// Statistics for each orientation before averaging.
///
/// An orientation with no neighbour pairs (a single row or column) keeps an
/// all-zero table: contrast, energy and homogeneity of 0 and the zero-variance
/// correlation. It still counts towards the mean.
pub fn angle_features(image: &GrayImage) -> Vec<(Angle, FeatureVector)> {
    Angle::ALL
        .iter()
        .map(|&angle| {
            let m = CooccurrenceMatrix::compute(image, angle);
            (angle, FeatureVector::of_matrix(&m))
        })
        .collect()
}

/// Extracts the angle-averaged texture descriptor from an 8-bit grayscale grid.
///
/// Distance and orientations are fixed; they must match what the classifier
/// was trained on.
pub fn extract_features(image: &GrayImage) -> Result<FeatureVector, ExtractionError> {
    let per_angle = angle_features(image);
    let n = per_angle.len() as f64;

    let mut sums = [0.0f64; FeatureVector::LEN];
    for (_, fv) in &per_angle {
        for (acc, v) in sums.iter_mut().zip(fv.to_array()) {
            *acc += v;
        }
    }

    for (name, total) in FeatureVector::NAMES.iter().zip(sums.iter()) {
        if !total.is_finite() {
            return Err(ExtractionError::NonFinite { feature: *name });
        }
    }

    let features = FeatureVector {
        contrast: sums[0] / n,
        correlation: sums[1] / n,
        energy: sums[2] / n,
        homogeneity: sums[3] / n,
    };
    debug!(
        contrast = features.contrast,
        correlation = features.correlation,
        energy = features.energy,
        homogeneity = features.homogeneity,
        "extracted GLCM features"
    );
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    #[test]
    fn uniform_image_yields_degenerate_texture() {
        let img = GrayImage::from_pixel(100, 100, Luma([128]));
        let f = extract_features(&img).unwrap();
        assert_eq!(f.contrast, 0.0);
        assert_eq!(f.homogeneity, 1.0);
        assert_eq!(f.energy, 1.0);
        assert!(f.correlation.is_finite());
        assert_eq!(f.correlation, crate::texture::glcm::ZERO_VARIANCE_CORRELATION);
    }

    #[test]
    fn random_noise_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..5 {
            let w = rng.gen_range(2..40);
            let h = rng.gen_range(2..40);
            let img = GrayImage::from_fn(w, h, |_, _| Luma([rng.gen::<u8>()]));
            let f = extract_features(&img).unwrap();
            assert!(f.contrast >= 0.0);
            assert!((0.0..=1.0).contains(&f.energy), "energy {}", f.energy);
            assert!((0.0..=1.0).contains(&f.homogeneity), "homogeneity {}", f.homogeneity);
            assert!(f.correlation >= -1.0 - 1e-9 && f.correlation <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let img = GrayImage::from_fn(17, 23, |x, y| Luma([((x * 13) ^ (y * 7)) as u8]));
        let a = extract_features(&img).unwrap();
        let b = extract_features(&img).unwrap();
        assert_eq!(a.to_array().map(f64::to_bits), b.to_array().map(f64::to_bits));
    }

    #[test]
    fn checkerboard_averages_horizontal_and_diagonal_extremes() {
        let img = GrayImage::from_fn(20, 20, |x, y| Luma([if (x + y) % 2 == 0 { 0 } else { 255 }]));
        let per_angle = angle_features(&img);
        let straight: Vec<_> = per_angle.iter()
            .filter(|(a, _)| matches!(a, Angle::Deg0 | Angle::Deg90))
            .collect();
        for (_, f) in straight {
            assert_eq!(f.contrast, 65025.0);
            assert!(f.homogeneity < 1e-4);
        }

        let f = extract_features(&img).unwrap();
        assert_eq!(f.contrast, 65025.0 / 2.0);
        assert!(f.correlation.abs() < 1e-9);
    }

    #[test]
    fn single_row_keeps_horizontal_texture() {
        let img = GrayImage::from_fn(10, 1, |x, _| Luma([(x * 20) as u8]));
        let per_angle = angle_features(&img);
        let (_, horizontal) = per_angle[0];
        assert!((horizontal.contrast - 400.0).abs() < 1e-9);
        assert!(horizontal.correlation > 0.9 && horizontal.correlation < 1.0);

        for (angle, f) in &per_angle[1..] {
            assert_eq!(f.contrast, 0.0, "{:?}", angle);
            assert_eq!(f.energy, 0.0, "{:?}", angle);
            assert_eq!(f.homogeneity, 0.0, "{:?}", angle);
            assert_eq!(f.correlation, crate::texture::glcm::ZERO_VARIANCE_CORRELATION);
        }

        let f = extract_features(&img).unwrap();
        assert!((f.contrast - 100.0).abs() < 1e-9);
        assert!((f.correlation - (horizontal.correlation + 3.0) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn single_pixel_has_no_pairs_but_still_extracts() {
        let f = extract_features(&GrayImage::from_pixel(1, 1, Luma([200]))).unwrap();
        assert_eq!(f.contrast, 0.0);
        assert_eq!(f.energy, 0.0);
        assert_eq!(f.homogeneity, 0.0);
        assert_eq!(f.correlation, crate::texture::glcm::ZERO_VARIANCE_CORRELATION);
    }

    #[test]
    fn from_slice_requires_exactly_four() {
        assert!(FeatureVector::from_slice(&[1.0, 2.0, 3.0]).is_none());
        let f = FeatureVector::from_slice(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(f.homogeneity, 4.0);
    }
}
