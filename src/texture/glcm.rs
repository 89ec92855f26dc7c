/// Grey-level co-occurrence matrices (GLCM).
///
/// One matrix per orientation at pixel distance 1. Each is made symmetric by
/// adding its transpose and normalized so its cells sum to 1. The four
/// Haralick-style statistics are computed from the normalized table.

use image::GrayImage;
use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;

/// Number of grey levels in an 8-bit image.
pub const LEVELS: usize = 256;

/// Pixel distance between a reference pixel and its neighbour.
pub const DISTANCE: isize = 1;

/// Correlation reported when either marginal has zero variance.
pub const ZERO_VARIANCE_CORRELATION: f64 = 1.0;

/// Standard deviations below this are treated as zero.
const STD_EPS: f64 = 1e-15;

/// Neighbour orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Angle {
    Deg0,
    Deg45,
    Deg90,
    Deg135,
}

impl Angle {
    pub const ALL: [Angle; 4] = [Angle::Deg0, Angle::Deg45, Angle::Deg90, Angle::Deg135];

    pub fn radians(self) -> f64 {
        use std::f64::consts::PI;
        match self {
            Angle::Deg0   => 0.0,
            Angle::Deg45  => PI / 4.0,
            Angle::Deg90  => PI / 2.0,
            Angle::Deg135 => 3.0 * PI / 4.0,
        }
    }

    /// `(row, col)` offset of the neighbour: `(round(sin θ·d), round(cos θ·d))`.
    pub fn offset(self) -> (isize, isize) {
        let theta = self.radians();
        let d = DISTANCE as f64;
        ((theta.sin() * d).round() as isize, (theta.cos() * d).round() as isize)
    }
}

/// A symmetric, normalized co-occurrence table for one orientation.
#[derive(Debug, Clone)]
pub struct CooccurrenceMatrix {
    pub angle: Angle,
    /// Number of (pixel, neighbour) pairs counted before symmetrization.
    pub pairs: usize,
    pub table: Matrix,
}

impl CooccurrenceMatrix {
    /// Counts neighbour pairs of `image` at `angle`, symmetrizes and normalizes.
    pub fn compute(image: &GrayImage, angle: Angle) -> CooccurrenceMatrix {
        let mut counts = Matrix::zeros(LEVELS, LEVELS);
        let (width, height) = (image.width() as isize, image.height() as isize);
        let (dr, dc) = angle.offset();
        let mut pairs = 0usize;

        for r in 0..height {
            let nr = r + dr;
            if nr < 0 || nr >= height {
                continue;
            }
            for c in 0..width {
                let nc = c + dc;
                if nc < 0 || nc >= width {
                    continue;
                }
                let i = image.get_pixel(c as u32, r as u32).0[0] as usize;
                let j = image.get_pixel(nc as u32, nr as u32).0[0] as usize;
                counts.data[i][j] += 1.0;
                pairs += 1;
            }
        }

        let symmetric = counts.transpose() + counts;
        let total = symmetric.sum();
        let table = if total > 0.0 {
            symmetric.map(|v| v / total)
        } else {
            symmetric
        };

        CooccurrenceMatrix { angle, pairs, table }
    }

    /// `Σ P(i,j)·(i−j)²`
    pub fn contrast(&self) -> f64 {
        self.table.weighted_sum(|i, j| {
            let d = i as f64 - j as f64;
            d * d
        })
    }

    /// `Σ P(i,j) / (1 + (i−j)²)`
    pub fn homogeneity(&self) -> f64 {
        self.table.weighted_sum(|i, j| {
            let d = i as f64 - j as f64;
            1.0 / (1.0 + d * d)
        })
    }

    /// `sqrt(Σ P(i,j)²)`
    pub fn energy(&self) -> f64 {
        self.table.weighted_sum(|i, j| self.table.data[i][j]).sqrt()
    }

    /// Pearson correlation between reference and neighbour levels.
    ///
    /// Returns [`ZERO_VARIANCE_CORRELATION`] when either marginal is constant.
    pub fn correlation(&self) -> f64 {
        let mean_i = self.table.weighted_sum(|i, _| i as f64);
        let mean_j = self.table.weighted_sum(|_, j| j as f64);
        let std_i = self.table.weighted_sum(|i, _| (i as f64 - mean_i).powi(2)).sqrt();
        let std_j = self.table.weighted_sum(|_, j| (j as f64 - mean_j).powi(2)).sqrt();

        if std_i < STD_EPS || std_j < STD_EPS {
            return ZERO_VARIANCE_CORRELATION;
        }

        let cov = self.table.weighted_sum(|i, j| (i as f64 - mean_i) * (j as f64 - mean_j));
        cov / (std_i * std_j)
    }
}
