use serde::{Serialize, Deserialize};
use std::ops::Add;

/// Dense row-major matrix of `f64`.
///
/// Used as the storage for grey-level co-occurrence tables, where the row
/// index is the reference pixel level and the column index the neighbour level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data
                .iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    /// Sum of every cell.
    pub fn sum(&self) -> f64 {
        self.data.iter().map(|row| row.iter().sum::<f64>()).sum()
    }

    /// Weighted sum `Σ m[i][j] · w(i, j)` over every cell.
    pub fn weighted_sum<F>(&self, weight: F) -> f64
    where
        F: Fn(usize, usize) -> f64,
    {
        let mut total = 0.0;
        for (i, row) in self.data.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                if v != 0.0 {
                    total += v * weight(i, j);
                }
            }
        }
        total
    }

    /// Returns true when `m[i][j] == m[j][i]` for every cell.
    pub fn is_symmetric(&self) -> bool {
        if self.rows != self.cols {
            return false;
        }
        (0..self.rows).all(|i| (0..i).all(|j| self.data[i][j] == self.data[j][i]))
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

/// Element-wise sum. Both operands must have the same shape.
impl Add for Matrix {
    type Output = Matrix;

    fn add(mut self, rhs: Self) -> Self::Output {
        debug_assert_eq!((self.rows, self.cols), (rhs.rows, rhs.cols), "matrix shapes differ");

        for (row, rhs_row) in self.data.iter_mut().zip(rhs.data) {
            for (v, r) in row.iter_mut().zip(rhs_row) {
                *v += r;
            }
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transpose_swaps_indices() {
        let mut m = Matrix::zeros(2, 3);
        m.data[0][2] = 5.0;
        let t = m.transpose();
        assert_eq!((t.rows, t.cols), (3, 2));
        assert_eq!(t.data[2][0], 5.0);
    }

    #[test]
    fn matrix_plus_transpose_is_symmetric() {
        let mut m = Matrix::zeros(3, 3);
        m.data[0][1] = 2.0;
        m.data[2][0] = 1.0;
        let s = m.clone() + m.transpose();
        assert!(s.is_symmetric());
        assert_eq!(s.sum(), 6.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "matrix shapes differ")]
    fn adding_mismatched_shapes_is_caught_in_debug_builds() {
        let _ = Matrix::zeros(2, 2) + Matrix::zeros(3, 2);
    }

    #[test]
    fn weighted_sum_applies_index_weight() {
        let mut m = Matrix::zeros(2, 2);
        m.data[0][1] = 0.5;
        m.data[1][1] = 0.5;
        let w = m.weighted_sum(|i, j| ((i as f64) - (j as f64)).powi(2));
        assert_eq!(w, 0.5);
    }
}
