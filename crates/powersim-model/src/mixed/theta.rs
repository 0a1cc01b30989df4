//! Covariance parameters of the random-effects terms.
//!
//! Each term with `k` coefficients per level owns a `k × k` lower-triangular
//! relative covariance factor `T`, so that the term's covariance is `σ² T Tᵀ`.
//! `θ` stores the lower triangles of all factors, column-major within each term:
//! for `k = 2` the order is `[T₀₀, T₁₀, T₁₁]`.

use nalgebra::DMatrix;

/// Diagonal factor entries below this are treated as zero variance.
pub const SINGULAR_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ThetaLayout {
    dims: Vec<usize>,
}

impl ThetaLayout {
    pub(crate) fn new<I>(dims: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        Self {
            dims: dims.into_iter().collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.dims.iter().map(|k| k * (k + 1) / 2).sum()
    }

    /// Identity factors for every term.
    pub(crate) fn initial(&self) -> Vec<f64> {
        self.positions()
            .map(|(_, row, col)| if row == col { 1.0 } else { 0.0 })
            .collect()
    }

    /// Indices into `θ` that hold a diagonal entry.
    pub(crate) fn diagonal_mask(&self) -> Vec<bool> {
        self.positions().map(|(_, row, col)| row == col).collect()
    }

    /// `(term, row, col)` of every `θ` entry, in storage order.
    fn positions(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.dims.iter().enumerate().flat_map(|(term, &k)| {
            (0..k).flat_map(move |col| (col..k).map(move |row| (term, row, col)))
        })
    }

    /// Lower-triangular factor `T` of every term.
    pub(crate) fn factors(&self, theta: &[f64]) -> Vec<DMatrix<f64>> {
        let mut factors = self
            .dims
            .iter()
            .map(|&k| DMatrix::zeros(k, k))
            .collect::<Vec<_>>();
        for ((term, row, col), &value) in self.positions().zip(theta) {
            factors[term][(row, col)] = value;
        }
        factors
    }

    /// Flips the sign of every factor column whose diagonal entry is negative.
    ///
    /// `T Tᵀ` and therefore the deviance are unchanged, so the optimizer can
    /// search over unconstrained `θ` and the result is mapped back afterwards.
    pub(crate) fn canonicalize(&self, theta: &[f64]) -> Vec<f64> {
        let mut out = theta.to_vec();
        let mut start = 0;
        for &k in &self.dims {
            for col in 0..k {
                let len = k - col;
                if out[start] < 0.0 {
                    for value in &mut out[start..start + len] {
                        *value = -*value;
                    }
                }
                start += len;
            }
        }
        out
    }

    /// Whether any variance parameter sits on the zero boundary.
    pub(crate) fn is_singular(&self, theta: &[f64]) -> bool {
        self.positions()
            .zip(theta)
            .any(|((_, row, col), value)| row == col && value.abs() < SINGULAR_TOLERANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crossed_layout() {
        let layout = ThetaLayout::new([2, 1]);
        assert_eq!(layout.len(), 4);
        assert_eq!(layout.initial(), [1.0, 0.0, 1.0, 1.0]);
        assert_eq!(layout.diagonal_mask(), [true, false, true, true]);
    }

    #[test]
    fn test_factors_are_column_major() {
        let layout = ThetaLayout::new([2, 1]);
        let factors = layout.factors(&[1.5, 0.25, 0.5, 2.0]);
        assert_eq!(factors[0], DMatrix::from_row_slice(2, 2, &[1.5, 0.0, 0.25, 0.5]));
        assert_eq!(factors[1], DMatrix::from_element(1, 1, 2.0));
    }

    #[test]
    fn test_canonicalize_keeps_covariance() {
        let layout = ThetaLayout::new([2, 1]);
        let theta = [-1.5, 0.25, -0.5, -2.0];
        let canonical = layout.canonicalize(&theta);
        assert_eq!(canonical, [1.5, -0.25, 0.5, 2.0]);

        let before = layout.factors(&theta);
        let after = layout.factors(&canonical);
        for (t0, t1) in before.iter().zip(&after) {
            let diff = t0 * t0.transpose() - t1 * t1.transpose();
            assert!(diff.amax() < 1e-9);
        }
    }

    #[test]
    fn test_singular_checks_only_diagonal() {
        let layout = ThetaLayout::new([2, 1]);
        assert!(!layout.is_singular(&[1.0, 0.0, 1.0, 1.0]));
        assert!(layout.is_singular(&[1.0, 0.3, 5e-5, 1.0]));
        assert!(layout.is_singular(&[1.0, 0.3, 1.0, 0.0]));
    }
}
