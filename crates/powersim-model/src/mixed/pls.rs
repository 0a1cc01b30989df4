//! Penalized least squares for a fixed value of `θ`.
//!
//! With the relative covariance factor `Λ(θ)` the mixed model reduces to the
//! penalized system
//!
//! ```text
//! L Lᵀ      = Λᵀ Zᵀ Z Λ + I
//! L c_u     = Λᵀ Zᵀ y
//! L R_ZX    = Λᵀ Zᵀ X
//! L_X L_Xᵀ  = Xᵀ X − R_ZXᵀ R_ZX
//! L_X c_β   = Xᵀ y − R_ZXᵀ c_u
//! ```
//!
//! from which the penalized residual sum of squares is
//! `‖y‖² − ‖c_u‖² − ‖c_β‖²` and the profiled deviance follows in closed form.
//! `Z` only enters through cross products, which are computed once per dataset.

use std::f64::consts::TAU;

use nalgebra::{Cholesky, DMatrix, DVector, Dyn};

use super::theta::ThetaLayout;
use crate::{FitError, frame::ModelFrame};

#[derive(Debug, Clone)]
pub(crate) struct CrossProducts {
    ztz: DMatrix<f64>,
    /// `Zᵀ [X y]`, the last column belonging to the response
    ztxy: DMatrix<f64>,
    xtx: DMatrix<f64>,
    xty: DVector<f64>,
    yty: f64,
    /// Term, first column and width of every level block of `Λ`
    level_blocks: Vec<(usize, usize, usize)>,
    n_obs: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct PlsSolution {
    pub(crate) deviance: f64,
    pub(crate) pwrss: f64,
    cbeta: DVector<f64>,
    lx: Cholesky<f64, Dyn>,
}

impl PlsSolution {
    pub(crate) fn beta(&self) -> DVector<f64> {
        let mut beta = self.cbeta.clone();
        self.lx.l_dirty().tr_solve_lower_triangular_mut(&mut beta);
        beta
    }

    /// `(Xᵀ X − R_ZXᵀ R_ZX)⁻¹`, the fixed-effect covariance up to `σ²`.
    pub(crate) fn unscaled_covariance(&self) -> DMatrix<f64> {
        self.lx.inverse()
    }
}

impl CrossProducts {
    pub(crate) fn new(frame: &ModelFrame) -> Self {
        let q = frame.n_random;
        let p = frame.n_fixed();

        let mut ztz = DMatrix::zeros(q, q);
        let mut ztxy = DMatrix::zeros(q, p + 1);
        for (i, row) in frame.z_rows.iter().enumerate() {
            for &(a, va) in row {
                for &(b, vb) in row {
                    ztz[(a, b)] += va * vb;
                }
                for j in 0..p {
                    ztxy[(a, j)] += va * frame.x[(i, j)];
                }
                ztxy[(a, p)] += va * frame.y[i];
            }
        }

        let level_blocks = frame
            .blocks
            .iter()
            .enumerate()
            .flat_map(|(term, block)| {
                let k = block.term.dim();
                (0..block.n_levels).map(move |level| (term, block.offset + level * k, k))
            })
            .collect();

        Self {
            ztz,
            ztxy,
            xtx: frame.x.tr_mul(&frame.x),
            xty: frame.x.tr_mul(&frame.y),
            yty: frame.y.norm_squared(),
            level_blocks,
            n_obs: frame.n_obs(),
        }
    }

    pub(crate) fn n_obs(&self) -> usize {
        self.n_obs
    }

    pub(crate) fn n_fixed(&self) -> usize {
        self.xtx.ncols()
    }

    /// `M Λ`, applied block by block.
    fn mul_lambda(&self, m: &mut DMatrix<f64>, factors: &[DMatrix<f64>]) {
        for &(term, col, k) in &self.level_blocks {
            let scaled = m.columns(col, k) * &factors[term];
            m.columns_mut(col, k).copy_from(&scaled);
        }
    }

    /// `Λᵀ M`, applied block by block.
    fn tr_mul_lambda(&self, m: &mut DMatrix<f64>, factors: &[DMatrix<f64>]) {
        for &(term, row, k) in &self.level_blocks {
            let scaled = factors[term].tr_mul(&m.rows(row, k));
            m.rows_mut(row, k).copy_from(&scaled);
        }
    }

    pub(crate) fn solve(
        &self,
        layout: &ThetaLayout,
        theta: &[f64],
        reml: bool,
    ) -> Result<PlsSolution, FitError> {
        let factors = layout.factors(theta);
        let p = self.n_fixed();

        let mut a = self.ztz.clone();
        self.mul_lambda(&mut a, &factors);
        self.tr_mul_lambda(&mut a, &factors);
        for i in 0..a.nrows() {
            a[(i, i)] += 1.0;
        }
        let l = Cholesky::new(a).ok_or(FitError::NotPositiveDefinite)?;

        let mut r = self.ztxy.clone();
        self.tr_mul_lambda(&mut r, &factors);
        if !l.l_dirty().solve_lower_triangular_mut(&mut r) {
            return Err(FitError::NotPositiveDefinite);
        }
        let rzx = r.columns(0, p);
        let cu = r.column(p);

        let schur = &self.xtx - rzx.tr_mul(&rzx);
        let lx = Cholesky::new(schur).ok_or(FitError::RankDeficient)?;
        let mut cbeta = &self.xty - rzx.tr_mul(&cu);
        if !lx.l_dirty().solve_lower_triangular_mut(&mut cbeta) {
            return Err(FitError::RankDeficient);
        }

        let pwrss = self.yty - cu.norm_squared() - cbeta.norm_squared();
        let log_det_l = 2.0 * l.l_dirty().diagonal().iter().map(|d| d.ln()).sum::<f64>();
        let log_det_lx = 2.0 * lx.l_dirty().diagonal().iter().map(|d| d.ln()).sum::<f64>();

        #[expect(clippy::cast_precision_loss)]
        let n = self.n_obs as f64;
        let deviance = if reml {
            #[expect(clippy::cast_precision_loss)]
            let df = n - p as f64;
            log_det_l + log_det_lx + df * (1.0 + (TAU * pwrss / df).ln())
        } else {
            log_det_l + n * (1.0 + (TAU * pwrss / n).ln())
        };

        Ok(PlsSolution {
            deviance,
            pwrss,
            cbeta,
            lx,
        })
    }
}
