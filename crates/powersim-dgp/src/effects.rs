//! Per-unit random-effect tables.
//!
//! Subjects carry a random intercept and, in the crossed design, a random slope
//! drawn jointly with it from a zero-mean bivariate normal. Items carry an
//! independent random intercept and the deviation-coded condition they belong to.
//!
//! Tables are column-oriented and check that every column has the same number of
//! rows on construction, the way a data frame would. A shape mismatch is therefore
//! reported where the table is assembled, not by the parameter structs.

use std::iter;

use rand::Rng;
use rand_distr::{Distribution as _, Normal, NormalError, StandardNormal};

use crate::DgpError;

/// Lower Cholesky factor of a 2×2 covariance matrix given as standard deviations
/// and a correlation: `[l11, l21, l22]`.
///
/// Zero standard deviations are allowed (the factor is then degenerate but still
/// valid); a negative or non-finite sd, or a correlation outside `[-1, 1]`, is not.
pub fn bivariate_factor(sd_a: f64, sd_b: f64, correlation: f64) -> Result<[f64; 3], DgpError> {
    let valid_sd = |sd: f64| sd.is_finite() && sd >= 0.0;
    if !valid_sd(sd_a) || !valid_sd(sd_b) || !(-1.0..=1.0).contains(&correlation) {
        return Err(DgpError::Covariance {
            sd_a,
            sd_b,
            correlation,
        });
    }
    Ok([
        sd_a,
        correlation * sd_b,
        sd_b * (1.0 - correlation * correlation).sqrt(),
    ])
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectEffects {
    ids: Vec<u32>,
    intercepts: Vec<f64>,
    slopes: Vec<f64>,
}

impl SubjectEffects {
    pub fn from_columns(
        ids: Vec<u32>,
        intercepts: Vec<f64>,
        slopes: Vec<f64>,
    ) -> Result<Self, DgpError> {
        check_column("intercept", ids.len(), intercepts.len())?;
        check_column("slope", ids.len(), slopes.len())?;
        Ok(Self {
            ids,
            intercepts,
            slopes,
        })
    }

    /// Draws independent random intercepts `S_0s ~ N(0, sd)`; slopes are zero.
    pub fn draw_intercepts<R>(n_subjects: usize, sd: f64, rng: &mut R) -> Result<Self, DgpError>
    where
        R: Rng + ?Sized,
    {
        let normal = centered_normal(sd)?;
        let intercepts = (0..n_subjects).map(|_| normal.sample(rng)).collect();
        Self::from_columns(unit_ids(n_subjects), intercepts, vec![0.0; n_subjects])
    }

    /// Draws `(S_0s, S_1s)` pairs from a bivariate normal with the given standard
    /// deviations and correlation.
    pub fn draw_correlated<R>(
        n_subjects: usize,
        intercept_sd: f64,
        slope_sd: f64,
        correlation: f64,
        rng: &mut R,
    ) -> Result<Self, DgpError>
    where
        R: Rng + ?Sized,
    {
        let [l11, l21, l22] = bivariate_factor(intercept_sd, slope_sd, correlation)?;
        let mut intercepts = Vec::with_capacity(n_subjects);
        let mut slopes = Vec::with_capacity(n_subjects);
        for _ in 0..n_subjects {
            let z0: f64 = StandardNormal.sample(rng);
            let z1: f64 = StandardNormal.sample(rng);
            intercepts.push(l11 * z0);
            slopes.push(l21 * z0 + l22 * z1);
        }
        Self::from_columns(unit_ids(n_subjects), intercepts, slopes)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterates `(id, intercept, slope)` rows.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64, f64)> + '_ {
        iter::zip(&self.ids, iter::zip(&self.intercepts, &self.slopes))
            .map(|(&id, (&intercept, &slope))| (id, intercept, slope))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemEffects {
    ids: Vec<u32>,
    intercepts: Vec<f64>,
    conditions: Vec<f64>,
}

impl ItemEffects {
    pub fn from_columns(
        ids: Vec<u32>,
        intercepts: Vec<f64>,
        conditions: Vec<f64>,
    ) -> Result<Self, DgpError> {
        check_column("intercept", ids.len(), intercepts.len())?;
        check_column("condition", ids.len(), conditions.len())?;
        Ok(Self {
            ids,
            intercepts,
            conditions,
        })
    }

    /// Draws item intercepts `I_0i ~ N(0, sd)` and assigns the first half of the
    /// items to condition `-0.5` and the second half to `+0.5`.
    ///
    /// The condition column holds `2 × (n_items / 2)` entries, so an odd item count
    /// fails table construction.
    pub fn draw_balanced<R>(n_items: usize, sd: f64, rng: &mut R) -> Result<Self, DgpError>
    where
        R: Rng + ?Sized,
    {
        let normal = centered_normal(sd)?;
        let intercepts = (0..n_items).map(|_| normal.sample(rng)).collect();
        let half = n_items / 2;
        let conditions = iter::repeat_n(-0.5, half)
            .chain(iter::repeat_n(0.5, half))
            .collect();
        Self::from_columns(unit_ids(n_items), intercepts, conditions)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterates `(id, intercept, condition)` rows.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64, f64)> + '_ {
        iter::zip(&self.ids, iter::zip(&self.intercepts, &self.conditions))
            .map(|(&id, (&intercept, &condition))| (id, intercept, condition))
    }
}

/// `N(0, sd)` for a non-negative, finite `sd`.
pub(crate) fn centered_normal(sd: f64) -> Result<Normal<f64>, DgpError> {
    if !(sd.is_finite() && sd >= 0.0) {
        return Err(DgpError::Normal(NormalError::BadVariance));
    }
    Ok(Normal::new(0.0, sd)?)
}

pub(crate) fn check_column(
    column: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), DgpError> {
    if expected == actual {
        Ok(())
    } else {
        Err(DgpError::ColumnLength {
            column,
            expected,
            actual,
        })
    }
}

#[expect(clippy::cast_possible_truncation)]
fn unit_ids(n: usize) -> Vec<u32> {
    (1..=n).map(|id| id as u32).collect()
}
