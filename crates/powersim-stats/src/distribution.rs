//! Reference distributions for turning test statistics into p-values.
//!
//! Mixed-model fixed effects are tested with a Wald statistic treated as standard
//! normal; ordinary least-squares coefficients use Student's t with the residual
//! degrees of freedom.

use std::f64::consts::SQRT_2;

use statrs::{
    distribution::{ContinuousCDF as _, StudentsT},
    function::erf,
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("invalid degrees of freedom for Student's t: {df}")]
pub struct DegreesOfFreedomError {
    pub df: f64,
}

/// Standard normal cumulative distribution function `Φ(x)`.
///
/// ```
/// # use powersim_stats::distribution::standard_normal_cdf;
/// assert_eq!(standard_normal_cdf(0.0), 0.5);
/// assert!((standard_normal_cdf(1.0) - 0.841_344_746_068_543).abs() < 1e-9);
/// ```
#[must_use]
pub fn standard_normal_cdf(x: f64) -> f64 {
    0.5 * erf::erfc(-x / SQRT_2)
}

/// Two-sided p-value of a Wald statistic, `2 × (1 − Φ(|z|))`.
///
/// Evaluated as `2 × Φ(−|z|)`, which is the same quantity without losing the
/// upper tail to cancellation for large `|z|`.
#[must_use]
pub fn wald_p_value(z: f64) -> f64 {
    2.0 * standard_normal_cdf(-z.abs())
}

/// Two-sided p-value of a t statistic with `df` degrees of freedom.
pub fn student_t_p_value(t: f64, df: f64) -> Result<f64, DegreesOfFreedomError> {
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|_| DegreesOfFreedomError { df })?;
    Ok(2.0 * dist.cdf(-t.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_cdf_is_symmetric() {
        for x in [0.1, 0.5, 1.3, 2.7, 4.0] {
            let sum = standard_normal_cdf(x) + standard_normal_cdf(-x);
            assert!((sum - 1.0).abs() < 1e-9, "x = {x}");
        }
    }

    #[test]
    fn test_wald_p_value_known_points() {
        assert!((wald_p_value(0.0) - 1.0).abs() < 1e-9);
        assert!((wald_p_value(1.959_963_984_540_054) - 0.05).abs() < 1e-9);
        assert!((wald_p_value(-2.575_829_303_548_901) - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_wald_p_value_keeps_tiny_tails() {
        let p = wald_p_value(10.0);
        assert!(p > 0.0);
        assert!(p < 1e-20);
    }

    #[test]
    fn test_student_t_p_value_matches_tables() {
        // t(0.975, 19) = 2.093024
        let p = student_t_p_value(2.093_024_054_408_263, 19.0).unwrap();
        assert!((p - 0.05).abs() < 1e-9);
        // heavy tails: same statistic is less significant with fewer df
        let p_small_df = student_t_p_value(2.093_024_054_408_263, 3.0).unwrap();
        assert!(p_small_df > p);
    }

    #[test]
    fn test_student_t_rejects_zero_df() {
        let err = student_t_p_value(1.0, 0.0).unwrap_err();
        assert_eq!(err.df, 0.0);
    }
}
