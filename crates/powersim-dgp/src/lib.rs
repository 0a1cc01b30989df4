//! Data-generating processes for Monte Carlo power simulation.
//!
//! Every simulated dataset is built from population parameters and random draws
//! following the multilevel decomposition
//!
//! ```text
//! response = fixed part + subject effects + item effects + residual noise
//! ```
//!
//! Three designs are provided in [`design`]:
//!
//! - [`OneSampleDgp`] - one observation per subject, no random factor
//! - [`SingleFactorDgp`] - repeated trials per subject with a random subject intercept
//! - [`CrossedDgp`] - subjects crossed with items, random subject intercept and slope,
//!   random item intercept, deviation-coded predictor
//!
//! All randomness comes from a generator passed in by the caller, so a dataset is a
//! deterministic function of the generator state. [`SimSeed`] builds reproducible
//! generators.

pub use self::{dataset::*, design::*, effects::*, seed::*};

pub mod dataset;
pub mod design;
pub mod effects;
pub mod seed;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum DgpError {
    #[display("invalid normal distribution")]
    Normal(rand_distr::NormalError),
    #[display("column `{column}` has {actual} rows, expected {expected}")]
    ColumnLength {
        column: &'static str,
        expected: usize,
        actual: usize,
    },
    #[display(
        "covariance is not positive semi-definite (sd = {sd_a}, {sd_b}, correlation = {correlation})"
    )]
    Covariance {
        sd_a: f64,
        sd_b: f64,
        correlation: f64,
    },
}

impl From<rand_distr::NormalError> for DgpError {
    fn from(err: rand_distr::NormalError) -> Self {
        Self::Normal(err)
    }
}
