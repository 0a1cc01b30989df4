//! Model fitting for simulated datasets.
//!
//! A [`Formula`] names the fixed and random terms. [`fit`] dispatches to ordinary
//! least squares when there are no random terms and to a linear mixed model
//! estimated by REML otherwise. Both return a [`FittedModel`] handle from which
//! [`TrialStats::extract`] pulls the per-trial statistics.
//!
//! ```
//! use powersim_dgp::{DataGenerator as _, OneSampleDgp, SimSeed};
//! use powersim_model::{Formula, TrialStats, capture_diagnostics, fit};
//!
//! let dgp = OneSampleDgp { effect: 0.5, n_subjects: 30, sd: 1.0 };
//! let data = dgp.generate(&mut SimSeed::from_u64(7).rng()).unwrap();
//!
//! let (model, diagnostics) = capture_diagnostics(|sink| fit(&data, &Formula::one_sample(), sink));
//! let stats = TrialStats::extract(model.unwrap().as_ref(), "(Intercept)").unwrap();
//! assert!(stats.converged && !stats.is_singular);
//! assert!(diagnostics.is_empty());
//! ```

use powersim_dgp::Dataset;
use powersim_stats::distribution::DegreesOfFreedomError;

pub use self::{
    diagnostics::{Condition, ConditionKind, Diagnostics, capture_diagnostics},
    extract::{ExtractError, TrialStats},
    formula::{FixedTerm, Formula, Grouping, RandomTerm},
    linear::{LinearModel, LinearModelFitter},
    mixed::{MixedModel, MixedModelFitter},
    model::{FittedModel, OptimizerInfo, TidyRow, VarianceComponent},
};

pub mod diagnostics;
pub mod extract;
pub mod formula;
mod frame;
pub mod linear;
pub mod mixed;
pub mod model;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum FitError {
    #[display("{n} observations are too few for {p} fixed effects")]
    TooFewObservations { n: usize, p: usize },
    #[display("dataset has no `{column}` column")]
    MissingColumn { column: &'static str },
    #[display(
        "number of levels of `{grouping}` ({n_levels}) must be at least 2 and less than the number of observations ({n_obs})"
    )]
    GroupingLevels {
        grouping: &'static str,
        n_levels: usize,
        n_obs: usize,
    },
    #[display("`{formula}` cannot be fitted by this model")]
    UnsupportedFormula { formula: String },
    #[display("fixed-effects model matrix is rank deficient")]
    RankDeficient,
    #[display("penalized system is not positive definite")]
    NotPositiveDefinite,
    #[display("invalid reference distribution")]
    Distribution(DegreesOfFreedomError),
    #[display("optimizer failed: {message}")]
    Optimizer { message: String },
}

/// Estimates a model of one formula family on one dataset.
///
/// Non-fatal conditions go to `sink`; only failures that leave no usable model are
/// returned as errors.
pub trait ModelFitter {
    fn fit(
        &self,
        data: &Dataset,
        formula: &Formula,
        sink: &mut Diagnostics,
    ) -> Result<Box<dyn FittedModel>, FitError>;
}

/// Fits `formula` to `data` with the default fitter for its family.
pub fn fit(
    data: &Dataset,
    formula: &Formula,
    sink: &mut Diagnostics,
) -> Result<Box<dyn FittedModel>, FitError> {
    if formula.is_mixed() {
        MixedModelFitter::default().fit(data, formula, sink)
    } else {
        LinearModelFitter.fit(data, formula, sink)
    }
}
