//! Monte Carlo power simulation.
//!
//! This crate drives the simulation pipeline: for every point of a parameter sweep
//! it generates many synthetic datasets, fits the matching model to each one,
//! extracts the statistics of the tested coefficient and reduces them into a
//! power estimate.
//!
//! # Pipeline
//!
//! ```text
//! Sweep (one row per parameter setting)
//!     ↓ for each setting
//! run_setting (N Monte Carlo trials)
//!     ↓ for each trial
//! DataGenerator::generate (powersim-dgp)
//!     ↓ dataset
//! fit, inside capture_diagnostics (powersim-model)
//!     ↓ fitted model
//! TrialStats::extract (powersim-model)
//!     ↓ per-trial record
//! PowerSummary::from_trials
//! ```
//!
//! # Aggregation Policy
//!
//! Power is the share of *all* trials whose p-value is below `α`. Singular and
//! non-converged fits are counted in their own columns but are not excluded from
//! the power calculation.
//!
//! # Reproducibility
//!
//! [`Sweep::run`] advances a single generator, seeded once, through every draw of
//! the whole sweep. The complete sweep is reproducible from its seed, while a
//! single setting depends on everything drawn before it.
//!
//! [`Sweep::run_parallel`] first derives one child seed per setting from the
//! master generator, in setting order, and then runs the settings on worker
//! threads. Its results are reproducible for a given seed regardless of the number
//! of workers, but differ from those of the sequential stream.
//!
//! # Failure Handling
//!
//! Fit-quality problems are never failures. Any other error in any trial (an
//! invalid DGP parameter, a model that cannot be fitted at all) aborts the sweep.
//!
//! # Example
//!
//! ```
//! use powersim_dgp::{OneSampleDgp, SimSeed};
//! use powersim_sim::{Design, ParameterSetting, Sweep};
//!
//! let settings = [0.0, 1.0]
//!     .into_iter()
//!     .enumerate()
//!     .map(|(id, effect)| ParameterSetting {
//!         id,
//!         design: Design::OneSample(OneSampleDgp { effect, n_subjects: 20, sd: 1.0 }),
//!     })
//!     .collect();
//! let sweep = Sweep { settings, runs: 50, alpha: 0.05, keep_trials: false };
//!
//! let results = sweep.run(SimSeed::from_u64(1451)).unwrap();
//! assert_eq!(results.len(), 2);
//! assert!(results[1].summary.power > results[0].summary.power);
//! ```

use powersim_dgp::DgpError;
use powersim_model::{ExtractError, FitError};

pub use self::{aggregate::*, setting::*, sweep::*, trial::*};

pub mod aggregate;
pub mod setting;
pub mod sweep;
pub mod trial;

/// Failure of a single Monte Carlo trial.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum TrialError {
    #[display("data generation failed")]
    Dgp(DgpError),
    #[display("model fitting failed")]
    Fit(FitError),
    #[display("statistic extraction failed")]
    Extract(ExtractError),
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SimError {
    #[display("at least one Monte Carlo run per setting is required")]
    NoRuns,
    #[display("setting {setting}, trial {trial} failed")]
    Trial {
        setting: usize,
        trial: usize,
        source: TrialError,
    },
}
