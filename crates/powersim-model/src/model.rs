use std::fmt;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// What the optimizer recorded while fitting.
///
/// `messages` holds the optimizer's complaints (iteration limit, failed gradient
/// check, degenerate Hessian). An empty list is what [`FittedModel::converged`]
/// reads as convergence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizerInfo {
    pub optimizer: String,
    pub iterations: u64,
    pub evaluations: usize,
    pub messages: Vec<String>,
}

/// A coefficient row as a generic "tidy" extractor reports it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TidyRow {
    pub estimate: f64,
    pub std_error: f64,
    pub statistic: f64,
    pub p_value: f64,
}

/// Standard deviations and correlations of one random-effects term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceComponent {
    pub group: String,
    pub names: Vec<String>,
    pub std_devs: Vec<f64>,
    /// Lower-triangle correlations, row by row (`[r10, r20, r21, ...]`)
    pub correlations: Vec<f64>,
}

/// Interface of a fitted model, linear or mixed.
///
/// The handle belongs to the trial that fitted it and is dropped once the
/// per-trial statistics have been extracted.
pub trait FittedModel: fmt::Debug {
    fn coefficient_names(&self) -> &[String];

    fn coefficients(&self) -> &DVector<f64>;

    /// Covariance matrix of the fixed-effect estimates.
    fn covariance(&self) -> &DMatrix<f64>;

    /// Residual standard deviation.
    fn sigma(&self) -> f64;

    /// Whether the estimated random-effects covariance is degenerate.
    fn is_singular(&self) -> bool;

    fn optimizer_info(&self) -> &OptimizerInfo;

    fn variance_components(&self) -> &[VarianceComponent] {
        &[]
    }

    /// Ready-made coefficient row, for models with an exact reference
    /// distribution. Mixed models return `None` and are tested with a Wald
    /// statistic instead.
    fn tidy(&self, _name: &str) -> Option<TidyRow> {
        None
    }

    fn coefficient_index(&self, name: &str) -> Option<usize> {
        self.coefficient_names().iter().position(|n| n == name)
    }

    fn estimate(&self, name: &str) -> Option<f64> {
        self.coefficient_index(name)
            .map(|index| self.coefficients()[index])
    }

    /// Convergence heuristic: the fit is taken as converged when the optimizer
    /// recorded no complaint.
    ///
    /// This is an approximation, not a verified convergence check. It is only as
    /// good as the checks that populate [`OptimizerInfo::messages`]; an optimizer
    /// that stalls without tripping one of them is reported as converged.
    fn converged(&self) -> bool {
        self.optimizer_info().messages.is_empty()
    }
}
