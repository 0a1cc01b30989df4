//! Per-trial statistics pulled out of a fitted model.

use powersim_stats::distribution;
use serde::{Deserialize, Serialize};

use crate::FittedModel;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ExtractError {
    #[display("model has no coefficient named `{term}`")]
    UnknownTerm { term: String },
    #[display("coefficient `{term}` has no usable standard error (variance = {variance})")]
    StandardError { term: String, variance: f64 },
}

/// Inferential statistics of one coefficient in one Monte Carlo trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialStats {
    pub is_singular: bool,
    pub converged: bool,
    pub estimate: f64,
    pub std_error: f64,
    pub statistic: f64,
    pub p_value: f64,
}

impl TrialStats {
    /// Extracts the statistics of `term` from `model`.
    ///
    /// Models with a tidy row (least squares) report it as is. Otherwise the
    /// coefficient is tested with a Wald statistic `z = estimate / se`, referred to
    /// the standard normal distribution.
    pub fn extract(model: &dyn FittedModel, term: &str) -> Result<Self, ExtractError> {
        let is_singular = model.is_singular();
        let converged = model.converged();

        if let Some(row) = model.tidy(term) {
            return Ok(Self {
                is_singular,
                converged,
                estimate: row.estimate,
                std_error: row.std_error,
                statistic: row.statistic,
                p_value: row.p_value,
            });
        }

        let index = model
            .coefficient_index(term)
            .ok_or_else(|| ExtractError::UnknownTerm {
                term: term.to_owned(),
            })?;
        let estimate = model.coefficients()[index];
        let variance = model.covariance()[(index, index)];
        if !(variance.is_finite() && variance > 0.0) {
            return Err(ExtractError::StandardError {
                term: term.to_owned(),
                variance,
            });
        }
        let std_error = variance.sqrt();
        let statistic = estimate / std_error;
        Ok(Self {
            is_singular,
            converged,
            estimate,
            std_error,
            statistic,
            p_value: distribution::wald_p_value(statistic),
        })
    }

    #[must_use]
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}
