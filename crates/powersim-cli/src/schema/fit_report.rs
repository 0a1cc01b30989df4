use powersim_dgp::SimSeed;
use powersim_model::{Condition, OptimizerInfo, TrialStats, VarianceComponent};
use serde::{Deserialize, Serialize};

/// Fixed effects and variance components of a single fitted dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitReport {
    pub seed: SimSeed,
    pub formula: String,
    pub reml: bool,
    pub deviance: f64,
    pub fixed_effects: Vec<FixedEffectRow>,
    pub variance_components: Vec<VarianceComponent>,
    pub residual_sd: f64,
    pub is_singular: bool,
    pub converged: bool,
    pub optimizer: OptimizerInfo,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedEffectRow {
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
    pub statistic: f64,
    pub p_value: f64,
}

impl FixedEffectRow {
    pub fn new(term: &str, stats: &TrialStats) -> Self {
        Self {
            term: term.to_owned(),
            estimate: stats.estimate,
            std_error: stats.std_error,
            statistic: stats.statistic,
            p_value: stats.p_value,
        }
    }
}
