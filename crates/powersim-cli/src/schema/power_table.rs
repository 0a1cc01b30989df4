use powersim_dgp::SimSeed;
use powersim_sim::{SettingResult, TrialRecord};
use serde::{Deserialize, Serialize};

/// Artifact of one sweep, one row per parameter setting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerTable {
    pub design: String,
    pub runs: usize,
    pub alpha: f64,
    pub seed: SimSeed,
    pub rows: Vec<PowerRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerRow {
    pub setting: usize,
    pub effect: f64,
    pub n_subjects: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_trials: Option<usize>,
    pub n_singular: usize,
    pub n_nonconverged: usize,
    pub n_significant: usize,
    pub n_total: usize,
    pub power: f64,
    pub mean_estimate: f64,
    pub mean_std_error: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trials: Vec<TrialRecord>,
}

impl From<SettingResult> for PowerRow {
    fn from(result: SettingResult) -> Self {
        let SettingResult {
            setting,
            summary,
            trials,
        } = result;
        Self {
            setting: setting.id,
            effect: setting.design.effect(),
            n_subjects: setting.design.n_subjects(),
            n_items: setting.design.n_items(),
            n_trials: setting.design.n_trials(),
            n_singular: summary.n_singular,
            n_nonconverged: summary.n_nonconverged,
            n_significant: summary.n_significant,
            n_total: summary.n_total,
            power: summary.power,
            mean_estimate: summary.mean_estimate,
            mean_std_error: summary.mean_std_error,
            trials,
        }
    }
}
