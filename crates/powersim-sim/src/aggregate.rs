//! Reduction of per-trial statistics into power estimates.

use powersim_model::TrialStats;
use powersim_stats::descriptive::DescriptiveStats;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{ParameterSetting, SimError, TrialRecord, run_trial};

/// Summary of the trials of one parameter setting.
///
/// Every trial counts toward `power`, including singular and non-converged fits;
/// those are reported in their own columns only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerSummary {
    pub n_singular: usize,
    pub n_nonconverged: usize,
    pub n_significant: usize,
    pub n_total: usize,
    /// `n_significant / n_total`
    pub power: f64,
    pub mean_estimate: f64,
    pub mean_std_error: f64,
}

impl PowerSummary {
    /// Reduces `trials` at significance level `alpha`. Returns `None` for an empty
    /// list.
    ///
    /// ```
    /// # use powersim_model::TrialStats;
    /// # use powersim_sim::PowerSummary;
    /// let trial = |p_value, is_singular| TrialStats {
    ///     is_singular,
    ///     converged: true,
    ///     estimate: 1.0,
    ///     std_error: 0.5,
    ///     statistic: 2.0,
    ///     p_value,
    /// };
    /// let trials = [trial(0.01, false), trial(0.20, true), trial(0.04, true), trial(0.05, false)];
    /// let summary = PowerSummary::from_trials(&trials, 0.05).unwrap();
    /// assert_eq!(summary.n_significant, 2);
    /// assert_eq!(summary.n_singular, 2);
    /// assert_eq!(summary.power, 0.5);
    /// ```
    #[must_use]
    pub fn from_trials(trials: &[TrialStats], alpha: f64) -> Option<Self> {
        let estimates = DescriptiveStats::new(trials.iter().map(|t| t.estimate))?;
        let std_errors = DescriptiveStats::new(trials.iter().map(|t| t.std_error))?;
        let n_total = trials.len();
        let n_significant = trials.iter().filter(|t| t.is_significant(alpha)).count();
        #[expect(clippy::cast_precision_loss)]
        let power = n_significant as f64 / n_total as f64;
        Some(Self {
            n_singular: trials.iter().filter(|t| t.is_singular).count(),
            n_nonconverged: trials.iter().filter(|t| !t.converged).count(),
            n_significant,
            n_total,
            power,
            mean_estimate: estimates.mean,
            mean_std_error: std_errors.mean,
        })
    }
}

/// Outcome of one sweep point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingResult {
    pub setting: ParameterSetting,
    pub summary: PowerSummary,
    /// Empty unless the sweep keeps per-trial records
    pub trials: Vec<TrialRecord>,
}

/// Runs `runs` trials of `setting` and summarizes them.
///
/// The first failing trial aborts the setting.
pub fn run_setting<R>(
    setting: &ParameterSetting,
    runs: usize,
    alpha: f64,
    keep_trials: bool,
    rng: &mut R,
) -> Result<SettingResult, SimError>
where
    R: Rng + ?Sized,
{
    let mut stats = Vec::with_capacity(runs);
    let mut trials = vec![];
    for index in 0..runs {
        let (trial, diagnostics) =
            run_trial(&setting.design, rng).map_err(|source| SimError::Trial {
                setting: setting.id,
                trial: index,
                source,
            })?;
        if !diagnostics.is_empty() {
            tracing::trace!(
                setting = setting.id,
                trial = index,
                conditions = diagnostics.conditions().len(),
                "fit raised conditions"
            );
        }
        if keep_trials {
            trials.push(TrialRecord {
                index,
                stats: trial,
                diagnostics,
            });
        }
        stats.push(trial);
    }
    let summary = PowerSummary::from_trials(&stats, alpha).ok_or(SimError::NoRuns)?;
    Ok(SettingResult {
        setting: setting.clone(),
        summary,
        trials,
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn trial_strategy() -> impl Strategy<Value = TrialStats> {
        (any::<bool>(), any::<bool>(), -5.0..5.0_f64, 0.01..3.0_f64, 0.0..=1.0_f64).prop_map(
            |(is_singular, converged, estimate, std_error, p_value)| TrialStats {
                is_singular,
                converged,
                estimate,
                std_error,
                statistic: estimate / std_error,
                p_value,
            },
        )
    }

    #[test]
    fn test_empty_trials_have_no_summary() {
        assert!(PowerSummary::from_trials(&[], 0.05).is_none());
    }

    #[test]
    fn test_degenerate_fits_still_count_toward_power() {
        let significant_but_singular = TrialStats {
            is_singular: true,
            converged: false,
            estimate: 3.0,
            std_error: 1.0,
            statistic: 3.0,
            p_value: 0.002,
        };
        let summary = PowerSummary::from_trials(&[significant_but_singular], 0.05).unwrap();
        assert_eq!(summary.n_singular, 1);
        assert_eq!(summary.n_nonconverged, 1);
        assert_eq!(summary.n_significant, 1);
        assert_eq!(summary.power, 1.0);
    }

    #[test]
    fn test_summary_is_order_independent() {
        proptest::proptest!(|(
            (trials, shuffled) in proptest::collection::vec(trial_strategy(), 1..60)
                .prop_flat_map(|trials| (Just(trials.clone()), Just(trials).prop_shuffle())),
            alpha in 0.001..0.2_f64,
        )| {
            let a = PowerSummary::from_trials(&trials, alpha).unwrap();
            let b = PowerSummary::from_trials(&shuffled, alpha).unwrap();
            prop_assert_eq!(a.n_singular, b.n_singular);
            prop_assert_eq!(a.n_nonconverged, b.n_nonconverged);
            prop_assert_eq!(a.n_significant, b.n_significant);
            prop_assert_eq!(a.power, b.power);
            prop_assert!((a.mean_estimate - b.mean_estimate).abs() < 1e-9);
        });
    }

    #[test]
    fn test_summary_bounds() {
        proptest::proptest!(|(
            trials in proptest::collection::vec(trial_strategy(), 1..60),
            alpha in 0.0..=1.0_f64,
        )| {
            let summary = PowerSummary::from_trials(&trials, alpha).unwrap();
            prop_assert_eq!(summary.n_total, trials.len());
            prop_assert!(summary.n_significant <= summary.n_total);
            prop_assert!(summary.n_singular <= summary.n_total);
            prop_assert!(summary.n_nonconverged <= summary.n_total);
            prop_assert!((0.0..=1.0).contains(&summary.power));
        });
    }
}
