//! One Monte Carlo trial: generate, fit, extract.

use powersim_model::{Diagnostics, TrialStats, capture_diagnostics, fit};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Design, TrialError};

/// Per-trial record kept when a sweep is asked to retain trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub index: usize,
    pub stats: TrialStats,
    pub diagnostics: Diagnostics,
}

/// Runs a single trial of `design`.
///
/// The fit runs inside a diagnostic capture, so warnings and messages it raises
/// come back in the returned sink instead of reaching the user. The fitted model
/// is dropped once its statistics are extracted.
pub fn run_trial<R>(design: &Design, rng: &mut R) -> Result<(TrialStats, Diagnostics), TrialError>
where
    R: Rng + ?Sized,
{
    let data = design.generate(rng)?;
    let formula = design.formula();
    let (model, diagnostics) = capture_diagnostics(|sink| fit(&data, &formula, sink));
    let stats = TrialStats::extract(model?.as_ref(), design.tested_term().name())?;
    Ok((stats, diagnostics))
}

#[cfg(test)]
mod tests {
    use powersim_dgp::{CrossedDgp, OneSampleDgp, SimSeed, SingleFactorDgp};

    use super::*;

    #[test]
    fn test_one_sample_trial_matches_fresh_generator() {
        let design = Design::OneSample(OneSampleDgp {
            effect: 0.4,
            n_subjects: 25,
            sd: 1.0,
        });
        let (a, diagnostics) = run_trial(&design, &mut SimSeed::from_u64(9).rng()).unwrap();
        let (b, _) = run_trial(&design, &mut SimSeed::from_u64(9).rng()).unwrap();
        assert_eq!(a, b);
        assert!(diagnostics.is_empty());
        assert!(a.converged && !a.is_singular);
    }

    #[test]
    fn test_single_factor_trial_tests_intercept() {
        let design = Design::SingleFactor(SingleFactorDgp {
            intercept: 3.0,
            n_subjects: 15,
            n_trials: 6,
            subject_sd: 1.0,
            error_sd: 1.0,
        });
        let (stats, _) = run_trial(&design, &mut SimSeed::from_u64(2).rng()).unwrap();
        // se is about sqrt(1/15 + 1/90)
        assert!((stats.estimate - 3.0).abs() < 1.5, "estimate = {}", stats.estimate);
        assert!(stats.p_value < 1e-3);
    }

    #[test]
    fn test_odd_item_count_fails_the_trial() {
        let design = Design::Crossed(CrossedDgp {
            n_subjects: 4,
            n_items: 5,
            ..CrossedDgp::default()
        });
        let err = run_trial(&design, &mut SimSeed::from_u64(1).rng()).unwrap_err();
        assert!(matches!(err, TrialError::Dgp(_)));
    }
}
