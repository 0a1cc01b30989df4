use rand::Rng;
use rand_distr::Distribution as _;
use serde::{Deserialize, Serialize};

use crate::{
    Components, DataGenerator, Dataset, DgpError, ItemEffects, Observation, SubjectEffects,
    effects::{centered_normal, check_column},
};

/// Subjects fully crossed with items, with by-subject random slopes.
///
/// ```text
/// response = mu + S_0s + I_0i + (effect + S_1s) × X_i + e
/// ```
///
/// - `X_i` is the item's deviation-coded condition (`-0.5` for the first half of
///   the items, `+0.5` for the second half)
/// - `(S_0s, S_1s)` is bivariate normal with sds `subject_intercept_sd`,
///   `subject_slope_sd` and correlation `subject_correlation`
/// - `I_0i ~ N(0, item_intercept_sd)`, independent of the subject effects
/// - `e ~ N(0, error_sd)`
///
/// Draw order is item intercepts, subject pairs, then one residual per row with
/// rows ordered subject-major, item-minor.
///
/// ```
/// use powersim_dgp::{CrossedDgp, DataGenerator, SimSeed};
///
/// let dgp = CrossedDgp { n_subjects: 10, n_items: 6, ..CrossedDgp::default() };
/// let data = dgp.generate(&mut SimSeed::from_u64(1451).rng()).unwrap();
/// assert_eq!(data.len(), 60);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossedDgp {
    pub n_subjects: usize,
    pub n_items: usize,
    /// Grand mean
    pub mu: f64,
    /// Fixed effect of the predictor
    pub effect: f64,
    pub item_intercept_sd: f64,
    pub subject_intercept_sd: f64,
    pub subject_slope_sd: f64,
    /// Correlation between subject intercepts and slopes
    pub subject_correlation: f64,
    pub error_sd: f64,
}

impl Default for CrossedDgp {
    fn default() -> Self {
        Self {
            n_subjects: 100,
            n_items: 50,
            mu: 800.0,
            effect: 80.0,
            item_intercept_sd: 80.0,
            subject_intercept_sd: 100.0,
            subject_slope_sd: 40.0,
            subject_correlation: 0.2,
            error_sd: 200.0,
        }
    }
}

impl CrossedDgp {
    /// Joins every subject with every item and adds the given residuals.
    ///
    /// This is the deterministic half of [`DataGenerator::generate`]: given the
    /// same tables and residuals it always produces the same dataset.
    pub fn assemble(
        &self,
        subjects: &SubjectEffects,
        items: &ItemEffects,
        residuals: &[f64],
    ) -> Result<Dataset, DgpError> {
        check_column("residual", subjects.len() * items.len(), residuals.len())?;
        let observations = subjects
            .iter()
            .flat_map(|subject| items.iter().map(move |item| (subject, item)))
            .zip(residuals)
            .map(|(((subject, s0, s1), (item, i0, x)), &residual)| Observation {
                subject,
                item: Some(item),
                predictor: Some(x),
                components: Components {
                    subject_intercept: s0,
                    subject_slope: s1,
                    item_intercept: i0,
                    residual,
                },
                response: self.mu + s0 + i0 + (self.effect + s1) * x + residual,
            })
            .collect();
        Ok(Dataset::new(
            subjects.len(),
            Some(items.len()),
            observations,
        ))
    }
}

impl DataGenerator for CrossedDgp {
    fn generate<R>(&self, rng: &mut R) -> Result<Dataset, DgpError>
    where
        R: Rng + ?Sized,
    {
        let items = ItemEffects::draw_balanced(self.n_items, self.item_intercept_sd, rng)?;
        let subjects = SubjectEffects::draw_correlated(
            self.n_subjects,
            self.subject_intercept_sd,
            self.subject_slope_sd,
            self.subject_correlation,
            rng,
        )?;
        let normal = centered_normal(self.error_sd)?;
        let residuals = (0..subjects.len() * items.len())
            .map(|_| normal.sample(rng))
            .collect::<Vec<_>>();
        self.assemble(&subjects, &items, &residuals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimSeed;

    fn small() -> CrossedDgp {
        CrossedDgp {
            n_subjects: 8,
            n_items: 6,
            ..CrossedDgp::default()
        }
    }

    #[test]
    fn test_row_count_is_subjects_times_items() {
        for (n_subjects, n_items) in [(1, 2), (3, 4), (20, 10)] {
            let dgp = CrossedDgp {
                n_subjects,
                n_items,
                ..CrossedDgp::default()
            };
            let data = dgp.generate(&mut SimSeed::from_u64(9).rng()).unwrap();
            assert_eq!(data.len(), n_subjects * n_items);
            assert_eq!(data.n_items(), Some(n_items));
        }
    }

    #[test]
    fn test_response_is_exact_sum_of_components() {
        let dgp = small();
        let data = dgp.generate(&mut SimSeed::from_u64(1451).rng()).unwrap();
        for obs in data.observations() {
            let c = obs.components;
            let x = obs.predictor.unwrap();
            let expected = dgp.mu
                + c.subject_intercept
                + c.item_intercept
                + (dgp.effect + c.subject_slope) * x
                + c.residual;
            assert_eq!(obs.response, expected);
        }
    }

    #[test]
    fn test_every_subject_meets_every_item_once() {
        let data = small().generate(&mut SimSeed::from_u64(2).rng()).unwrap();
        let mut pairs = data
            .observations()
            .iter()
            .map(|obs| (obs.subject, obs.item.unwrap()))
            .collect::<Vec<_>>();
        pairs.sort_unstable();
        pairs.dedup();
        assert_eq!(pairs.len(), 8 * 6);
    }

    #[test]
    fn test_random_effects_are_looked_up_by_id() {
        let data = small().generate(&mut SimSeed::from_u64(3).rng()).unwrap();
        let obs = data.observations();
        for a in obs {
            for b in obs {
                if a.subject == b.subject {
                    assert_eq!(a.components.subject_intercept, b.components.subject_intercept);
                    assert_eq!(a.components.subject_slope, b.components.subject_slope);
                }
                if a.item == b.item {
                    assert_eq!(a.components.item_intercept, b.components.item_intercept);
                    assert_eq!(a.predictor, b.predictor);
                }
            }
        }
    }

    #[test]
    fn test_assemble_from_known_draws() {
        let dgp = CrossedDgp {
            n_subjects: 1,
            n_items: 2,
            mu: 100.0,
            effect: 10.0,
            ..CrossedDgp::default()
        };
        let subjects = SubjectEffects::from_columns(vec![1], vec![5.0], vec![2.0]).unwrap();
        let items =
            ItemEffects::from_columns(vec![1, 2], vec![-1.0, 1.0], vec![-0.5, 0.5]).unwrap();
        let data = dgp.assemble(&subjects, &items, &[0.25, -0.25]).unwrap();
        let responses = data.responses().collect::<Vec<_>>();
        assert_eq!(responses, [100.0 + 5.0 - 1.0 - 6.0 + 0.25, 100.0 + 5.0 + 1.0 + 6.0 - 0.25]);
    }

    #[test]
    fn test_same_seed_same_dataset() {
        let dgp = small();
        let a = dgp.generate(&mut SimSeed::from_u64(1451).rng()).unwrap();
        let b = dgp.generate(&mut SimSeed::from_u64(1451).rng()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_odd_item_count_propagates_table_error() {
        let dgp = CrossedDgp {
            n_items: 5,
            ..small()
        };
        let err = dgp.generate(&mut SimSeed::from_u64(1).rng()).unwrap_err();
        assert!(matches!(err, DgpError::ColumnLength { .. }));
    }

    #[test]
    fn test_params_load_from_partial_json() {
        let dgp: CrossedDgp =
            serde_json::from_str(r#"{ "n_subjects": 30, "effect": 20.0 }"#).unwrap();
        assert_eq!(dgp.n_subjects, 30);
        assert_eq!(dgp.effect, 20.0);
        assert_eq!(dgp.mu, 800.0);
    }

    #[test]
    fn test_negative_sds_fail() {
        let dgp = CrossedDgp {
            item_intercept_sd: -80.0,
            error_sd: -200.0,
            ..small()
        };
        let err = dgp.generate(&mut SimSeed::from_u64(1451).rng()).unwrap_err();
        assert!(matches!(err, DgpError::Normal(_)));

        let dgp = CrossedDgp {
            error_sd: -200.0,
            ..small()
        };
        let err = dgp.generate(&mut SimSeed::from_u64(1451).rng()).unwrap_err();
        assert!(matches!(err, DgpError::Normal(_)));
    }
}
