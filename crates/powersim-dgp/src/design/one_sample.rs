use rand::Rng;
use rand_distr::Distribution as _;
use serde::{Deserialize, Serialize};

use crate::{
    Components, DataGenerator, Dataset, DgpError, Observation,
    effects::{centered_normal, check_column},
};

/// One observation per subject drawn around a population mean.
///
/// `response = effect + e`, with `e ~ N(0, sd)`.
///
/// ```
/// use powersim_dgp::{DataGenerator, OneSampleDgp, SimSeed};
///
/// let dgp = OneSampleDgp { effect: 0.5, n_subjects: 20, sd: 1.0 };
/// let data = dgp.generate(&mut SimSeed::from_u64(1451).rng()).unwrap();
/// assert_eq!(data.len(), 20);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OneSampleDgp {
    pub effect: f64,
    pub n_subjects: usize,
    pub sd: f64,
}

impl Default for OneSampleDgp {
    fn default() -> Self {
        Self {
            effect: 0.0,
            n_subjects: 20,
            sd: 1.0,
        }
    }
}

impl OneSampleDgp {
    /// Builds the dataset from already drawn residuals, one per subject.
    pub fn assemble(&self, residuals: &[f64]) -> Result<Dataset, DgpError> {
        check_column("residual", self.n_subjects, residuals.len())?;
        let observations = (1..)
            .zip(residuals)
            .map(|(subject, &residual)| Observation {
                subject,
                item: None,
                predictor: None,
                components: Components {
                    residual,
                    ..Components::default()
                },
                response: self.effect + residual,
            })
            .collect();
        Ok(Dataset::new(self.n_subjects, None, observations))
    }
}

impl DataGenerator for OneSampleDgp {
    fn generate<R>(&self, rng: &mut R) -> Result<Dataset, DgpError>
    where
        R: Rng + ?Sized,
    {
        let normal = centered_normal(self.sd)?;
        let residuals = (0..self.n_subjects)
            .map(|_| normal.sample(rng))
            .collect::<Vec<_>>();
        self.assemble(&residuals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimSeed;

    #[test]
    fn test_response_is_effect_plus_residual() {
        let dgp = OneSampleDgp {
            effect: 2.5,
            n_subjects: 50,
            sd: 3.0,
        };
        let data = dgp.generate(&mut SimSeed::from_u64(11).rng()).unwrap();
        assert_eq!(data.len(), 50);
        assert_eq!(data.n_subjects(), 50);
        for obs in data.observations() {
            assert_eq!(obs.response, 2.5 + obs.components.residual);
            assert!(obs.item.is_none());
        }
    }

    #[test]
    fn test_assemble_rejects_wrong_residual_count() {
        let dgp = OneSampleDgp::default();
        assert!(dgp.assemble(&[0.0; 3]).is_err());
    }

    #[test]
    fn test_zero_subjects_gives_empty_dataset() {
        let dgp = OneSampleDgp {
            n_subjects: 0,
            ..OneSampleDgp::default()
        };
        let data = dgp.generate(&mut SimSeed::from_u64(1).rng()).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_negative_sd_fails() {
        let dgp = OneSampleDgp {
            sd: -1.0,
            ..OneSampleDgp::default()
        };
        let err = dgp.generate(&mut SimSeed::from_u64(1).rng()).unwrap_err();
        assert!(matches!(err, DgpError::Normal(_)));
    }
}
