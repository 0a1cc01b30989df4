use rand::Rng;
use rand_distr::Distribution as _;
use serde::{Deserialize, Serialize};

use crate::{
    Components, DataGenerator, Dataset, DgpError, Observation, SubjectEffects,
    effects::{centered_normal, check_column},
};

/// Repeated trials per subject with a random subject intercept.
///
/// `response = intercept + S_0s + e`, with `S_0s ~ N(0, subject_sd)` drawn once
/// per subject and `e ~ N(0, error_sd)` drawn per trial. The intercept is the
/// effect under test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleFactorDgp {
    pub intercept: f64,
    pub n_subjects: usize,
    pub n_trials: usize,
    pub subject_sd: f64,
    pub error_sd: f64,
}

impl Default for SingleFactorDgp {
    fn default() -> Self {
        Self {
            intercept: 0.0,
            n_subjects: 20,
            n_trials: 10,
            subject_sd: 1.0,
            error_sd: 1.0,
        }
    }
}

impl SingleFactorDgp {
    /// Crosses each subject with `n_trials` residuals, subject-major.
    pub fn assemble(
        &self,
        subjects: &SubjectEffects,
        residuals: &[f64],
    ) -> Result<Dataset, DgpError> {
        check_column("residual", subjects.len() * self.n_trials, residuals.len())?;
        let observations = subjects
            .iter()
            .flat_map(|row| std::iter::repeat_n(row, self.n_trials))
            .zip(residuals)
            .map(|((subject, subject_intercept, _), &residual)| Observation {
                subject,
                item: None,
                predictor: None,
                components: Components {
                    subject_intercept,
                    residual,
                    ..Components::default()
                },
                response: self.intercept + subject_intercept + residual,
            })
            .collect();
        Ok(Dataset::new(subjects.len(), None, observations))
    }
}

impl DataGenerator for SingleFactorDgp {
    fn generate<R>(&self, rng: &mut R) -> Result<Dataset, DgpError>
    where
        R: Rng + ?Sized,
    {
        let subjects = SubjectEffects::draw_intercepts(self.n_subjects, self.subject_sd, rng)?;
        let normal = centered_normal(self.error_sd)?;
        let residuals = (0..self.n_subjects * self.n_trials)
            .map(|_| normal.sample(rng))
            .collect::<Vec<_>>();
        self.assemble(&subjects, &residuals)
    }
}
