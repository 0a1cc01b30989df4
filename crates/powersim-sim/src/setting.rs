//! Points of a parameter sweep.

use powersim_dgp::{CrossedDgp, DataGenerator, Dataset, DgpError, OneSampleDgp, SingleFactorDgp};
use powersim_model::{FixedTerm, Formula};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Data-generating process of one sweep point, with every population parameter
/// fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "design", rename_all = "kebab-case")]
pub enum Design {
    OneSample(OneSampleDgp),
    SingleFactor(SingleFactorDgp),
    Crossed(CrossedDgp),
}

impl Design {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OneSample(_) => "one-sample",
            Self::SingleFactor(_) => "single-factor",
            Self::Crossed(_) => "crossed",
        }
    }

    /// Model formula matching the random-effects structure of the design.
    #[must_use]
    pub fn formula(&self) -> Formula {
        match self {
            Self::OneSample(_) => Formula::one_sample(),
            Self::SingleFactor(_) => Formula::single_factor(),
            Self::Crossed(_) => Formula::crossed(),
        }
    }

    /// Coefficient whose significance is counted.
    #[must_use]
    pub const fn tested_term(&self) -> FixedTerm {
        match self {
            Self::OneSample(_) | Self::SingleFactor(_) => FixedTerm::Intercept,
            Self::Crossed(_) => FixedTerm::Predictor,
        }
    }

    /// Population value of the tested coefficient.
    #[must_use]
    pub const fn effect(&self) -> f64 {
        match self {
            Self::OneSample(dgp) => dgp.effect,
            Self::SingleFactor(dgp) => dgp.intercept,
            Self::Crossed(dgp) => dgp.effect,
        }
    }

    #[must_use]
    pub const fn n_subjects(&self) -> usize {
        match self {
            Self::OneSample(dgp) => dgp.n_subjects,
            Self::SingleFactor(dgp) => dgp.n_subjects,
            Self::Crossed(dgp) => dgp.n_subjects,
        }
    }

    #[must_use]
    pub const fn n_items(&self) -> Option<usize> {
        match self {
            Self::Crossed(dgp) => Some(dgp.n_items),
            Self::OneSample(_) | Self::SingleFactor(_) => None,
        }
    }

    /// Trials per subject of the single-factor design.
    #[must_use]
    pub const fn n_trials(&self) -> Option<usize> {
        match self {
            Self::SingleFactor(dgp) => Some(dgp.n_trials),
            Self::OneSample(_) | Self::Crossed(_) => None,
        }
    }

    pub fn generate<R>(&self, rng: &mut R) -> Result<Dataset, DgpError>
    where
        R: Rng + ?Sized,
    {
        match self {
            Self::OneSample(dgp) => dgp.generate(rng),
            Self::SingleFactor(dgp) => dgp.generate(rng),
            Self::Crossed(dgp) => dgp.generate(rng),
        }
    }
}

/// One point of the sweep. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSetting {
    pub id: usize,
    pub design: Design,
}

/// `steps` evenly spaced values from `from` to `to`, both ends included.
///
/// ```
/// # use powersim_sim::effect_grid;
/// assert_eq!(effect_grid(0.0, 1.0, 5), [0.0, 0.25, 0.5, 0.75, 1.0]);
/// assert_eq!(effect_grid(3.0, 9.0, 1), [3.0]);
/// assert!(effect_grid(0.0, 1.0, 0).is_empty());
/// ```
#[must_use]
pub fn effect_grid(from: f64, to: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => vec![],
        1 => vec![from],
        _ => {
            #[expect(clippy::cast_precision_loss)]
            let width = (to - from) / (steps - 1) as f64;
            (0..steps)
                .map(|i| {
                    if i == steps - 1 {
                        to
                    } else {
                        #[expect(clippy::cast_precision_loss)]
                        let offset = i as f64 * width;
                        from + offset
                    }
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_ends_exactly_at_both_endpoints() {
        let grid = effect_grid(0.0, 160.0, 7);
        assert_eq!(grid.len(), 7);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[6], 160.0);
        assert!(grid.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_descending_grid() {
        assert_eq!(effect_grid(1.0, -1.0, 3), [1.0, 0.0, -1.0]);
    }

    #[test]
    fn test_design_accessors() {
        let crossed = Design::Crossed(CrossedDgp::default());
        assert_eq!(crossed.name(), "crossed");
        assert_eq!(crossed.tested_term().name(), "condition");
        assert_eq!(crossed.effect(), 80.0);
        assert_eq!(crossed.n_items(), Some(50));
        assert_eq!(crossed.n_trials(), None);

        let single = Design::SingleFactor(SingleFactorDgp {
            intercept: 0.3,
            ..SingleFactorDgp::default()
        });
        assert_eq!(single.tested_term().name(), "(Intercept)");
        assert_eq!(single.effect(), 0.3);
        assert_eq!(single.n_trials(), Some(10));
        assert_eq!(single.formula(), Formula::single_factor());
    }

    #[test]
    fn test_setting_serializes_with_design_tag() {
        let setting = ParameterSetting {
            id: 3,
            design: Design::OneSample(OneSampleDgp {
                effect: 0.5,
                n_subjects: 10,
                sd: 1.0,
            }),
        };
        let json = serde_json::to_value(&setting).unwrap();
        assert_eq!(json["design"]["design"], "one-sample");
        assert_eq!(json["design"]["n_subjects"], 10);
        let back: ParameterSetting = serde_json::from_value(json).unwrap();
        assert_eq!(back, setting);
    }
}
