//! Model matrices built from a dataset and a formula.
//!
//! The fixed-effects matrix `X` is dense. The random-effects matrix `Z` has at
//! most one intercept and one slope entry per term in each row, so it is kept as
//! a list of `(column, value)` entries per row and only its cross products are
//! ever materialized.
//!
//! Random-effect columns are ordered by term, then by level, then by coefficient
//! within the level, so each level of a term occupies a contiguous block.

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector};
use powersim_dgp::{Dataset, Observation};

use crate::{FitError, FixedTerm, Formula, Grouping, RandomTerm};

#[derive(Debug, Clone)]
pub(crate) struct RandomBlock {
    pub(crate) term: RandomTerm,
    pub(crate) n_levels: usize,
    /// First column of this term in `Z`
    pub(crate) offset: usize,
}

impl RandomBlock {
    pub(crate) fn n_columns(&self) -> usize {
        self.term.dim() * self.n_levels
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ModelFrame {
    pub(crate) x: DMatrix<f64>,
    pub(crate) y: DVector<f64>,
    pub(crate) fixed_names: Vec<String>,
    pub(crate) blocks: Vec<RandomBlock>,
    pub(crate) z_rows: Vec<Vec<(usize, f64)>>,
    pub(crate) n_random: usize,
}

fn grouping_id(obs: &Observation, grouping: Grouping) -> Result<u32, FitError> {
    match grouping {
        Grouping::Subject => Ok(obs.subject),
        Grouping::Item => obs.item.ok_or(FitError::MissingColumn { column: "item" }),
    }
}

fn predictor(obs: &Observation) -> Result<f64, FitError> {
    obs.predictor
        .ok_or(FitError::MissingColumn { column: "predictor" })
}

impl ModelFrame {
    pub(crate) fn new(data: &Dataset, formula: &Formula) -> Result<Self, FitError> {
        let observations = data.observations();
        let n = observations.len();
        let p = formula.fixed.len();
        if n <= p {
            return Err(FitError::TooFewObservations { n, p });
        }

        let mut x = DMatrix::zeros(n, p);
        for (i, obs) in observations.iter().enumerate() {
            for (j, term) in formula.fixed.iter().enumerate() {
                x[(i, j)] = match term {
                    FixedTerm::Intercept => 1.0,
                    FixedTerm::Predictor => predictor(obs)?,
                };
            }
        }
        let y = DVector::from_iterator(n, data.responses());

        let mut blocks = Vec::with_capacity(formula.random.len());
        let mut levels = Vec::with_capacity(formula.random.len());
        let mut offset = 0;
        for term in &formula.random {
            let mut level_index = BTreeMap::new();
            for obs in observations {
                level_index.insert(grouping_id(obs, term.grouping)?, 0);
            }
            for (index, slot) in level_index.values_mut().enumerate() {
                *slot = index;
            }
            let n_levels = level_index.len();
            if n_levels < 2 || n_levels >= n {
                return Err(FitError::GroupingLevels {
                    grouping: term.grouping.name(),
                    n_levels,
                    n_obs: n,
                });
            }
            let block = RandomBlock {
                term: *term,
                n_levels,
                offset,
            };
            offset += block.n_columns();
            blocks.push(block);
            levels.push(level_index);
        }

        let mut z_rows = Vec::with_capacity(if blocks.is_empty() { 0 } else { n });
        if !blocks.is_empty() {
            for obs in observations {
                let mut row = Vec::with_capacity(3);
                for (block, level_index) in blocks.iter().zip(&levels) {
                    let level = level_index[&grouping_id(obs, block.term.grouping)?];
                    let col = block.offset + level * block.term.dim();
                    row.push((col, 1.0));
                    if block.term.slope {
                        row.push((col + 1, predictor(obs)?));
                    }
                }
                z_rows.push(row);
            }
        }

        Ok(Self {
            x,
            y,
            fixed_names: formula
                .fixed
                .iter()
                .map(|term| term.name().to_owned())
                .collect(),
            blocks,
            z_rows,
            n_random: offset,
        })
    }

    pub(crate) fn n_obs(&self) -> usize {
        self.y.len()
    }

    pub(crate) fn n_fixed(&self) -> usize {
        self.x.ncols()
    }
}

#[cfg(test)]
mod tests {
    use powersim_dgp::{CrossedDgp, DataGenerator as _, OneSampleDgp, SimSeed};

    use super::*;

    #[test]
    fn test_crossed_frame_layout() {
        let dgp = CrossedDgp {
            n_subjects: 4,
            n_items: 6,
            ..CrossedDgp::default()
        };
        let data = dgp.generate(&mut SimSeed::from_u64(1).rng()).unwrap();
        let frame = ModelFrame::new(&data, &Formula::crossed()).unwrap();

        assert_eq!(frame.x.shape(), (24, 2));
        assert_eq!(frame.fixed_names, ["(Intercept)", "condition"]);
        assert_eq!(frame.n_random, 4 * 2 + 6);
        assert_eq!(frame.blocks[1].offset, 8);

        // first row: subject 1, item 1 (condition -0.5)
        assert_eq!(frame.z_rows[0], [(0, 1.0), (1, -0.5), (8, 1.0)]);
        // last row: subject 4, item 6 (condition +0.5)
        assert_eq!(frame.z_rows[23], [(6, 1.0), (7, 0.5), (13, 1.0)]);
    }

    #[test]
    fn test_missing_predictor_column() {
        let data = OneSampleDgp::default()
            .generate(&mut SimSeed::from_u64(1).rng())
            .unwrap();
        let err = ModelFrame::new(&data, &Formula::crossed()).unwrap_err();
        assert!(matches!(err, FitError::MissingColumn { column: "predictor" }));
    }

    #[test]
    fn test_one_level_per_observation_is_rejected() {
        let data = OneSampleDgp::default()
            .generate(&mut SimSeed::from_u64(1).rng())
            .unwrap();
        let err = ModelFrame::new(&data, &Formula::single_factor()).unwrap_err();
        assert!(matches!(err, FitError::GroupingLevels { n_levels: 20, n_obs: 20, .. }));
    }

    #[test]
    fn test_empty_dataset_is_too_small() {
        let dgp = OneSampleDgp {
            n_subjects: 0,
            ..OneSampleDgp::default()
        };
        let data = dgp.generate(&mut SimSeed::from_u64(1).rng()).unwrap();
        let err = ModelFrame::new(&data, &Formula::one_sample()).unwrap_err();
        assert!(matches!(err, FitError::TooFewObservations { n: 0, p: 1 }));
    }
}
