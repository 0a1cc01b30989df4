use serde::{Deserialize, Serialize};

/// The random parts drawn for a single row.
///
/// Kept alongside the response so every row can be checked against the
/// decomposition it was built from. Components that a design does not have stay
/// at zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Components {
    pub subject_intercept: f64,
    pub subject_slope: f64,
    pub item_intercept: f64,
    pub residual: f64,
}

/// One row of a synthetic dataset: a single subject/item encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Subject identifier (1-based)
    pub subject: u32,
    /// Item identifier (1-based), present in crossed designs only
    pub item: Option<u32>,
    /// Deviation-coded predictor (`-0.5` / `+0.5`), present when the design has one
    pub predictor: Option<f64>,
    pub components: Components,
    pub response: f64,
}

/// A table of simulated observations.
///
/// Built fresh for every Monte Carlo trial and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    n_subjects: usize,
    n_items: Option<usize>,
    observations: Vec<Observation>,
}

impl Dataset {
    #[must_use]
    pub fn new(n_subjects: usize, n_items: Option<usize>, observations: Vec<Observation>) -> Self {
        Self {
            n_subjects,
            n_items,
            observations,
        }
    }

    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    #[must_use]
    pub fn n_subjects(&self) -> usize {
        self.n_subjects
    }

    #[must_use]
    pub fn n_items(&self) -> Option<usize> {
        self.n_items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn responses(&self) -> impl ExactSizeIterator<Item = f64> + '_ {
        self.observations.iter().map(|obs| obs.response)
    }
}
