use std::path::PathBuf;

use powersim_dgp::{CrossedDgp, DataGenerator as _, Dataset, SimSeed};
use rand::Rng as _;

use crate::util;

/// Parameters of a single crossed dataset.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct CrossedDatasetArg {
    /// JSON file with the DGP parameters (workshop defaults when omitted)
    #[arg(long)]
    params: Option<PathBuf>,
    /// Number of subjects
    #[arg(long)]
    subjects: Option<usize>,
    /// Number of items (must be even)
    #[arg(long)]
    items: Option<usize>,
    /// Fixed effect of the predictor
    #[arg(long, allow_negative_numbers = true)]
    effect: Option<f64>,
    /// Seed (decimal, or 32 hex digits); random when omitted
    #[arg(long)]
    pub seed: Option<SimSeed>,
}

impl CrossedDatasetArg {
    pub(crate) fn dgp(&self) -> anyhow::Result<CrossedDgp> {
        let base: CrossedDgp = util::read_params_file(self.params.as_deref())?;
        Ok(CrossedDgp {
            n_subjects: self.subjects.unwrap_or(base.n_subjects),
            n_items: self.items.unwrap_or(base.n_items),
            effect: self.effect.unwrap_or(base.effect),
            ..base
        })
    }

    /// Draws the dataset, returning it with the seed that produced it.
    pub(crate) fn generate(&self) -> anyhow::Result<(CrossedDgp, Dataset, SimSeed)> {
        let dgp = self.dgp()?;
        let seed = self.seed.unwrap_or_else(|| rand::rng().random());
        let data = dgp.generate(&mut seed.rng())?;
        tracing::info!(
            "generated {} rows ({} subjects x {} items), seed {seed}",
            data.len(),
            dgp.n_subjects,
            dgp.n_items
        );
        Ok((dgp, data, seed))
    }
}
