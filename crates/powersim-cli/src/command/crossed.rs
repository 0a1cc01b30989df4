use std::path::PathBuf;

use powersim_dgp::CrossedDgp;
use powersim_sim::Design;

use super::sweep::{self, SweepArg};
use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct CrossedArg {
    #[clap(flatten)]
    sweep: SweepArg,
    /// Subject counts, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    subjects: Vec<usize>,
    /// Item counts, comma separated (each must be even)
    #[arg(long, value_delimiter = ',', required = true)]
    items: Vec<usize>,
    /// JSON file with the nuisance parameters (grand mean, standard deviations, correlation)
    #[arg(long)]
    params: Option<PathBuf>,
}

pub(crate) fn run(arg: &CrossedArg) -> anyhow::Result<()> {
    let base: CrossedDgp = util::read_params_file(arg.params.as_deref())?;
    let mut designs = vec![];
    for effect in arg.sweep.effects() {
        for &n_subjects in &arg.subjects {
            for &n_items in &arg.items {
                designs.push(Design::Crossed(CrossedDgp {
                    n_subjects,
                    n_items,
                    effect,
                    ..base.clone()
                }));
            }
        }
    }
    let sizes = format!(
        "subj{}_items{}",
        sweep::join_sizes(&arg.subjects),
        sweep::join_sizes(&arg.items)
    );
    sweep::run(&arg.sweep, "crossed", &sizes, designs)
}
