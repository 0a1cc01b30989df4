use std::path::PathBuf;

use powersim_dgp::OneSampleDgp;
use powersim_sim::Design;

use super::sweep::{self, SweepArg};
use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct OneSampleArg {
    #[clap(flatten)]
    sweep: SweepArg,
    /// Subject counts, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    subjects: Vec<usize>,
    /// Standard deviation of the observations (overrides the parameter file)
    #[arg(long)]
    sd: Option<f64>,
    /// JSON file with the remaining DGP parameters
    #[arg(long)]
    params: Option<PathBuf>,
}

pub(crate) fn run(arg: &OneSampleArg) -> anyhow::Result<()> {
    let base: OneSampleDgp = util::read_params_file(arg.params.as_deref())?;
    let sd = arg.sd.unwrap_or(base.sd);
    let designs = arg
        .sweep
        .effects()
        .into_iter()
        .flat_map(|effect| {
            arg.subjects.iter().map(move |&n_subjects| {
                Design::OneSample(OneSampleDgp {
                    effect,
                    n_subjects,
                    sd,
                })
            })
        })
        .collect();
    let sizes = format!("subj{}", sweep::join_sizes(&arg.subjects));
    sweep::run(&arg.sweep, "one-sample", &sizes, designs)
}
