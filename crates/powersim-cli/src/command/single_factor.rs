use std::path::PathBuf;

use powersim_dgp::SingleFactorDgp;
use powersim_sim::Design;

use super::sweep::{self, SweepArg};
use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SingleFactorArg {
    #[clap(flatten)]
    sweep: SweepArg,
    /// Subject counts, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    subjects: Vec<usize>,
    /// Trials per subject
    #[arg(long)]
    trials: Option<usize>,
    /// Standard deviation of the subject intercepts
    #[arg(long)]
    subject_sd: Option<f64>,
    /// Residual standard deviation
    #[arg(long)]
    error_sd: Option<f64>,
    /// JSON file with the remaining DGP parameters
    #[arg(long)]
    params: Option<PathBuf>,
}

pub(crate) fn run(arg: &SingleFactorArg) -> anyhow::Result<()> {
    let base: SingleFactorDgp = util::read_params_file(arg.params.as_deref())?;
    let base = SingleFactorDgp {
        n_trials: arg.trials.unwrap_or(base.n_trials),
        subject_sd: arg.subject_sd.unwrap_or(base.subject_sd),
        error_sd: arg.error_sd.unwrap_or(base.error_sd),
        ..base
    };
    let designs = arg
        .sweep
        .effects()
        .into_iter()
        .flat_map(|intercept| {
            let base = &base;
            arg.subjects.iter().map(move |&n_subjects| {
                Design::SingleFactor(SingleFactorDgp {
                    intercept,
                    n_subjects,
                    ..base.clone()
                })
            })
        })
        .collect();
    let sizes = format!(
        "subj{}_trials{}",
        sweep::join_sizes(&arg.subjects),
        base.n_trials
    );
    sweep::run(&arg.sweep, "single-factor", &sizes, designs)
}
