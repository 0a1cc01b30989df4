use std::path::PathBuf;

use super::dataset::CrossedDatasetArg;
use crate::util::Output;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    #[clap(flatten)]
    dataset: CrossedDatasetArg,
    /// Output file (`-` for stdout)
    #[arg(long, default_value = "-")]
    output: PathBuf,
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let (_dgp, data, _seed) = arg.dataset.generate()?;
    Output::save_json(&data, &arg.output)?;
    Ok(())
}
