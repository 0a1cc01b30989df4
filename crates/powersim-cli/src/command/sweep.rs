use std::path::PathBuf;

use anyhow::Context as _;
use powersim_dgp::SimSeed;
use powersim_sim::{Design, ParameterSetting, Sweep, effect_grid};
use rand::Rng as _;

use crate::{
    schema::power_table::{PowerRow, PowerTable},
    util::Output,
};

/// Arguments shared by every sweep driver.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SweepArg {
    /// Monte Carlo runs per parameter setting
    #[arg(long)]
    pub runs: usize,
    /// First effect size of the sweep
    #[arg(long, allow_negative_numbers = true)]
    pub effect_from: f64,
    /// Last effect size of the sweep
    #[arg(long, allow_negative_numbers = true)]
    pub effect_to: f64,
    /// Number of effect sizes, both ends included
    #[arg(long)]
    pub steps: usize,
    /// Significance threshold
    #[arg(long, default_value_t = 0.05)]
    pub alpha: f64,
    /// Seed of the whole sweep (decimal, or 32 hex digits); random when omitted
    #[arg(long)]
    pub seed: Option<SimSeed>,
    /// Run settings on this many worker threads
    #[arg(long)]
    pub jobs: Option<usize>,
    /// Keep per-trial records in the artifact
    #[arg(long)]
    pub keep_trials: bool,
    /// Output file (`-` for stdout); defaults to a name built from the run parameters
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl SweepArg {
    pub(crate) fn effects(&self) -> Vec<f64> {
        effect_grid(self.effect_from, self.effect_to, self.steps)
    }

    fn default_output(&self, design: &str, sizes: &str) -> PathBuf {
        PathBuf::from(format!(
            "power-{design}_runs{}_eff{}to{}x{}_{sizes}.json",
            self.runs, self.effect_from, self.effect_to, self.steps
        ))
    }
}

/// Joins sample sizes for use in a file name.
pub(crate) fn join_sizes(sizes: &[usize]) -> String {
    sizes
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join("-")
}

/// Runs the sweep over `designs` (already in effect-major order), prints the
/// summary table and writes the artifact.
pub(crate) fn run(
    arg: &SweepArg,
    name: &str,
    sizes: &str,
    designs: Vec<Design>,
) -> anyhow::Result<()> {
    anyhow::ensure!(arg.runs > 0, "--runs must be at least 1");
    anyhow::ensure!(arg.steps > 0, "--steps must be at least 1");
    anyhow::ensure!(
        arg.alpha > 0.0 && arg.alpha < 1.0,
        "--alpha must be between 0 and 1, got {}",
        arg.alpha
    );

    let seed = arg.seed.unwrap_or_else(|| rand::rng().random());
    let settings = designs
        .into_iter()
        .enumerate()
        .map(|(id, design)| ParameterSetting { id, design })
        .collect::<Vec<_>>();
    tracing::info!(
        "{name} sweep: {} settings x {} runs, seed {seed}",
        settings.len(),
        arg.runs
    );

    let sweep = Sweep {
        settings,
        runs: arg.runs,
        alpha: arg.alpha,
        keep_trials: arg.keep_trials,
    };
    let results = match arg.jobs {
        Some(jobs) => sweep.run_parallel(seed, jobs),
        None => sweep.run(seed),
    }
    .with_context(|| format!("{name} sweep failed"))?;

    let table = PowerTable {
        design: name.to_owned(),
        runs: arg.runs,
        alpha: arg.alpha,
        seed,
        rows: results.into_iter().map(PowerRow::from).collect(),
    };
    print_summary(&table);

    let output = arg
        .output
        .clone()
        .unwrap_or_else(|| arg.default_output(name, sizes));
    Output::save_json(&table, &output)?;
    Ok(())
}

fn print_summary(table: &PowerTable) {
    eprintln!();
    eprintln!(
        "{:>7} {:>10} {:>8} {:>6} {:>8} {:>9} {:>11} {:>6} {:>6}",
        "setting",
        "effect",
        "subjects",
        "items",
        "singular",
        "nonconv",
        "significant",
        "total",
        "power"
    );
    for row in &table.rows {
        let items = row
            .n_items
            .map_or_else(|| "-".to_owned(), |n| n.to_string());
        eprintln!(
            "{:>7} {:>10.4} {:>8} {:>6} {:>8} {:>9} {:>11} {:>6} {:>6.3}",
            row.setting,
            row.effect,
            row.n_subjects,
            items,
            row.n_singular,
            row.n_nonconverged,
            row.n_significant,
            row.n_total,
            row.power
        );
    }
    eprintln!();
}
