use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use self::{
    crossed::CrossedArg, fit::FitArg, one_sample::OneSampleArg, simulate::SimulateArg,
    single_factor::SingleFactorArg,
};

mod crossed;
mod dataset;
mod fit;
mod one_sample;
mod simulate;
mod single_factor;
mod sweep;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Log debug output (overridden by `RUST_LOG`)
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Power sweep of the one-sample t-test
    OneSample(#[clap(flatten)] OneSampleArg),
    /// Power sweep of the intercept in a random-intercept model
    SingleFactor(#[clap(flatten)] SingleFactorArg),
    /// Power sweep of the fixed effect in the crossed subjects-by-items design
    Crossed(#[clap(flatten)] CrossedArg),
    /// Generate one crossed dataset and write it as JSON
    Simulate(#[clap(flatten)] SimulateArg),
    /// Generate one crossed dataset, fit the mixed model and report the estimates
    Fit(#[clap(flatten)] FitArg),
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_tracing(args.verbose);
    match args.mode {
        Mode::OneSample(arg) => one_sample::run(&arg)?,
        Mode::SingleFactor(arg) => single_factor::run(&arg)?,
        Mode::Crossed(arg) => crossed::run(&arg)?,
        Mode::Simulate(arg) => simulate::run(&arg)?,
        Mode::Fit(arg) => fit::run(&arg)?,
    }
    Ok(())
}
