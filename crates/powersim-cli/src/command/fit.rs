use std::path::PathBuf;

use anyhow::Context as _;
use powersim_model::{
    FittedModel as _, Formula, MixedModel, MixedModelFitter, TrialStats, capture_diagnostics,
};

use super::dataset::CrossedDatasetArg;
use crate::{
    schema::fit_report::{FitReport, FixedEffectRow},
    util::Output,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct FitArg {
    #[clap(flatten)]
    dataset: CrossedDatasetArg,
    /// Fit by maximum likelihood instead of REML
    #[arg(long)]
    ml: bool,
    /// Iteration limit of the optimizer
    #[arg(long, default_value_t = MixedModelFitter::default().max_iters)]
    max_iters: u64,
    /// Also write the report as JSON (`-` for stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &FitArg) -> anyhow::Result<()> {
    let (dgp, data, seed) = arg.dataset.generate()?;
    let formula = Formula::crossed();
    let fitter = MixedModelFitter {
        reml: !arg.ml,
        max_iters: arg.max_iters,
    };
    let (model, diagnostics) =
        capture_diagnostics(|sink| MixedModel::fit(&data, &formula, &fitter, sink));
    let model = model.with_context(|| format!("failed to fit `{formula}`"))?;

    let fixed_effects = model
        .coefficient_names()
        .iter()
        .map(|term| Ok(FixedEffectRow::new(term, &TrialStats::extract(&model, term)?)))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let report = FitReport {
        seed,
        formula: formula.to_string(),
        reml: model.is_reml(),
        deviance: model.deviance(),
        fixed_effects,
        variance_components: model.variance_components().to_vec(),
        residual_sd: model.sigma(),
        is_singular: model.is_singular(),
        converged: model.converged(),
        optimizer: model.optimizer_info().clone(),
        conditions: diagnostics.conditions().to_vec(),
    };

    print_report(&report, dgp.effect, dgp.error_sd);
    if let Some(output) = &arg.output {
        Output::save_json(&report, output)?;
    }
    Ok(())
}

fn print_report(report: &FitReport, true_effect: f64, true_error_sd: f64) {
    let criterion = if report.reml { "REML criterion" } else { "deviance" };
    eprintln!("{}", report.formula);
    eprintln!("{criterion}: {:.2}", report.deviance);
    eprintln!();
    eprintln!("Random effects:");
    eprintln!("{:<10} {:<12} {:>10} {:>8}", "group", "name", "std.dev", "corr");
    for component in &report.variance_components {
        for (i, (name, sd)) in component.names.iter().zip(&component.std_devs).enumerate() {
            let group = if i == 0 { component.group.as_str() } else { "" };
            // correlations with the earlier coefficients of the same term
            let start = i * i.saturating_sub(1) / 2;
            let corr = component.correlations[start..start + i]
                .iter()
                .map(|r| format!("{r:.3}"))
                .collect::<Vec<_>>()
                .join(" ");
            eprintln!("{group:<10} {name:<12} {sd:>10.4} {corr:>8}");
        }
    }
    eprintln!(
        "{:<10} {:<12} {:>10.4}   (true {true_error_sd})",
        "residual", "", report.residual_sd
    );
    eprintln!();
    eprintln!("Fixed effects:");
    eprintln!(
        "{:<12} {:>10} {:>10} {:>8} {:>10}",
        "term", "estimate", "std.error", "z", "p"
    );
    for row in &report.fixed_effects {
        eprintln!(
            "{:<12} {:>10.4} {:>10.4} {:>8.3} {:>10.3e}",
            row.term, row.estimate, row.std_error, row.statistic, row.p_value
        );
    }
    eprintln!("(true effect {true_effect})");
    eprintln!();
    eprintln!(
        "singular: {}, converged: {} ({} iterations, {} evaluations)",
        report.is_singular,
        report.converged,
        report.optimizer.iterations,
        report.optimizer.evaluations
    );
    for condition in &report.conditions {
        eprintln!("{:?}: {}", condition.kind, condition.text);
    }
}
