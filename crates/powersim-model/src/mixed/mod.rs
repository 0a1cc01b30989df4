//! Linear mixed models estimated by (restricted) maximum likelihood.
//!
//! The covariance parameters `θ` are profiled: for every `θ` the fixed effects
//! and the residual variance follow in closed form from a penalized
//! least-squares solve, leaving a low-dimensional deviance that Nelder-Mead
//! minimizes. The gradient at the optimum is then checked, and anything doubtful
//! is recorded as an optimizer complaint rather than raised.

use std::cell::Cell;

use nalgebra::{DMatrix, DVector};
use powersim_dgp::Dataset;
use serde::{Deserialize, Serialize};

use self::{optimizer::Deviance, pls::CrossProducts, theta::ThetaLayout};
use crate::{
    Diagnostics, FitError, FittedModel, Formula, ModelFitter, OptimizerInfo, VarianceComponent,
    frame::ModelFrame,
};

mod optimizer;
mod pls;
mod theta;

pub use self::theta::SINGULAR_TOLERANCE;

const SINGULAR_MESSAGE: &str = "boundary (singular) fit: see is_singular()";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixedModelFitter {
    /// Restricted maximum likelihood when set, maximum likelihood otherwise
    pub reml: bool,
    /// Iteration limit of the covariance-parameter search
    pub max_iters: u64,
}

impl Default for MixedModelFitter {
    fn default() -> Self {
        Self {
            reml: true,
            max_iters: 10_000,
        }
    }
}

impl ModelFitter for MixedModelFitter {
    fn fit(
        &self,
        data: &Dataset,
        formula: &Formula,
        sink: &mut Diagnostics,
    ) -> Result<Box<dyn FittedModel>, FitError> {
        Ok(Box::new(MixedModel::fit(data, formula, self, sink)?))
    }
}

#[derive(Debug, Clone)]
pub struct MixedModel {
    names: Vec<String>,
    beta: DVector<f64>,
    covariance: DMatrix<f64>,
    sigma: f64,
    theta: Vec<f64>,
    components: Vec<VarianceComponent>,
    deviance: f64,
    reml: bool,
    singular: bool,
    optimizer: OptimizerInfo,
}

impl MixedModel {
    /// Fits `formula` to `data`.
    ///
    /// Iteration limits, failed gradient checks and singular fits are recorded in
    /// the returned model and in `sink`; only failures that leave no estimate are
    /// errors.
    pub fn fit(
        data: &Dataset,
        formula: &Formula,
        fitter: &MixedModelFitter,
        sink: &mut Diagnostics,
    ) -> Result<Self, FitError> {
        if !formula.is_mixed() {
            return Err(FitError::UnsupportedFormula {
                formula: formula.to_string(),
            });
        }
        let frame = ModelFrame::new(data, formula)?;
        let cross = CrossProducts::new(&frame);
        let layout = ThetaLayout::new(frame.blocks.iter().map(|block| block.term.dim()));
        let evaluations = Cell::new(0);
        let deviance = Deviance {
            cross: &cross,
            layout: &layout,
            reml: fitter.reml,
            evaluations: &evaluations,
        };

        let theta0 = layout.initial();
        cross.solve(&layout, &theta0, fitter.reml)?;
        let (theta, mut info) = optimizer::minimize(&deviance, &theta0, fitter.max_iters)?;
        let theta = layout.canonicalize(&theta);
        let singular = layout.is_singular(&theta);

        let free = layout
            .diagonal_mask()
            .into_iter()
            .zip(&theta)
            .enumerate()
            .filter(|(_, (diagonal, value))| !(*diagonal && value.abs() < SINGULAR_TOLERANCE))
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        let derivs = optimizer::derivatives(&deviance, &theta, &free);
        info.messages.extend(optimizer::check_gradient(&derivs));

        for message in &info.messages {
            sink.warn(message.clone());
        }
        if singular {
            sink.message(SINGULAR_MESSAGE);
        }

        let solution = cross.solve(&layout, &theta, fitter.reml)?;
        #[expect(clippy::cast_precision_loss)]
        let df = if fitter.reml {
            (cross.n_obs() - cross.n_fixed()) as f64
        } else {
            cross.n_obs() as f64
        };
        let sigma2 = solution.pwrss / df;

        let components = frame
            .blocks
            .iter()
            .zip(layout.factors(&theta))
            .map(|(block, factor)| {
                variance_component(
                    block.term.grouping.name(),
                    &block.term.coefficient_names(),
                    &(&factor * factor.transpose() * sigma2),
                )
            })
            .collect();

        tracing::debug!(
            iterations = info.iterations,
            evaluations = info.evaluations,
            deviance = solution.deviance,
            singular,
            "mixed model fitted"
        );

        Ok(Self {
            names: frame.fixed_names,
            beta: solution.beta(),
            covariance: solution.unscaled_covariance() * sigma2,
            sigma: sigma2.sqrt(),
            theta,
            components,
            deviance: solution.deviance,
            reml: fitter.reml,
            singular,
            optimizer: info,
        })
    }

    /// Covariance parameters in canonical form (non-negative factor diagonals).
    #[must_use]
    pub fn theta(&self) -> &[f64] {
        &self.theta
    }

    /// REML criterion or deviance, depending on the fitting method.
    #[must_use]
    pub fn deviance(&self) -> f64 {
        self.deviance
    }

    #[must_use]
    pub fn is_reml(&self) -> bool {
        self.reml
    }
}

fn variance_component(group: &str, names: &[&str], cov: &DMatrix<f64>) -> VarianceComponent {
    let std_devs = cov.diagonal().iter().map(|v| v.sqrt()).collect::<Vec<f64>>();
    let mut correlations = vec![];
    for i in 1..std_devs.len() {
        for j in 0..i {
            let scale = std_devs[i] * std_devs[j];
            correlations.push(if scale > 0.0 { cov[(i, j)] / scale } else { 0.0 });
        }
    }
    VarianceComponent {
        group: group.to_owned(),
        names: names.iter().map(|&name| name.to_owned()).collect(),
        std_devs,
        correlations,
    }
}

impl FittedModel for MixedModel {
    fn coefficient_names(&self) -> &[String] {
        &self.names
    }

    fn coefficients(&self) -> &DVector<f64> {
        &self.beta
    }

    fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    fn sigma(&self) -> f64 {
        self.sigma
    }

    fn is_singular(&self) -> bool {
        self.singular
    }

    fn optimizer_info(&self) -> &OptimizerInfo {
        &self.optimizer
    }

    fn variance_components(&self) -> &[VarianceComponent] {
        &self.components
    }
}
