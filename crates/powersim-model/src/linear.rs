//! Ordinary least squares.
//!
//! With an intercept-only formula this is exactly the one-sample t-test: the
//! estimate is the sample mean, its standard error `s / √n`, and the p-value comes
//! from Student's t with `n - 1` degrees of freedom.

use nalgebra::{Cholesky, DMatrix, DVector};
use powersim_dgp::Dataset;
use powersim_stats::distribution;

use crate::{
    Diagnostics, FitError, FittedModel, Formula, ModelFitter, OptimizerInfo, TidyRow,
    frame::ModelFrame,
};

#[derive(Debug, Clone)]
pub struct LinearModel {
    names: Vec<String>,
    beta: DVector<f64>,
    covariance: DMatrix<f64>,
    sigma: f64,
    df_residual: usize,
    rows: Vec<TidyRow>,
    optimizer: OptimizerInfo,
}

impl LinearModel {
    pub fn fit(data: &Dataset, formula: &Formula) -> Result<Self, FitError> {
        if formula.is_mixed() {
            return Err(FitError::UnsupportedFormula {
                formula: formula.to_string(),
            });
        }
        let frame = ModelFrame::new(data, formula)?;
        let n = frame.n_obs();
        let p = frame.n_fixed();

        let xtx = frame.x.tr_mul(&frame.x);
        let chol = Cholesky::new(xtx).ok_or(FitError::RankDeficient)?;
        let beta = chol.solve(&frame.x.tr_mul(&frame.y));
        let residuals = &frame.y - &frame.x * &beta;

        let df_residual = n - p;
        #[expect(clippy::cast_precision_loss)]
        let df = df_residual as f64;
        let sigma2 = residuals.norm_squared() / df;
        let covariance = chol.inverse() * sigma2;

        let rows = (0..p)
            .map(|j| {
                let estimate = beta[j];
                let std_error = covariance[(j, j)].sqrt();
                let statistic = estimate / std_error;
                let p_value = distribution::student_t_p_value(statistic, df)
                    .map_err(FitError::Distribution)?;
                Ok(TidyRow {
                    estimate,
                    std_error,
                    statistic,
                    p_value,
                })
            })
            .collect::<Result<Vec<_>, FitError>>()?;

        Ok(Self {
            names: frame.fixed_names,
            beta,
            covariance,
            sigma: sigma2.sqrt(),
            df_residual,
            rows,
            optimizer: OptimizerInfo {
                optimizer: "least squares".to_owned(),
                ..OptimizerInfo::default()
            },
        })
    }

    #[must_use]
    pub fn df_residual(&self) -> usize {
        self.df_residual
    }
}

impl FittedModel for LinearModel {
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
        false
    }

    fn optimizer_info(&self) -> &OptimizerInfo {
        &self.optimizer
    }

    fn tidy(&self, name: &str) -> Option<TidyRow> {
        self.coefficient_index(name).map(|index| self.rows[index])
    }
}

/// Fits formulas without random terms by least squares.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearModelFitter;

impl ModelFitter for LinearModelFitter {
    fn fit(
        &self,
        data: &Dataset,
        formula: &Formula,
        _sink: &mut Diagnostics,
    ) -> Result<Box<dyn FittedModel>, FitError> {
        Ok(Box::new(LinearModel::fit(data, formula)?))
    }
}
