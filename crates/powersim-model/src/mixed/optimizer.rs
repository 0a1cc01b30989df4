//! Nelder-Mead search over `θ` and the post-fit convergence checks.

use std::cell::Cell;

use argmin::{
    core::{CostFunction, Executor, State as _, TerminationReason, TerminationStatus},
    solver::neldermead::NelderMead,
};
use nalgebra::{Cholesky, DMatrix, DVector};

use super::{pls::CrossProducts, theta::ThetaLayout};
use crate::{FitError, OptimizerInfo};

/// Edge length of the initial simplex around the starting point.
const INITIAL_STEP: f64 = 0.1;
/// Nelder-Mead stops once the deviances at the simplex vertices agree this closely.
const SD_TOLERANCE: f64 = 1e-10;
/// Step of the finite-difference derivatives.
const DERIV_STEP: f64 = 1e-4;
/// Largest acceptable scaled gradient component.
pub(crate) const GRADIENT_TOLERANCE: f64 = 0.002;

pub(crate) const OPTIMIZER_NAME: &str = "Nelder-Mead";

/// Profiled deviance as a function of `θ`.
#[derive(Clone, Copy)]
pub(crate) struct Deviance<'a> {
    pub(crate) cross: &'a CrossProducts,
    pub(crate) layout: &'a ThetaLayout,
    pub(crate) reml: bool,
    pub(crate) evaluations: &'a Cell<usize>,
}

impl Deviance<'_> {
    /// Deviance at `theta`, infinite wherever the penalized system breaks down so
    /// that the simplex moves away from it.
    pub(crate) fn eval(&self, theta: &[f64]) -> f64 {
        self.evaluations.set(self.evaluations.get() + 1);
        match self.cross.solve(self.layout, theta, self.reml) {
            Ok(solution) if solution.deviance.is_finite() => solution.deviance,
            _ => f64::INFINITY,
        }
    }
}

impl CostFunction for Deviance<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        Ok(self.eval(theta))
    }
}

fn optimizer_error(err: &argmin::core::Error) -> FitError {
    FitError::Optimizer {
        message: err.to_string(),
    }
}

/// Minimizes the deviance starting from `theta0`.
///
/// Returns the best `θ` found together with the optimizer metadata. Reaching
/// `max_iters` is recorded as a complaint, not an error.
pub(crate) fn minimize(
    deviance: &Deviance<'_>,
    theta0: &[f64],
    max_iters: u64,
) -> Result<(Vec<f64>, OptimizerInfo), FitError> {
    let mut simplex = vec![theta0.to_vec()];
    for i in 0..theta0.len() {
        let mut vertex = theta0.to_vec();
        vertex[i] += INITIAL_STEP;
        simplex.push(vertex);
    }
    let solver = NelderMead::<Vec<f64>, f64>::new(simplex)
        .with_sd_tolerance(SD_TOLERANCE)
        .map_err(|e| optimizer_error(&e))?;
    let res = Executor::new(*deviance, solver)
        .configure(|state| state.max_iters(max_iters))
        .run()
        .map_err(|e| optimizer_error(&e))?;

    let state = res.state();
    let theta = state
        .get_best_param()
        .cloned()
        .ok_or_else(|| FitError::Optimizer {
            message: "no parameter was evaluated".to_owned(),
        })?;

    let mut messages = vec![];
    if *state.get_termination_status()
        == TerminationStatus::Terminated(TerminationReason::MaxItersReached)
    {
        messages.push(format!(
            "maximum number of iterations ({max_iters}) reached without convergence"
        ));
    }

    let info = OptimizerInfo {
        optimizer: OPTIMIZER_NAME.to_owned(),
        iterations: state.get_iter(),
        evaluations: deviance.evaluations.get(),
        messages,
    };
    Ok((theta, info))
}

#[derive(Debug, Clone)]
pub(crate) struct Derivatives {
    pub(crate) gradient: DVector<f64>,
    pub(crate) hessian: DMatrix<f64>,
}

/// Central finite-difference gradient and Hessian of the deviance over the
/// coordinates in `free`.
pub(crate) fn derivatives(deviance: &Deviance<'_>, theta: &[f64], free: &[usize]) -> Derivatives {
    let m = free.len();
    let h = DERIV_STEP;
    let at = |steps: &[(usize, f64)]| {
        let mut point = theta.to_vec();
        for &(i, step) in steps {
            point[free[i]] += step;
        }
        deviance.eval(&point)
    };

    let f0 = at(&[]);
    let mut gradient = DVector::zeros(m);
    let mut hessian = DMatrix::zeros(m, m);
    for i in 0..m {
        let plus = at(&[(i, h)]);
        let minus = at(&[(i, -h)]);
        gradient[i] = (plus - minus) / (2.0 * h);
        hessian[(i, i)] = (plus - 2.0 * f0 + minus) / (h * h);
        for j in 0..i {
            let pp = at(&[(i, h), (j, h)]);
            let pm = at(&[(i, h), (j, -h)]);
            let mp = at(&[(i, -h), (j, h)]);
            let mm = at(&[(i, -h), (j, -h)]);
            let value = (pp - pm - mp + mm) / (4.0 * h * h);
            hessian[(i, j)] = value;
            hessian[(j, i)] = value;
        }
    }
    Derivatives { gradient, hessian }
}

/// Complaints raised by the gradient check at the optimum.
///
/// The gradient is scaled by the Cholesky factor of the Hessian. A component is
/// only reported when both its scaled and its raw magnitude exceed the tolerance.
pub(crate) fn check_gradient(derivs: &Derivatives) -> Vec<String> {
    if derivs.gradient.is_empty() {
        return vec![];
    }
    if !derivs.gradient.iter().all(|g| g.is_finite())
        || !derivs.hessian.iter().all(|h| h.is_finite())
    {
        return vec!["unable to evaluate scaled gradient".to_owned()];
    }
    let Some(chol) = Cholesky::new(derivs.hessian.clone()) else {
        return vec![
            "unable to evaluate scaled gradient".to_owned(),
            "Model failed to converge: degenerate Hessian".to_owned(),
        ];
    };
    let mut scaled = derivs.gradient.clone();
    if !chol.l_dirty().tr_solve_lower_triangular_mut(&mut scaled) {
        return vec!["Model failed to converge: degenerate Hessian".to_owned()];
    }

    let max_grad = scaled
        .iter()
        .zip(&derivs.gradient)
        .map(|(s, g)| s.abs().min(g.abs()))
        .fold(0.0, f64::max);
    if max_grad > GRADIENT_TOLERANCE {
        vec![format!(
            "Model failed to converge with max|grad| = {max_grad:.6} (tol = {GRADIENT_TOLERANCE})"
        )]
    } else {
        vec![]
    }
}
