//! Nelder-Mead estimation of GES models.
//!
//! Wraps the `argmin` crate to minimise the in-sample mean squared
//! one-step error over every entry of `F`, `w`, `g` and the initial block.
//!
//! **Not part of the public API.**

use argmin::core::{CostFunction, Executor};
use argmin::solver::neldermead::NelderMead;
use ndarray::{Array1, Array2, ArrayView1};
use smooth_ssm::{ErrorType, LagStructure, SsmError, StructuralMatrices, filter_path};
use tracing::debug;

use crate::error::ForecastError;
use crate::fit::GesFit;
use crate::spec::GesSpec;

const MAX_ITERS: u64 = 2000;
const SD_TOLERANCE: f64 = 1e-8;
const START_PERSISTENCE: f64 = 0.1;
const SIMPLEX_STEP: f64 = 0.1;

/// Position of each estimated quantity in the flat parameter vector:
/// `F` row-major, then `w`, `g`, and the initial block row-major.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ParamLayout {
    n: usize,
    max_lag: usize,
}

impl ParamLayout {
    pub(crate) fn new(n_components: usize, max_lag: usize) -> Self {
        Self {
            n: n_components,
            max_lag,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.n * self.n + 2 * self.n + self.max_lag * self.n
    }

    /// Splits a parameter vector into matrices and initial block.
    pub(crate) fn unpack(
        &self,
        params: &[f64],
    ) -> Result<(StructuralMatrices, Array2<f64>), SsmError> {
        let n = self.n;
        if params.len() != self.len() {
            return Err(SsmError::ShapeMismatch {
                name: "parameters",
                expected: vec![self.len()],
                got: vec![params.len()],
            });
        }
        let (f, rest) = params.split_at(n * n);
        let (w, rest) = rest.split_at(n);
        let (g, initial) = rest.split_at(n);
        let transition = Array2::from_shape_fn((n, n), |(i, j)| f[i * n + j]);
        let matrices = StructuralMatrices::new(
            transition,
            Array1::from(w.to_vec()),
            Array1::from(g.to_vec()),
        )?;
        let initial = Array2::from_shape_fn((self.max_lag, n), |(r, c)| initial[r * n + c]);
        Ok((matrices, initial))
    }

    /// Identity transition, unit measurement, small persistence; the first
    /// component starts at the mean of the first `max_lag` observations
    /// (its logarithm for multiplicative models).
    pub(crate) fn starting_point(&self, data: &[f64], error_type: ErrorType) -> Vec<f64> {
        let n = self.n;
        let head = &data[..self.max_lag.min(data.len())];
        let level = match error_type {
            ErrorType::Additive => smooth_stats::mean(head),
            ErrorType::Multiplicative => smooth_stats::mean(head).ln(),
        };

        let mut x = Vec::with_capacity(self.len());
        x.extend((0..n * n).map(|k| if k / n == k % n { 1.0 } else { 0.0 }));
        x.extend(std::iter::repeat_n(1.0, n));
        x.extend(std::iter::repeat_n(START_PERSISTENCE, n));
        for _ in 0..self.max_lag {
            x.push(level);
            x.extend(std::iter::repeat_n(0.0, n - 1));
        }
        x
    }
}

/// Start vertex plus one vertex per coordinate, each moved by a step
/// relative to the coordinate's magnitude.
fn initial_simplex(start: &[f64]) -> Vec<Vec<f64>> {
    let mut simplex = Vec::with_capacity(start.len() + 1);
    simplex.push(start.to_vec());
    for i in 0..start.len() {
        let mut vertex = start.to_vec();
        vertex[i] += SIMPLEX_STEP * start[i].abs().max(1.0);
        simplex.push(vertex);
    }
    simplex
}

fn validate(data: &[f64], error_type: ErrorType, min: usize) -> Result<(), ForecastError> {
    if data.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if data.iter().any(|x| !x.is_finite()) {
        return Err(ForecastError::NonFiniteData);
    }
    if error_type == ErrorType::Multiplicative && data.iter().any(|&x| x <= 0.0) {
        return Err(ForecastError::NonPositiveData);
    }
    if data.len() < min {
        return Err(ForecastError::InsufficientData {
            n: data.len(),
            min,
        });
    }
    Ok(())
}

/// Gaussian log-likelihood of the one-step errors; multiplicative models add
/// the Jacobian of `y = yhat (1 + e)`.
pub(crate) fn log_likelihood(residuals: &[f64], fitted: &[f64], error_type: ErrorType) -> f64 {
    let ll = smooth_stats::gaussian_log_likelihood(residuals);
    match error_type {
        ErrorType::Additive => ll,
        ErrorType::Multiplicative => ll - fitted.iter().map(|y| y.abs().ln()).sum::<f64>(),
    }
}

/// Fits a GES model to data.
///
/// 1. Normalise the lag structure and validate the data
/// 2. Build a starting simplex around identity `F`, unit `w`
/// 3. Minimise the mean squared one-step error with Nelder-Mead
/// 4. Filter once more at the optimum for states, fitted values, residuals
#[tracing::instrument(skip_all, fields(n = data.len()))]
pub(crate) fn fit_ges(spec: &GesSpec, data: &[f64]) -> Result<GesFit, ForecastError> {
    let structure = LagStructure::new(spec.orders(), spec.lags())?;
    let error_type = spec.error_type();
    let layout = ParamLayout::new(structure.n_components(), structure.max_lag());
    validate(data, error_type, structure.max_lag() + layout.len() + 1)?;

    let series = ArrayView1::from(data);
    let cost = GesCost {
        layout,
        model_lags: structure.model_lags(),
        data: series,
        error_type,
    };

    let solver = NelderMead::new(initial_simplex(&layout.starting_point(data, error_type)))
        .with_sd_tolerance(SD_TOLERANCE)
        .map_err(|_| ForecastError::OptimizationFailed)?;
    let result = Executor::new(cost, solver)
        .configure(|state| state.max_iters(MAX_ITERS))
        .run()
        .map_err(|_| ForecastError::OptimizationFailed)?;

    let state = result.state();
    if !state.best_cost.is_finite() || state.best_cost == f64::MAX {
        return Err(ForecastError::OptimizationFailed);
    }
    let best = state
        .best_param
        .as_ref()
        .ok_or(ForecastError::OptimizationFailed)?;
    debug!(iters = state.iter, mse = state.best_cost, "nelder-mead finished");

    let (matrices, initial) = layout.unpack(best)?;
    let out = filter_path(
        &matrices,
        structure.model_lags(),
        initial.view(),
        series,
        error_type,
    )?;
    let residuals = out.residuals.to_vec();
    let fitted = out.fitted.to_vec();
    let sigma2 = smooth_stats::mean_square(&residuals);
    let ll = log_likelihood(&residuals, &fitted, error_type);

    Ok(GesFit::new(
        spec.clone(),
        structure,
        matrices,
        initial,
        out.states,
        fitted,
        residuals,
        sigma2,
        ll,
        layout.len(),
    ))
}

/// Cost function for argmin: mean squared one-step error.
struct GesCost<'a> {
    layout: ParamLayout,
    model_lags: &'a [usize],
    data: ArrayView1<'a, f64>,
    error_type: ErrorType,
}

impl CostFunction for GesCost<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        let Ok((matrices, initial)) = self.layout.unpack(params) else {
            return Ok(f64::MAX);
        };
        if !matrices.is_stable() {
            return Ok(f64::MAX);
        }
        match filter_path(
            &matrices,
            self.model_lags,
            initial.view(),
            self.data,
            self.error_type,
        ) {
            Ok(out) => {
                let mse = out
                    .residuals
                    .as_slice()
                    .map_or(f64::MAX, smooth_stats::mean_square);
                Ok(if mse.is_finite() { mse } else { f64::MAX })
            }
            Err(_) => Ok(f64::MAX),
        }
    }
}
