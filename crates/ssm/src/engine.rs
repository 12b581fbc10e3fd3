//! State-space recursion engine.
//!
//! For every time step `t = max_lag .. max_lag + obs`:
//!
//! ```text
//! v[t][c]  = state[t - model_lags[c], c]
//! yhat[t]  = w' v[t]                       (additive)
//!          = exp(w' v[t])                  (multiplicative, log-domain states)
//! y[t]     = o[t] (yhat[t] + e[t])         (additive)
//!          = o[t] yhat[t] (1 + e[t])       (multiplicative)
//! state[t] = F v[t] + g e[t] o[t]          (additive)
//!          = F v[t] + g ln(1 + e[t]) o[t]  (multiplicative)
//! ```
//!
//! Step `t` reads only rows `< t`, so a path is strictly sequential; paths
//! are independent and run in parallel in [`simulate_batch`].

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};
use rayon::prelude::*;

use crate::error::SsmError;
use crate::matrices::StructuralMatrices;

/// How the error enters the measurement and state equations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// `y = yhat + e`.
    #[default]
    Additive,
    /// `y = yhat (1 + e)`, with states held in the log domain.
    Multiplicative,
}

impl ErrorType {
    /// Single-letter code used in model names (`"A"` / `"M"`).
    pub fn code(&self) -> &'static str {
        match self {
            ErrorType::Additive => "A",
            ErrorType::Multiplicative => "M",
        }
    }
}

/// Output of one simulated path.
#[derive(Clone, Debug, PartialEq)]
pub struct PathOutput {
    /// State trajectory, shape `(max_lag + obs, n_components)`. The first
    /// `max_lag` rows are the initial block.
    pub states: Array2<f64>,
    /// Observed series, length `obs`.
    pub observations: Array1<f64>,
    /// Realised errors, length `obs`.
    pub errors: Array1<f64>,
}

/// Output of filtering an observed series.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterOutput {
    /// State trajectory, shape `(max_lag + obs, n_components)`.
    pub states: Array2<f64>,
    /// One-step-ahead fitted values `yhat`.
    pub fitted: Array1<f64>,
    /// One-step-ahead errors on the scale of the error type.
    pub residuals: Array1<f64>,
}

/// Borrowed inputs of one path for [`simulate_batch`].
#[derive(Clone, Copy, Debug)]
pub struct PathInputs<'a> {
    /// Realised structural matrices of the path.
    pub matrices: &'a StructuralMatrices,
    /// Initial block, shape `(max_lag, n_components)`.
    pub initial: ArrayView2<'a, f64>,
    /// Errors, length `obs`.
    pub errors: ArrayView1<'a, f64>,
    /// Occurrence mask, length `obs`.
    pub occurrence: ArrayView1<'a, f64>,
}

fn check_layout(
    matrices: &StructuralMatrices,
    model_lags: &[usize],
    initial: &ArrayView2<'_, f64>,
) -> Result<usize, SsmError> {
    let n = matrices.n_components();
    if model_lags.len() != n {
        return Err(SsmError::ShapeMismatch {
            name: "model_lags",
            expected: vec![n],
            got: vec![model_lags.len()],
        });
    }
    let max_lag = model_lags.iter().copied().max().unwrap_or(0);
    if max_lag == 0 || model_lags.contains(&0) {
        return Err(SsmError::EmptyModel);
    }
    if initial.dim() != (max_lag, n) {
        return Err(SsmError::ShapeMismatch {
            name: "initial",
            expected: vec![max_lag, n],
            got: initial.shape().to_vec(),
        });
    }
    Ok(max_lag)
}

/// Runs the recursion for `n_obs` steps.
///
/// `step(i, level)` receives the observation index and `w' v[t]`, and returns
/// the innovation that multiplies `g` in the state update.
fn recurse<S>(
    matrices: &StructuralMatrices,
    model_lags: &[usize],
    initial: ArrayView2<'_, f64>,
    n_obs: usize,
    mut step: S,
) -> Result<Array2<f64>, SsmError>
where
    S: FnMut(usize, f64) -> Result<f64, SsmError>,
{
    let max_lag = check_layout(matrices, model_lags, &initial)?;
    let n = matrices.n_components();
    let (f, w, g) = (
        matrices.transition(),
        matrices.measurement(),
        matrices.persistence(),
    );

    let mut states = Array2::zeros((max_lag + n_obs, n));
    states
        .slice_mut(s![..max_lag, ..])
        .assign(&initial);

    let mut v = Array1::zeros(n);
    for i in 0..n_obs {
        let t = max_lag + i;
        for (c, &lag) in model_lags.iter().enumerate() {
            v[c] = states[[t - lag, c]];
        }
        let innovation = step(i, w.dot(&v))?;
        let mut row = states.row_mut(t);
        row.assign(&f.dot(&v));
        row.scaled_add(innovation, g);
    }
    Ok(states)
}

/// Simulates one path from fixed inputs.
///
/// Deterministic: identical inputs give bit-identical outputs.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`SsmError::ShapeMismatch`] | `model_lags`, `initial`, `errors` or `occurrence` disagree with the model |
/// | [`SsmError::EmptyModel`] | a zero lag in `model_lags` |
/// | [`SsmError::NonPositiveMultiplicativeError`] | multiplicative `1 + e <= 0` on an observed step |
pub fn simulate_path(
    matrices: &StructuralMatrices,
    model_lags: &[usize],
    initial: ArrayView2<'_, f64>,
    errors: ArrayView1<'_, f64>,
    occurrence: ArrayView1<'_, f64>,
    error_type: ErrorType,
) -> Result<PathOutput, SsmError> {
    let n_obs = errors.len();
    if occurrence.len() != n_obs {
        return Err(SsmError::ShapeMismatch {
            name: "occurrence",
            expected: vec![n_obs],
            got: vec![occurrence.len()],
        });
    }

    let mut observations = Array1::zeros(n_obs);
    let states = recurse(matrices, model_lags, initial, n_obs, |i, level| {
        let (e, o) = (errors[i], occurrence[i]);
        match error_type {
            ErrorType::Additive => {
                observations[i] = o * (level + e);
                Ok(e * o)
            }
            ErrorType::Multiplicative => {
                let factor = 1.0 + e;
                if o == 0.0 {
                    observations[i] = 0.0;
                    return Ok(0.0);
                }
                if factor <= 0.0 || !factor.is_finite() {
                    return Err(SsmError::NonPositiveMultiplicativeError { step: i, factor });
                }
                observations[i] = o * level.exp() * factor;
                Ok(factor.ln() * o)
            }
        }
    })?;

    Ok(PathOutput {
        states,
        observations,
        errors: errors.to_owned(),
    })
}

/// Simulates many paths in parallel.
///
/// Each path owns its outputs; the returned vector preserves input order.
///
/// # Errors
///
/// The first error of any path, as in [`simulate_path`].
#[tracing::instrument(skip_all, fields(paths = inputs.len()))]
pub fn simulate_batch(
    model_lags: &[usize],
    error_type: ErrorType,
    inputs: &[PathInputs<'_>],
) -> Result<Vec<PathOutput>, SsmError> {
    inputs
        .par_iter()
        .map(|p| {
            simulate_path(
                p.matrices,
                model_lags,
                p.initial,
                p.errors,
                p.occurrence,
                error_type,
            )
        })
        .collect()
}

/// Filters an observed series through the model.
///
/// The one-step error is `y - yhat` (additive) or `(y - yhat) / yhat`
/// (multiplicative) and drives the same state update as simulation.
///
/// # Errors
///
/// Shape errors as in [`simulate_path`], and
/// [`SsmError::NonPositiveMultiplicativeError`] when a multiplicative model
/// meets a non-positive observation.
pub fn filter_path(
    matrices: &StructuralMatrices,
    model_lags: &[usize],
    initial: ArrayView2<'_, f64>,
    data: ArrayView1<'_, f64>,
    error_type: ErrorType,
) -> Result<FilterOutput, SsmError> {
    let n_obs = data.len();
    let mut fitted = Array1::zeros(n_obs);
    let mut residuals = Array1::zeros(n_obs);

    let states = recurse(matrices, model_lags, initial, n_obs, |i, level| {
        let y = data[i];
        match error_type {
            ErrorType::Additive => {
                fitted[i] = level;
                residuals[i] = y - level;
                Ok(residuals[i])
            }
            ErrorType::Multiplicative => {
                let yhat = level.exp();
                fitted[i] = yhat;
                let e = (y - yhat) / yhat;
                residuals[i] = e;
                let factor = 1.0 + e;
                if factor <= 0.0 || !factor.is_finite() {
                    return Err(SsmError::NonPositiveMultiplicativeError { step: i, factor });
                }
                Ok(factor.ln())
            }
        }
    })?;

    Ok(FilterOutput {
        states,
        fitted,
        residuals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn local_level(alpha: f64) -> StructuralMatrices {
        StructuralMatrices::new(array![[1.0]], array![1.0], array![alpha]).unwrap()
    }

    #[test]
    fn local_level_by_hand() {
        let m = local_level(0.5);
        let init = array![[10.0]];
        let e = array![1.0, -2.0, 0.5];
        let o = array![1.0, 1.0, 1.0];
        let out = simulate_path(&m, &[1], init.view(), e.view(), o.view(), ErrorType::Additive)
            .unwrap();
        // level: 10 → 10.5 → 9.5 → 9.75
        assert_abs_diff_eq!(out.observations[0], 11.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out.observations[1], 8.5, epsilon = 1e-12);
        assert_abs_diff_eq!(out.observations[2], 10.0, epsilon = 1e-12);
        assert_eq!(out.states.dim(), (4, 1));
        assert_abs_diff_eq!(out.states[[3, 0]], 9.75, epsilon = 1e-12);
        assert_eq!(out.errors, e);
    }

    #[test]
    fn seasonal_lag_reads_from_lag_rows_back() {
        // Pure seasonal component with lag 3, no persistence: the initial
        // block repeats.
        let m = StructuralMatrices::new(array![[1.0]], array![1.0], array![0.0]).unwrap();
        let init = array![[1.0], [2.0], [3.0]];
        let e = Array1::zeros(6);
        let o = Array1::ones(6);
        let out = simulate_path(&m, &[3], init.view(), e.view(), o.view(), ErrorType::Additive)
            .unwrap();
        assert_eq!(out.observations, array![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn zero_occurrence_suppresses_update() {
        let m = local_level(0.5);
        let init = array![[4.0]];
        let e = array![2.0, 2.0];
        let o = array![0.0, 1.0];
        let out = simulate_path(&m, &[1], init.view(), e.view(), o.view(), ErrorType::Additive)
            .unwrap();
        assert_eq!(out.observations[0], 0.0);
        assert_abs_diff_eq!(out.states[[1, 0]], 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out.observations[1], 6.0, epsilon = 1e-12);
    }

    #[test]
    fn multiplicative_log_domain() {
        let m = local_level(1.0);
        let init = array![[100.0_f64.ln()]];
        let e = array![0.1, -0.5];
        let o = array![1.0, 1.0];
        let out = simulate_path(
            &m,
            &[1],
            init.view(),
            e.view(),
            o.view(),
            ErrorType::Multiplicative,
        )
        .unwrap();
        assert_abs_diff_eq!(out.observations[0], 110.0, epsilon = 1e-9);
        // With alpha = 1 the level follows the observation.
        assert_abs_diff_eq!(out.observations[1], 55.0, epsilon = 1e-9);
    }

    #[test]
    fn multiplicative_non_positive_factor() {
        let m = local_level(1.0);
        let init = array![[0.0]];
        let e = array![-1.5];
        let o = array![1.0];
        let err = simulate_path(
            &m,
            &[1],
            init.view(),
            e.view(),
            o.view(),
            ErrorType::Multiplicative,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SsmError::NonPositiveMultiplicativeError { step: 0, .. }
        ));

        // Unobserved steps never take the logarithm.
        let o = array![0.0];
        assert!(
            simulate_path(
                &m,
                &[1],
                init.view(),
                e.view(),
                o.view(),
                ErrorType::Multiplicative
            )
            .is_ok()
        );
    }

    #[test]
    fn shape_errors() {
        let m = local_level(0.1);
        let e = array![0.0];
        let o = array![1.0, 1.0];
        let init = array![[0.0]];
        assert!(matches!(
            simulate_path(&m, &[1], init.view(), e.view(), o.view(), ErrorType::Additive),
            Err(SsmError::ShapeMismatch {
                name: "occurrence",
                ..
            })
        ));
        let o = array![1.0];
        let init2 = array![[0.0], [0.0]];
        assert!(matches!(
            simulate_path(&m, &[1], init2.view(), e.view(), o.view(), ErrorType::Additive),
            Err(SsmError::ShapeMismatch { name: "initial", .. })
        ));
        assert!(matches!(
            simulate_path(&m, &[1, 1], init.view(), e.view(), o.view(), ErrorType::Additive),
            Err(SsmError::ShapeMismatch {
                name: "model_lags",
                ..
            })
        ));
    }

    #[test]
    fn filter_recovers_errors() {
        let m = StructuralMatrices::new(
            array![[1.0, 1.0], [0.0, 0.9]],
            array![1.0, 1.0],
            array![0.3, 0.1],
        )
        .unwrap();
        let init = array![[50.0, 1.0]];
        let e = array![0.5, -1.0, 2.0, 0.0, -0.3, 1.1];
        let o = Array1::ones(6);
        let sim = simulate_path(&m, &[1, 1], init.view(), e.view(), o.view(), ErrorType::Additive)
            .unwrap();
        let fil = filter_path(
            &m,
            &[1, 1],
            init.view(),
            sim.observations.view(),
            ErrorType::Additive,
        )
        .unwrap();
        for (r, x) in fil.residuals.iter().zip(e.iter()) {
            assert_abs_diff_eq!(r, x, epsilon = 1e-9);
        }
        for (a, b) in fil.states.iter().zip(sim.states.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn filter_multiplicative_recovers_errors() {
        let m = local_level(0.4);
        let init = array![[20.0_f64.ln()]];
        let e = array![0.05, -0.1, 0.2];
        let o = Array1::ones(3);
        let sim = simulate_path(
            &m,
            &[1],
            init.view(),
            e.view(),
            o.view(),
            ErrorType::Multiplicative,
        )
        .unwrap();
        let fil = filter_path(
            &m,
            &[1],
            init.view(),
            sim.observations.view(),
            ErrorType::Multiplicative,
        )
        .unwrap();
        for (r, x) in fil.residuals.iter().zip(e.iter()) {
            assert_abs_diff_eq!(r, x, epsilon = 1e-9);
        }
    }

    #[test]
    fn batch_preserves_order() {
        let a = local_level(0.1);
        let b = local_level(0.9);
        let init_a = array![[1.0]];
        let init_b = array![[100.0]];
        let e = array![1.0, 1.0];
        let o = Array1::ones(2);
        let inputs = [
            PathInputs {
                matrices: &a,
                initial: init_a.view(),
                errors: e.view(),
                occurrence: o.view(),
            },
            PathInputs {
                matrices: &b,
                initial: init_b.view(),
                errors: e.view(),
                occurrence: o.view(),
            },
        ];
        let out = simulate_batch(&[1], ErrorType::Additive, &inputs).unwrap();
        assert_eq!(out.len(), 2);
        assert_abs_diff_eq!(out[0].observations[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[1].observations[0], 101.0, epsilon = 1e-12);
    }

    #[test]
    fn error_type_default_and_code() {
        assert_eq!(ErrorType::default(), ErrorType::Additive);
        assert_eq!(ErrorType::Additive.code(), "A");
        assert_eq!(ErrorType::Multiplicative.code(), "M");
    }
}
