//! Point forecasts and prediction intervals.
//!
//! Point forecasts continue the recursion from the final filtered states
//! with zero errors. Intervals come in three classes:
//!
//! | Class | Construction |
//! |-------|--------------|
//! | parametric | `sigma2 * sum(psi_j^2)` with `psi` the impulse response, Normal quantiles |
//! | simulated | Gaussian errors with variance `sigma2`, empirical quantiles |
//! | bootstrap | in-sample residuals resampled with replacement, empirical quantiles |

use std::fmt;

use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;
use smooth_ssm::{ErrorType, SsmError, StructuralMatrices, simulate_path};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::ForecastError;
use crate::fit::GesFit;

/// Number of sample paths behind simulated and bootstrap intervals.
pub const SIMULATED_PATHS: usize = 1000;

/// Prediction interval class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IntervalKind {
    /// Point forecasts only.
    #[default]
    None,
    /// Analytic Normal interval; additive models only.
    Parametric,
    /// Quantiles of paths driven by Gaussian errors.
    Simulated,
    /// Quantiles of paths driven by resampled residuals.
    Bootstrap,
}

impl IntervalKind {
    /// Lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            IntervalKind::None => "none",
            IntervalKind::Parametric => "parametric",
            IntervalKind::Simulated => "simulated",
            IntervalKind::Bootstrap => "bootstrap",
        }
    }
}

impl fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Forecasts over a horizon, optionally with interval bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct Forecast {
    kind: IntervalKind,
    level: Option<f64>,
    point: Array1<f64>,
    bounds: Option<(Array1<f64>, Array1<f64>)>,
}

impl Forecast {
    /// Number of steps ahead.
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    /// Interval class used.
    pub fn kind(&self) -> IntervalKind {
        self.kind
    }

    /// Confidence level, when an interval was built.
    pub fn level(&self) -> Option<f64> {
        self.level
    }

    /// Point forecasts.
    pub fn point(&self) -> &Array1<f64> {
        &self.point
    }

    /// Lower bounds.
    pub fn lower(&self) -> Option<&Array1<f64>> {
        self.bounds.as_ref().map(|(lo, _)| lo)
    }

    /// Upper bounds.
    pub fn upper(&self) -> Option<&Array1<f64>> {
        self.bounds.as_ref().map(|(_, hi)| hi)
    }
}

/// Response of the observation equation to a unit error at step 0, starting
/// from zero states: `psi_0 = 1`, `psi_j = w' F^(j-1) g` for lag-1 models.
pub fn impulse_response(
    matrices: &StructuralMatrices,
    model_lags: &[usize],
    h: usize,
) -> Result<Array1<f64>, SsmError> {
    let max_lag = model_lags.iter().copied().max().unwrap_or(0);
    let initial = Array2::zeros((max_lag, matrices.n_components()));
    let mut errors = Array1::zeros(h);
    if let Some(e) = errors.first_mut() {
        *e = 1.0;
    }
    let occurrence = Array1::ones(h);
    simulate_path(
        matrices,
        model_lags,
        initial.view(),
        errors.view(),
        occurrence.view(),
        ErrorType::Additive,
    )
    .map(|out| out.observations)
}

fn run_from_final(fit: &GesFit, errors: ArrayView1<'_, f64>) -> Result<Array1<f64>, SsmError> {
    let occurrence = Array1::ones(errors.len());
    simulate_path(
        fit.matrices(),
        fit.structure().model_lags(),
        fit.final_states(),
        errors,
        occurrence.view(),
        fit.error_type(),
    )
    .map(|out| out.observations)
}

fn z_score(level: f64) -> Result<f64, ForecastError> {
    let normal = Normal::new(0.0, 1.0).map_err(|_| ForecastError::InvalidLevel { level })?;
    Ok(normal.inverse_cdf((1.0 + level) / 2.0))
}

fn parametric_bounds(
    fit: &GesFit,
    point: &Array1<f64>,
    level: f64,
) -> Result<(Array1<f64>, Array1<f64>), ForecastError> {
    let psi = impulse_response(fit.matrices(), fit.structure().model_lags(), point.len())?;
    let z = z_score(level)?;
    let mut cumulative = 0.0;
    let half_width = psi.mapv(|p| {
        cumulative += p * p;
        z * (fit.sigma2() * cumulative).sqrt()
    });
    Ok((point - &half_width, point + &half_width))
}

/// Runs [`SIMULATED_PATHS`] paths with errors from `draw` and returns the
/// per-step empirical quantiles at `(1 -+ level) / 2`.
fn empirical_bounds<R, D>(
    fit: &GesFit,
    h: usize,
    level: f64,
    rng: &mut R,
    mut draw: D,
) -> Result<(Array1<f64>, Array1<f64>), ForecastError>
where
    R: Rng + ?Sized,
    D: FnMut(&mut R) -> f64,
{
    let mut paths = Array2::zeros((h, SIMULATED_PATHS));
    for mut column in paths.columns_mut() {
        let errors = Array1::from_shape_fn(h, |_| draw(rng));
        column.assign(&run_from_final(fit, errors.view())?);
    }
    let (p_lo, p_hi) = ((1.0 - level) / 2.0, (1.0 + level) / 2.0);
    let mut lower = Array1::zeros(h);
    let mut upper = Array1::zeros(h);
    for (t, row) in paths.rows().into_iter().enumerate() {
        let sorted = smooth_stats::sorted(&row.to_vec());
        lower[t] = smooth_stats::quantile_type7(&sorted, p_lo);
        upper[t] = smooth_stats::quantile_type7(&sorted, p_hi);
    }
    Ok((lower, upper))
}

pub(crate) fn forecast<R: Rng + ?Sized>(
    fit: &GesFit,
    h: usize,
    interval: IntervalKind,
    level: f64,
    rng: &mut R,
) -> Result<Forecast, ForecastError> {
    if interval != IntervalKind::None && !(level > 0.0 && level < 1.0) {
        return Err(ForecastError::InvalidLevel { level });
    }
    if interval == IntervalKind::Parametric && fit.error_type() == ErrorType::Multiplicative {
        return Err(ForecastError::UnsupportedInterval {
            interval: interval.name(),
        });
    }

    let point = run_from_final(fit, Array1::zeros(h).view())?;
    let bounds = match interval {
        IntervalKind::None => None,
        IntervalKind::Parametric => Some(parametric_bounds(fit, &point, level)?),
        IntervalKind::Simulated => {
            let normal = rand_distr::Normal::new(0.0, fit.sigma2().sqrt())
                .map_err(|_| ForecastError::NonFiniteData)?;
            Some(empirical_bounds(fit, h, level, rng, |r| {
                rand_distr::Distribution::sample(&normal, r)
            })?)
        }
        IntervalKind::Bootstrap => {
            let residuals = fit.residuals();
            Some(empirical_bounds(fit, h, level, rng, |r| {
                if residuals.is_empty() {
                    0.0
                } else {
                    residuals[r.random_range(0..residuals.len())]
                }
            })?)
        }
    };
    tracing::debug!(h, %interval, "forecast built");

    Ok(Forecast {
        kind: interval,
        level: bounds.as_ref().map(|_| level),
        point,
        bounds,
    })
}
