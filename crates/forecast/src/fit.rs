//! Fitted GES model results.

use ndarray::{Array2, ArrayView2, s};
use rand::Rng;
use smooth_ssm::{ErrorType, LagStructure, StructuralMatrices};

use crate::error::ForecastError;
use crate::forecast::{Forecast, IntervalKind};
use crate::spec::GesSpec;

/// A fitted GES model produced by [`GesSpec::fit()`].
///
/// Holds the estimated matrices and initial block, the filtered state
/// trajectory, one-step fitted values and residuals. Call
/// [`GesFit::forecast()`] to extend the series.
///
/// ```mermaid
/// graph LR
///     B["GesFit"] --> C[".matrices()"]
///     B --> D[".sigma2()"]
///     B --> E[".aic() / .aicc() / .bic()"]
///     B --> F[".forecast(h, interval, level, &mut rng)"]
/// ```
#[derive(Clone, Debug)]
pub struct GesFit {
    spec: GesSpec,
    structure: LagStructure,
    matrices: StructuralMatrices,
    initial: Array2<f64>,
    states: Array2<f64>,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
    sigma2: f64,
    log_likelihood: f64,
    n_params: usize,
}

impl GesFit {
    /// Creates a new `GesFit` (crate-internal constructor).
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        spec: GesSpec,
        structure: LagStructure,
        matrices: StructuralMatrices,
        initial: Array2<f64>,
        states: Array2<f64>,
        fitted: Vec<f64>,
        residuals: Vec<f64>,
        sigma2: f64,
        log_likelihood: f64,
        n_params: usize,
    ) -> Self {
        Self {
            spec,
            structure,
            matrices,
            initial,
            states,
            fitted,
            residuals,
            sigma2,
            log_likelihood,
            n_params,
        }
    }

    /// Returns the [`GesSpec`] that produced this fit.
    pub fn spec(&self) -> &GesSpec {
        &self.spec
    }

    /// Normalised lag structure.
    pub fn structure(&self) -> &LagStructure {
        &self.structure
    }

    /// Error type of the model.
    pub fn error_type(&self) -> ErrorType {
        self.spec.error_type()
    }

    /// Estimated `F`, `w`, `g`.
    pub fn matrices(&self) -> &StructuralMatrices {
        &self.matrices
    }

    /// Estimated initial block, shape `(max_lag, n_components)`.
    pub fn initial(&self) -> &Array2<f64> {
        &self.initial
    }

    /// Filtered state trajectory, shape `(max_lag + n, n_components)`.
    pub fn states(&self) -> &Array2<f64> {
        &self.states
    }

    /// The last `max_lag` state rows, from which forecasts start.
    pub fn final_states(&self) -> ArrayView2<'_, f64> {
        let max_lag = self.structure.max_lag();
        let rows = self.states.nrows();
        self.states.slice(s![rows - max_lag.min(rows).., ..])
    }

    /// One-step-ahead fitted values.
    pub fn fitted(&self) -> &[f64] {
        &self.fitted
    }

    /// One-step-ahead errors (relative errors for multiplicative models).
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Mean squared one-step error.
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Log-likelihood at the optimum.
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Number of estimated parameters, excluding the variance.
    pub fn n_params(&self) -> usize {
        self.n_params
    }

    /// Number of observations the model was fitted to.
    pub fn n_obs(&self) -> usize {
        self.residuals.len()
    }

    /// Akaike Information Criterion with `k = n_params + 1`.
    pub fn aic(&self) -> f64 {
        smooth_stats::aic(self.log_likelihood, self.n_params + 1)
    }

    /// Small-sample corrected AIC.
    pub fn aicc(&self) -> f64 {
        smooth_stats::aicc(self.log_likelihood, self.n_params + 1, self.n_obs())
    }

    /// Bayesian Information Criterion.
    pub fn bic(&self) -> f64 {
        smooth_stats::bic(self.log_likelihood, self.n_params + 1, self.n_obs())
    }

    /// Forecasts `h` steps ahead from the final states.
    ///
    /// `level` is only read when `interval` is not [`IntervalKind::None`];
    /// `rng` is only used by the simulated and bootstrap classes.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ForecastError::InvalidLevel`] | `level` outside `(0, 1)` with an interval requested |
    /// | [`ForecastError::UnsupportedInterval`] | parametric interval on a multiplicative fit |
    /// | [`ForecastError::Ssm`] | a simulated multiplicative path meets `1 + e <= 0` |
    pub fn forecast<R: Rng + ?Sized>(
        &self,
        h: usize,
        interval: IntervalKind,
        level: f64,
        rng: &mut R,
    ) -> Result<Forecast, ForecastError> {
        crate::forecast::forecast(self, h, interval, level, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn toy_fit() -> GesFit {
        let structure = LagStructure::new(&[1], &[1]).unwrap();
        let matrices = StructuralMatrices::new(array![[1.0]], array![1.0], array![0.5]).unwrap();
        GesFit::new(
            GesSpec::new(vec![1], vec![1]),
            structure,
            matrices,
            array![[10.0]],
            array![[10.0], [10.5], [11.0]],
            vec![10.0, 10.5],
            vec![1.0, 1.0],
            1.0,
            -100.0,
            4,
        )
    }

    #[test]
    fn accessors_round_trip() {
        let fit = toy_fit();
        assert_eq!(fit.n_obs(), 2);
        assert_eq!(fit.n_params(), 4);
        assert_eq!(fit.error_type(), ErrorType::Additive);
        assert_eq!(fit.final_states(), array![[11.0]]);
        assert_eq!(fit.structure().max_lag(), 1);
    }

    #[test]
    fn information_criteria() {
        let fit = toy_fit();
        // k = 4 + 1
        assert_abs_diff_eq!(fit.aic(), 210.0, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.bic(), 200.0 + 5.0 * 2f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn fit_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<GesFit>();
    }
}
