//! GES model specification (unfitted).

use smooth_ssm::ErrorType;

use crate::error::ForecastError;
use crate::fit::GesFit;

/// An unfitted GES model: component orders per lag and the error type.
///
/// ```mermaid
/// graph LR
///     A["GesSpec::new(orders, lags)"] -->|".fit(&data)?"| B["GesFit"]
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GesSpec {
    orders: Vec<i64>,
    lags: Vec<i64>,
    error_type: ErrorType,
}

impl GesSpec {
    /// Creates a specification with additive errors.
    ///
    /// `orders` and `lags` follow the same rules as simulation: equal
    /// lengths, duplicate lags merged, zero orders dropped. They are checked
    /// when [`GesSpec::fit`] runs.
    ///
    /// # Example
    ///
    /// ```
    /// use smooth_forecast::GesSpec;
    ///
    /// let spec = GesSpec::new(vec![1, 1], vec![1, 12]);
    /// assert_eq!(spec.lags(), &[1, 12]);
    /// ```
    pub fn new(orders: Vec<i64>, lags: Vec<i64>) -> Self {
        Self {
            orders,
            lags,
            error_type: ErrorType::Additive,
        }
    }

    /// Sets the error type.
    pub fn with_error_type(mut self, error_type: ErrorType) -> Self {
        self.error_type = error_type;
        self
    }

    /// Requested orders, before normalisation.
    pub fn orders(&self) -> &[i64] {
        &self.orders
    }

    /// Requested lags, before normalisation.
    pub fn lags(&self) -> &[i64] {
        &self.lags
    }

    /// Error type of the model.
    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// Estimates `F`, `w`, `g` and the initial block by minimising the
    /// in-sample mean squared one-step error.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ForecastError::Ssm`] | invalid `(orders, lags)` |
    /// | [`ForecastError::EmptyData`] | `data` is empty |
    /// | [`ForecastError::NonFiniteData`] | any element is NaN or infinite |
    /// | [`ForecastError::NonPositiveData`] | multiplicative model with a value `<= 0` |
    /// | [`ForecastError::InsufficientData`] | `data.len() <= max_lag + parameters` |
    /// | [`ForecastError::OptimizationFailed`] | Nelder-Mead returns no finite optimum |
    pub fn fit(&self, data: &[f64]) -> Result<GesFit, ForecastError> {
        crate::optimizer::fit_ges(self, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_error_type() {
        let spec = GesSpec::new(vec![1], vec![1]).with_error_type(ErrorType::Multiplicative);
        assert_eq!(spec.error_type(), ErrorType::Multiplicative);
        assert_eq!(spec.orders(), &[1]);
    }

    #[test]
    fn default_error_type_is_additive() {
        assert_eq!(
            GesSpec::new(vec![1], vec![1]).error_type(),
            ErrorType::Additive
        );
    }

    #[test]
    fn fit_rejects_empty_data() {
        let err = GesSpec::new(vec![1], vec![1]).fit(&[]).unwrap_err();
        assert!(matches!(err, ForecastError::EmptyData));
    }

    #[test]
    fn fit_rejects_bad_structure() {
        let err = GesSpec::new(vec![1, 1], vec![1])
            .fit(&[1.0, 2.0, 3.0])
            .unwrap_err();
        assert!(matches!(err, ForecastError::Ssm(_)));
    }
}
