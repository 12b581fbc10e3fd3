//! Error types for the smooth-forecast crate.

use smooth_ssm::SsmError;

/// Error type for estimation and forecasting.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ForecastError {
    /// Returned when the input data is empty.
    #[error("input data is empty")]
    EmptyData,

    /// Returned when the series is too short for the number of estimated
    /// parameters.
    #[error("insufficient data: got {n} observations, need at least {min}")]
    InsufficientData {
        /// Number of observations provided.
        n: usize,
        /// Minimum number of observations required.
        min: usize,
    },

    /// Returned when the input data contains NaN or infinity.
    #[error("input data contains non-finite values")]
    NonFiniteData,

    /// Returned when a multiplicative model is fitted to a series with
    /// zero or negative values.
    #[error("multiplicative models need strictly positive data")]
    NonPositiveData,

    /// Returned when Nelder-Mead does not produce a usable optimum.
    #[error("optimisation failed to converge")]
    OptimizationFailed,

    /// Returned when an interval class is not available for the fit.
    #[error("{interval} intervals are not available for multiplicative models")]
    UnsupportedInterval {
        /// Name of the requested interval class.
        interval: &'static str,
    },

    /// Returned when the confidence level is outside `(0, 1)`.
    #[error("confidence level must lie in (0, 1), got {level}")]
    InvalidLevel {
        /// Requested level.
        level: f64,
    },

    /// State-space failure while filtering or forecasting.
    #[error(transparent)]
    Ssm(#[from] SsmError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_insufficient_data() {
        let err = ForecastError::InsufficientData { n: 3, min: 6 };
        assert_eq!(
            err.to_string(),
            "insufficient data: got 3 observations, need at least 6"
        );
    }

    #[test]
    fn error_unsupported_interval() {
        let err = ForecastError::UnsupportedInterval {
            interval: "parametric",
        };
        assert_eq!(
            err.to_string(),
            "parametric intervals are not available for multiplicative models"
        );
    }

    #[test]
    fn error_invalid_level() {
        let err = ForecastError::InvalidLevel { level: 1.5 };
        assert_eq!(err.to_string(), "confidence level must lie in (0, 1), got 1.5");
    }

    #[test]
    fn ssm_errors_are_transparent() {
        let inner = SsmError::EmptyModel;
        let msg = inner.to_string();
        let err: ForecastError = inner.into();
        assert_eq!(err.to_string(), msg);
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<ForecastError>();
    }
}
