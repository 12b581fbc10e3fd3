//! Error types for the smooth-sim crate.

use smooth_noise::NoiseError;
use smooth_ssm::SsmError;

/// Error type for all fallible operations in the smooth-sim crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SimError {
    /// Wrapped error from the state-space kernel.
    #[error(transparent)]
    Ssm(#[from] SsmError),

    /// Wrapped error from the noise generator.
    #[error(transparent)]
    Noise(#[from] NoiseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_display() {
        let e: SimError = SsmError::DimensionMismatch { orders: 1, lags: 2 }.into();
        assert_eq!(
            e.to_string(),
            "orders and lags differ in length: 1 orders, 2 lags"
        );
        let e: SimError = NoiseError::EmptyProbability.into();
        assert_eq!(e.to_string(), "occurrence probability vector is empty");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<SimError>();
    }
}
