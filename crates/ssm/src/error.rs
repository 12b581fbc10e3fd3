//! Error types for the smooth-ssm crate.

/// Error type for all fallible operations in the smooth-ssm crate.
///
/// Every variant is fatal: the call that produced it is aborted. Recoverable
/// problems (wrong-shaped optional inputs) are reported as warnings by the
/// callers instead.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SsmError {
    /// Returned when `orders` and `lags` have different lengths.
    #[error("orders and lags differ in length: {orders} orders, {lags} lags")]
    DimensionMismatch {
        /// Number of orders supplied.
        orders: usize,
        /// Number of lags supplied.
        lags: usize,
    },

    /// Returned when an order is negative.
    #[error("order at position {index} is negative: {value}")]
    NegativeOrder {
        /// Position in the supplied sequence.
        index: usize,
        /// The offending value.
        value: i64,
    },

    /// Returned when a lag is negative.
    #[error("lag at position {index} is negative: {value}")]
    NegativeLag {
        /// Position in the supplied sequence.
        index: usize,
        /// The offending value.
        value: i64,
    },

    /// Returned when normalisation eliminates every component.
    #[error("model has no state components after dropping zero orders and lags")]
    EmptyModel,

    /// Returned when an array does not have the shape required by the model.
    #[error("{name} has shape {got:?}, expected {expected:?}")]
    ShapeMismatch {
        /// Name of the offending array.
        name: &'static str,
        /// Required shape.
        expected: Vec<usize>,
        /// Shape that was supplied.
        got: Vec<usize>,
    },

    /// Returned when a supplied transition matrix has eigenvalues outside the
    /// unit circle, so no stable model can be completed around it.
    #[error("supplied transition matrix is unstable (spectral radius {radius})")]
    UnstableTransition {
        /// Spectral radius of the supplied matrix.
        radius: f64,
    },

    /// Returned when the bounded stability search and its shrink fallback
    /// both fail.
    #[error("no stable candidate after {attempts} draws and {shrink_steps} shrink steps")]
    StabilityNotReached {
        /// Random draws attempted.
        attempts: usize,
        /// Shrink steps attempted on the last draw.
        shrink_steps: usize,
    },

    /// Returned when a multiplicative model meets `1 + e <= 0` on an observed
    /// step.
    #[error("multiplicative error at step {step} gives non-positive factor 1 + e = {factor}")]
    NonPositiveMultiplicativeError {
        /// Zero-based observation index.
        step: usize,
        /// The value of `1 + e`.
        factor: f64,
    },
}
