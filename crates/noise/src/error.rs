//! Error types for the smooth-noise crate.

/// Error type for all fallible operations in the smooth-noise crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NoiseError {
    /// Returned when a family name is not recognised and extra parameters
    /// were supplied, so no safe fallback exists.
    #[error("unknown error distribution '{name}' with explicit parameters")]
    UnknownDistribution {
        /// The name as supplied.
        name: String,
    },

    /// Returned when the parameter count or values do not fit the family.
    #[error("invalid {family} parameters: {reason}")]
    InvalidParameters {
        /// Family name.
        family: &'static str,
        /// Description of the problem.
        reason: String,
    },

    /// Returned when the default Student-t degrees of freedom
    /// `obs - (components + max_lag)` is not positive.
    #[error("Student-t degrees of freedom must be positive, got {df}")]
    InvalidDegreesOfFreedom {
        /// The computed degrees of freedom.
        df: i64,
    },

    /// Returned when the occurrence probability vector is empty.
    #[error("occurrence probability vector is empty")]
    EmptyProbability,

    /// Returned when an occurrence probability lies outside `[0, 1]`.
    #[error("occurrence probability at position {index} is outside [0, 1]: {value}")]
    InvalidProbability {
        /// Position in the supplied vector.
        index: usize,
        /// The offending value.
        value: f64,
    },
}
