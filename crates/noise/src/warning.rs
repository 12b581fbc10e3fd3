//! Recoverable substitutions made while building noise inputs.

use std::fmt;

/// A recoverable problem that was corrected instead of failing the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NoiseWarning {
    /// An unrecognised family name without parameters fell back to normal.
    UnknownFamilyCoerced {
        /// The name as supplied.
        name: String,
    },
    /// A non-constant probability vector was longer than the series.
    ProbabilityTruncated {
        /// Supplied length.
        from: usize,
        /// Series length.
        to: usize,
    },
    /// A non-constant probability vector was shorter than the series and was
    /// padded with its last element.
    ProbabilityPadded {
        /// Supplied length.
        from: usize,
        /// Series length.
        to: usize,
    },
}

impl fmt::Display for NoiseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoiseWarning::UnknownFamilyCoerced { name } => {
                write!(f, "unknown error distribution '{name}', using normal")
            }
            NoiseWarning::ProbabilityTruncated { from, to } => {
                write!(f, "occurrence probabilities truncated from {from} to {to}")
            }
            NoiseWarning::ProbabilityPadded { from, to } => {
                write!(f, "occurrence probabilities padded from {from} to {to}")
            }
        }
    }
}
