//! Recoverable problems recorded on a [`Simulation`](crate::Simulation).

use std::fmt;

use smooth_noise::NoiseWarning;
use smooth_ssm::DiscardedInput;

/// A substitution made instead of failing the call.
///
/// Every warning is also emitted as a `tracing` event at `warn` level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimulationWarning {
    /// A structural array had the wrong shape and was regenerated.
    MatrixDiscarded(DiscardedInput),
    /// The initial block had the wrong shape and was regenerated.
    InitialDiscarded {
        /// Required shape.
        expected: Vec<usize>,
        /// Supplied shape.
        got: Vec<usize>,
    },
    /// ARIMA coefficients had the wrong length and were regenerated.
    CoefficientsDiscarded {
        /// `"ar"` or `"ma"`.
        kind: &'static str,
        /// Required length.
        expected: usize,
        /// Supplied length.
        got: usize,
    },
    /// Zero paths were requested; one path is simulated.
    PathsRaised,
    /// The initial block averaged to zero on this many paths; their additive
    /// errors use [`ADDITIVE_SCALE_FLOOR`](crate::ADDITIVE_SCALE_FLOOR).
    ErrorScaleFloored {
        /// Number of affected paths.
        paths: usize,
    },
    /// From the noise generator.
    Noise(NoiseWarning),
}

impl fmt::Display for SimulationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationWarning::MatrixDiscarded(d) => fmt::Display::fmt(d, f),
            SimulationWarning::InitialDiscarded { expected, got } => write!(
                f,
                "supplied initial block has shape {got:?}, expected {expected:?}; regenerated"
            ),
            SimulationWarning::CoefficientsDiscarded {
                kind,
                expected,
                got,
            } => write!(
                f,
                "supplied {kind} coefficients have length {got}, expected {expected}; regenerated"
            ),
            SimulationWarning::PathsRaised => f.write_str("zero paths requested, simulating one"),
            SimulationWarning::ErrorScaleFloored { paths } => write!(
                f,
                "initial block averages to zero on {paths} path(s); error scale set to {}",
                crate::paths::ADDITIVE_SCALE_FLOOR
            ),
            SimulationWarning::Noise(w) => fmt::Display::fmt(w, f),
        }
    }
}

impl From<NoiseWarning> for SimulationWarning {
    fn from(w: NoiseWarning) -> Self {
        SimulationWarning::Noise(w)
    }
}

impl From<DiscardedInput> for SimulationWarning {
    fn from(d: DiscardedInput) -> Self {
        SimulationWarning::MatrixDiscarded(d)
    }
}
