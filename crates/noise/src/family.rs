//! Error distribution families and their parameters.

use std::fmt;

use tracing::warn;

use crate::error::NoiseError;
use crate::warning::NoiseWarning;

/// Supported error distribution families.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ErrorFamily {
    /// Normal distribution.
    #[default]
    Normal,
    /// Log-normal distribution; draws are shifted by -1.
    LogNormal,
    /// Student-t distribution.
    StudentT,
    /// Continuous uniform distribution.
    Uniform,
    /// Beta distribution, standardised after drawing.
    Beta,
}

/// Accepted names, matched case-insensitively.
const FAMILY_TABLE: &[(&str, ErrorFamily)] = &[
    ("normal", ErrorFamily::Normal),
    ("rnorm", ErrorFamily::Normal),
    ("lognormal", ErrorFamily::LogNormal),
    ("rlnorm", ErrorFamily::LogNormal),
    ("t", ErrorFamily::StudentT),
    ("rt", ErrorFamily::StudentT),
    ("uniform", ErrorFamily::Uniform),
    ("runif", ErrorFamily::Uniform),
    ("beta", ErrorFamily::Beta),
    ("rbeta", ErrorFamily::Beta),
];

impl ErrorFamily {
    /// Looks a family up by name.
    pub fn lookup(name: &str) -> Option<Self> {
        let name = name.trim();
        FAMILY_TABLE
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|&(_, family)| family)
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorFamily::Normal => "normal",
            ErrorFamily::LogNormal => "lognormal",
            ErrorFamily::StudentT => "t",
            ErrorFamily::Uniform => "uniform",
            ErrorFamily::Beta => "beta",
        }
    }

    /// Allowed number of positional parameters, `(min, max)`.
    fn arity(&self) -> (usize, usize) {
        match self {
            ErrorFamily::Normal | ErrorFamily::LogNormal | ErrorFamily::Uniform => (1, 2),
            ErrorFamily::StudentT => (1, 1),
            ErrorFamily::Beta => (2, 2),
        }
    }
}

impl fmt::Display for ErrorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Explicit parameters of a family.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FamilyParams {
    /// `N(mean, sd^2)`.
    Normal {
        /// Mean.
        mean: f64,
        /// Standard deviation.
        sd: f64,
    },
    /// `exp(N(meanlog, sdlog^2))`.
    LogNormal {
        /// Mean on the log scale.
        meanlog: f64,
        /// Standard deviation on the log scale.
        sdlog: f64,
    },
    /// Student-t with `df` degrees of freedom.
    StudentT {
        /// Degrees of freedom.
        df: f64,
    },
    /// `U[min, max)`.
    Uniform {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// `Beta(alpha, beta)`.
    Beta {
        /// First shape parameter.
        alpha: f64,
        /// Second shape parameter.
        beta: f64,
    },
}

impl FamilyParams {
    /// Builds parameters from positional values.
    ///
    /// Second positions default as in the usual samplers: `sd = 1`,
    /// `sdlog = 1`, `max = 1`.
    ///
    /// # Errors
    ///
    /// Returns [`NoiseError::InvalidParameters`] for a wrong count or values
    /// outside the family's domain.
    pub fn from_positional(family: ErrorFamily, values: &[f64]) -> Result<Self, NoiseError> {
        let (min, max) = family.arity();
        if values.len() < min || values.len() > max {
            let expected = if min == max {
                format!("{min}")
            } else {
                format!("{min} to {max}")
            };
            return Err(NoiseError::InvalidParameters {
                family: family.name(),
                reason: format!("expected {expected} parameters, got {}", values.len()),
            });
        }
        let second = |default: f64| values.get(1).copied().unwrap_or(default);
        let params = match family {
            ErrorFamily::Normal => FamilyParams::Normal {
                mean: values[0],
                sd: second(1.0),
            },
            ErrorFamily::LogNormal => FamilyParams::LogNormal {
                meanlog: values[0],
                sdlog: second(1.0),
            },
            ErrorFamily::StudentT => FamilyParams::StudentT { df: values[0] },
            ErrorFamily::Uniform => FamilyParams::Uniform {
                min: values[0],
                max: second(1.0),
            },
            ErrorFamily::Beta => FamilyParams::Beta {
                alpha: values[0],
                beta: values[1],
            },
        };
        params.validate()?;
        Ok(params)
    }

    /// Family these parameters belong to.
    pub fn family(&self) -> ErrorFamily {
        match self {
            FamilyParams::Normal { .. } => ErrorFamily::Normal,
            FamilyParams::LogNormal { .. } => ErrorFamily::LogNormal,
            FamilyParams::StudentT { .. } => ErrorFamily::StudentT,
            FamilyParams::Uniform { .. } => ErrorFamily::Uniform,
            FamilyParams::Beta { .. } => ErrorFamily::Beta,
        }
    }

    /// Checks the parameter domain.
    ///
    /// # Errors
    ///
    /// Returns [`NoiseError::InvalidParameters`] describing the first
    /// violation.
    pub fn validate(&self) -> Result<(), NoiseError> {
        let invalid = |reason: String| NoiseError::InvalidParameters {
            family: self.family().name(),
            reason,
        };
        match *self {
            FamilyParams::Normal { mean, sd } => {
                if !mean.is_finite() || !sd.is_finite() || sd < 0.0 {
                    return Err(invalid(format!("mean={mean}, sd={sd}")));
                }
            }
            FamilyParams::LogNormal { meanlog, sdlog } => {
                if !meanlog.is_finite() || !sdlog.is_finite() || sdlog < 0.0 {
                    return Err(invalid(format!("meanlog={meanlog}, sdlog={sdlog}")));
                }
            }
            FamilyParams::StudentT { df } => {
                if !df.is_finite() || df <= 0.0 {
                    return Err(invalid(format!("df={df}")));
                }
            }
            FamilyParams::Uniform { min, max } => {
                if !min.is_finite() || !max.is_finite() || min >= max {
                    return Err(invalid(format!("min={min}, max={max}")));
                }
            }
            FamilyParams::Beta { alpha, beta } => {
                if !alpha.is_finite() || !beta.is_finite() || alpha <= 0.0 || beta <= 0.0 {
                    return Err(invalid(format!("alpha={alpha}, beta={beta}")));
                }
            }
        }
        Ok(())
    }
}

/// A family plus optional explicit parameters.
///
/// Without parameters the family's built-in defaults apply, which depend on
/// the simulation context (see `ErrorSampler`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ErrorSpec {
    family: ErrorFamily,
    params: Option<FamilyParams>,
}

impl ErrorSpec {
    /// Uses the family's built-in defaults.
    pub fn new(family: ErrorFamily) -> Self {
        Self {
            family,
            params: None,
        }
    }

    /// Uses explicit parameters.
    pub fn with_params(params: FamilyParams) -> Self {
        Self {
            family: params.family(),
            params: Some(params),
        }
    }

    /// Resolves a family by name with positional parameters.
    ///
    /// An unrecognised name without parameters falls back to normal and
    /// returns a warning.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`NoiseError::UnknownDistribution`] | unrecognised name with parameters |
    /// | [`NoiseError::InvalidParameters`] | bad parameter count or values |
    pub fn from_name(
        name: &str,
        params: &[f64],
    ) -> Result<(Self, Option<NoiseWarning>), NoiseError> {
        match ErrorFamily::lookup(name) {
            Some(family) if params.is_empty() => Ok((Self::new(family), None)),
            Some(family) => Ok((
                Self::with_params(FamilyParams::from_positional(family, params)?),
                None,
            )),
            None if params.is_empty() => {
                warn!(name, "unknown error distribution, using normal");
                Ok((
                    Self::new(ErrorFamily::Normal),
                    Some(NoiseWarning::UnknownFamilyCoerced {
                        name: name.to_string(),
                    }),
                ))
            }
            None => Err(NoiseError::UnknownDistribution {
                name: name.to_string(),
            }),
        }
    }

    /// Returns the family.
    pub fn family(&self) -> ErrorFamily {
        self.family
    }

    /// Returns the explicit parameters, if any.
    pub fn params(&self) -> Option<&FamilyParams> {
        self.params.as_ref()
    }
}
