//! Error path generation.
//!
//! An [`ErrorSampler`] resolves an [`ErrorSpec`] against the simulation
//! context once, then draws one error column per path. Each family comes
//! with a renormalisation applied to the raw draws:
//!
//! | Family | Defaults | Renormalisation (defaults) | Renormalisation (explicit) |
//! |--------|----------|----------------------------|----------------------------|
//! | normal | `N(0, 1)` | centre, times `sqrt(scale)` | none |
//! | uniform | `U[0, 1)` | centre, times `sqrt(scale)` | none |
//! | log-normal | `meanlog = 0`, `sdlog = 0.01 + (1 - iprob)` | minus 1 | minus 1 |
//! | t | `df = obs - (components + max_lag)` | none | times `sqrt(scale)` |
//! | beta | `Beta(1, 1)` | standardise, times `sqrt(scale)` | standardise, times `sqrt(scale)` |

use ndarray::Array1;
use rand::Rng;
use rand_distr::{Beta, Distribution, LogNormal, Normal, StudentT, Uniform};

use crate::error::NoiseError;
use crate::family::{ErrorFamily, ErrorSpec, FamilyParams};

/// Simulation context that the family defaults depend on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseContext {
    n_obs: usize,
    n_components: usize,
    max_lag: usize,
    occurrence_mean: f64,
}

impl NoiseContext {
    /// Creates a context with full occurrence (`iprob = 1`).
    pub fn new(n_obs: usize, n_components: usize, max_lag: usize) -> Self {
        Self {
            n_obs,
            n_components,
            max_lag,
            occurrence_mean: 1.0,
        }
    }

    /// Sets the mean occurrence probability `iprob`.
    pub fn with_occurrence_mean(mut self, occurrence_mean: f64) -> Self {
        self.occurrence_mean = occurrence_mean;
        self
    }

    /// Number of observations per path.
    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    /// Default Student-t degrees of freedom, `obs - (components + max_lag)`.
    pub fn default_df(&self) -> i64 {
        self.n_obs as i64 - (self.n_components + self.max_lag) as i64
    }

    /// Default log-normal `sdlog`, `0.01 + (1 - iprob)`.
    pub fn default_sdlog(&self) -> f64 {
        0.01 + (1.0 - self.occurrence_mean)
    }
}

/// Post-processing of raw draws.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Renormalization {
    /// Raw draws are used as they are.
    None,
    /// Subtract the path mean, multiply by `sqrt(scale)`.
    CenterAndScale,
    /// `(x - mean) / sd * sqrt(scale)` with the family's moments.
    Standardize {
        /// Family mean.
        mean: f64,
        /// Family standard deviation.
        sd: f64,
    },
    /// Multiply by `sqrt(scale)`.
    ScaleBySqrtLevel,
    /// Subtract 1.
    ShiftDown,
}

impl Renormalization {
    fn apply(&self, errors: &mut Array1<f64>, scale: f64) {
        let root = scale.abs().sqrt();
        match *self {
            Renormalization::None => {}
            Renormalization::CenterAndScale => {
                if let Some(slice) = errors.as_slice() {
                    let centre = smooth_stats::mean(slice);
                    errors.mapv_inplace(|x| (x - centre) * root);
                }
            }
            Renormalization::Standardize { mean, sd } => {
                errors.mapv_inplace(|x| (x - mean) / sd * root);
            }
            Renormalization::ScaleBySqrtLevel => errors.mapv_inplace(|x| x * root),
            Renormalization::ShiftDown => errors.mapv_inplace(|x| x - 1.0),
        }
    }
}

#[derive(Clone, Debug)]
enum Sampler {
    Normal(Normal<f64>),
    LogNormal(LogNormal<f64>),
    StudentT(StudentT<f64>),
    Uniform(Uniform<f64>),
    Beta(Beta<f64>),
}

impl Sampler {
    fn build(params: &FamilyParams) -> Result<Self, NoiseError> {
        params.validate()?;
        let family = params.family().name();
        let invalid = |e: &dyn std::fmt::Display| NoiseError::InvalidParameters {
            family,
            reason: e.to_string(),
        };
        let sampler = match *params {
            FamilyParams::Normal { mean, sd } => {
                Sampler::Normal(Normal::new(mean, sd).map_err(|e| invalid(&e))?)
            }
            FamilyParams::LogNormal { meanlog, sdlog } => {
                Sampler::LogNormal(LogNormal::new(meanlog, sdlog).map_err(|e| invalid(&e))?)
            }
            FamilyParams::StudentT { df } => {
                Sampler::StudentT(StudentT::new(df).map_err(|e| invalid(&e))?)
            }
            FamilyParams::Uniform { min, max } => {
                Sampler::Uniform(Uniform::new(min, max).map_err(|e| invalid(&e))?)
            }
            FamilyParams::Beta { alpha, beta } => {
                Sampler::Beta(Beta::new(alpha, beta).map_err(|e| invalid(&e))?)
            }
        };
        Ok(sampler)
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Sampler::Normal(d) => d.sample(rng),
            Sampler::LogNormal(d) => d.sample(rng),
            Sampler::StudentT(d) => d.sample(rng),
            Sampler::Uniform(d) => d.sample(rng),
            Sampler::Beta(d) => d.sample(rng),
        }
    }
}

/// Mean and standard deviation of `Beta(alpha, beta)`.
fn beta_moments(alpha: f64, beta: f64) -> (f64, f64) {
    let total = alpha + beta;
    let mean = alpha / total;
    let var = alpha * beta / (total * total * (total + 1.0));
    (mean, var.sqrt())
}

/// Draws error paths for one resolved family.
#[derive(Clone, Debug)]
pub struct ErrorSampler {
    family: ErrorFamily,
    params: FamilyParams,
    sampler: Sampler,
    renormalization: Renormalization,
}

impl ErrorSampler {
    /// Resolves `spec` against `ctx`.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`NoiseError::InvalidDegreesOfFreedom`] | default t with `obs - (components + max_lag) <= 0` |
    /// | [`NoiseError::InvalidParameters`] | explicit parameters rejected by the distribution |
    pub fn new(spec: &ErrorSpec, ctx: &NoiseContext) -> Result<Self, NoiseError> {
        let family = spec.family();
        let (params, renormalization) = match spec.params() {
            Some(&params) => {
                let renorm = match params {
                    FamilyParams::Normal { .. } | FamilyParams::Uniform { .. } => {
                        Renormalization::None
                    }
                    FamilyParams::LogNormal { .. } => Renormalization::ShiftDown,
                    FamilyParams::StudentT { .. } => Renormalization::ScaleBySqrtLevel,
                    FamilyParams::Beta { alpha, beta } => {
                        let (mean, sd) = beta_moments(alpha, beta);
                        Renormalization::Standardize { mean, sd }
                    }
                };
                (params, renorm)
            }
            None => match family {
                ErrorFamily::Normal => (
                    FamilyParams::Normal { mean: 0.0, sd: 1.0 },
                    Renormalization::CenterAndScale,
                ),
                ErrorFamily::Uniform => (
                    FamilyParams::Uniform { min: 0.0, max: 1.0 },
                    Renormalization::CenterAndScale,
                ),
                ErrorFamily::LogNormal => (
                    FamilyParams::LogNormal {
                        meanlog: 0.0,
                        sdlog: ctx.default_sdlog(),
                    },
                    Renormalization::ShiftDown,
                ),
                ErrorFamily::StudentT => {
                    let df = ctx.default_df();
                    if df <= 0 {
                        return Err(NoiseError::InvalidDegreesOfFreedom { df });
                    }
                    (
                        FamilyParams::StudentT { df: df as f64 },
                        Renormalization::None,
                    )
                }
                ErrorFamily::Beta => {
                    let (mean, sd) = beta_moments(1.0, 1.0);
                    (
                        FamilyParams::Beta {
                            alpha: 1.0,
                            beta: 1.0,
                        },
                        Renormalization::Standardize { mean, sd },
                    )
                }
            },
        };

        Ok(Self {
            family,
            params,
            sampler: Sampler::build(&params)?,
            renormalization,
        })
    }

    /// Resolved family.
    pub fn family(&self) -> ErrorFamily {
        self.family
    }

    /// Parameters actually used for drawing.
    pub fn params(&self) -> &FamilyParams {
        &self.params
    }

    /// Renormalisation applied after drawing.
    pub fn renormalization(&self) -> Renormalization {
        self.renormalization
    }

    /// Draws one path of `n` errors.
    ///
    /// `scale` is the level scale of the path: the absolute mean of its
    /// initial block for additive models, a small fixed value for
    /// multiplicative ones.
    pub fn draw_path<R: Rng + ?Sized>(&self, n: usize, scale: f64, rng: &mut R) -> Array1<f64> {
        let mut errors = Array1::from_shape_fn(n, |_| self.sampler.sample(rng));
        self.renormalization.apply(&mut errors, scale);
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ctx() -> NoiseContext {
        NoiseContext::new(100, 2, 12)
    }

    #[test]
    fn context_defaults() {
        let c = ctx();
        assert_eq!(c.default_df(), 86);
        assert_abs_diff_eq!(c.default_sdlog(), 0.01, epsilon = 1e-12);
        let c = c.with_occurrence_mean(0.4);
        assert_abs_diff_eq!(c.default_sdlog(), 0.61, epsilon = 1e-12);
    }

    #[test]
    fn default_normal_is_centred_and_scaled() {
        let s = ErrorSampler::new(&ErrorSpec::new(ErrorFamily::Normal), &ctx()).unwrap();
        assert_eq!(s.renormalization(), Renormalization::CenterAndScale);
        let mut rng = StdRng::seed_from_u64(1);
        let e = s.draw_path(5000, 400.0, &mut rng);
        let slice = e.as_slice().unwrap();
        assert_abs_diff_eq!(smooth_stats::mean(slice), 0.0, epsilon = 1e-9);
        // sd ~ sqrt(400) = 20
        assert!((smooth_stats::sd(slice) - 20.0).abs() < 1.0);
    }

    #[test]
    fn default_uniform_is_centred() {
        let s = ErrorSampler::new(&ErrorSpec::new(ErrorFamily::Uniform), &ctx()).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let e = s.draw_path(200, 1.0, &mut rng);
        assert_abs_diff_eq!(smooth_stats::mean(e.as_slice().unwrap()), 0.0, epsilon = 1e-9);
        assert!(e.iter().all(|x| x.abs() <= 1.0));
    }

    #[test]
    fn explicit_normal_is_verbatim() {
        let spec = ErrorSpec::with_params(FamilyParams::Normal { mean: 5.0, sd: 0.1 });
        let s = ErrorSampler::new(&spec, &ctx()).unwrap();
        assert_eq!(s.renormalization(), Renormalization::None);
        let mut rng = StdRng::seed_from_u64(3);
        let e = s.draw_path(2000, 1000.0, &mut rng);
        assert!((smooth_stats::mean(e.as_slice().unwrap()) - 5.0).abs() < 0.02);
    }

    #[test]
    fn lognormal_is_shifted() {
        let s = ErrorSampler::new(&ErrorSpec::new(ErrorFamily::LogNormal), &ctx()).unwrap();
        assert_eq!(
            s.params(),
            &FamilyParams::LogNormal {
                meanlog: 0.0,
                sdlog: 0.01
            }
        );
        let mut rng = StdRng::seed_from_u64(4);
        let e = s.draw_path(500, 1.0, &mut rng);
        // exp(N(0, 0.01^2)) - 1 stays close to zero and above -1.
        assert!(e.iter().all(|&x| x > -1.0 && x.abs() < 0.1));
    }

    #[test]
    fn intermittency_widens_lognormal() {
        let c = ctx().with_occurrence_mean(0.5);
        let s = ErrorSampler::new(&ErrorSpec::new(ErrorFamily::LogNormal), &c).unwrap();
        assert_eq!(
            s.params(),
            &FamilyParams::LogNormal {
                meanlog: 0.0,
                sdlog: 0.51
            }
        );
    }

    #[test]
    fn default_t_uses_residual_df() {
        let s = ErrorSampler::new(&ErrorSpec::new(ErrorFamily::StudentT), &ctx()).unwrap();
        assert_eq!(s.params(), &FamilyParams::StudentT { df: 86.0 });
        assert_eq!(s.renormalization(), Renormalization::None);
    }

    #[test]
    fn default_t_fails_without_df() {
        let c = NoiseContext::new(10, 3, 7);
        let err = ErrorSampler::new(&ErrorSpec::new(ErrorFamily::StudentT), &c).unwrap_err();
        assert!(matches!(err, NoiseError::InvalidDegreesOfFreedom { df: 0 }));
    }

    #[test]
    fn explicit_t_is_scaled() {
        let spec = ErrorSpec::with_params(FamilyParams::StudentT { df: 30.0 });
        let s = ErrorSampler::new(&spec, &ctx()).unwrap();
        assert_eq!(s.renormalization(), Renormalization::ScaleBySqrtLevel);
        let mut a = StdRng::seed_from_u64(5);
        let mut b = StdRng::seed_from_u64(5);
        let unit = s.draw_path(10, 1.0, &mut a);
        let scaled = s.draw_path(10, 9.0, &mut b);
        for (u, x) in unit.iter().zip(scaled.iter()) {
            assert_abs_diff_eq!(*x, 3.0 * u, epsilon = 1e-12);
        }
    }

    #[test]
    fn beta_is_standardised() {
        for spec in [
            ErrorSpec::new(ErrorFamily::Beta),
            ErrorSpec::with_params(FamilyParams::Beta {
                alpha: 2.0,
                beta: 5.0,
            }),
        ] {
            let s = ErrorSampler::new(&spec, &ctx()).unwrap();
            let mut rng = StdRng::seed_from_u64(6);
            let e = s.draw_path(20_000, 4.0, &mut rng);
            let slice = e.as_slice().unwrap();
            assert!(smooth_stats::mean(slice).abs() < 0.05);
            // unit variance times sqrt(4) → sd ~ 2
            assert!((smooth_stats::sd(slice) - 2.0).abs() < 0.1);
        }
    }

    #[test]
    fn beta_moments_uniform_case() {
        let (mean, sd) = beta_moments(1.0, 1.0);
        assert_abs_diff_eq!(mean, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(sd, (1.0_f64 / 12.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn empty_path() {
        let s = ErrorSampler::new(&ErrorSpec::default(), &ctx()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(s.draw_path(0, 1.0, &mut rng).len(), 0);
    }
}
