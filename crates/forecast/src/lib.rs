//! # smooth-forecast
//!
//! GES estimation by Nelder-Mead, point forecasts and prediction intervals.
//!
//! ## Workflow
//!
//! ```mermaid
//! graph LR
//!     A["GesSpec::new(orders, lags)"] -->|".fit(&data)?"| B["GesFit"]
//!     B --> C[".matrices() / .initial()"]
//!     B --> D[".sigma2() / .aic() / .bic()"]
//!     B -->|".forecast(h, interval, level, &mut rng)?"| E["Forecast"]
//! ```
//!
//! ## Example
//!
//! ```
//! use rand::SeedableRng;
//! use smooth_forecast::{GesSpec, IntervalKind};
//!
//! let data: Vec<f64> = (0..40).map(|t| 10.0 + (t % 3) as f64).collect();
//! let fit = GesSpec::new(vec![1], vec![1]).fit(&data).unwrap();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! let fc = fit.forecast(6, IntervalKind::Parametric, 0.9, &mut rng).unwrap();
//! assert_eq!(fc.horizon(), 6);
//! assert!(fc.lower().is_some());
//! ```
//!
//! ## Glossary
//!
//! | Symbol | Accessor | Meaning |
//! |--------|----------|---------|
//! | sigma2 | [`GesFit::sigma2()`] | Mean squared one-step error |
//! | psi | [`impulse_response()`] | Response of the series to a unit error |
//! | AIC | [`GesFit::aic()`] | Akaike Information Criterion (lower = better) |

mod error;
mod fit;
mod forecast;
mod spec;

pub(crate) mod optimizer;

pub use error::ForecastError;
pub use fit::GesFit;
pub use forecast::{Forecast, IntervalKind, SIMULATED_PATHS, impulse_response};
pub use spec::GesSpec;
