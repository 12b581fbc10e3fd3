//! # smooth-noise
//!
//! Error and occurrence inputs for state-space simulation.
//!
//! ## Workflow
//!
//! ```mermaid
//! graph LR
//!     A["ErrorSpec::from_name(name, &params)?"] --> B["ErrorSampler::new(&spec, &ctx)?"]
//!     C["NoiseContext::new(obs, components, max_lag)"] --> B
//!     B --> D[".draw_path(obs, scale, &mut rng)"]
//!     E["OccurrenceModel::new(&probs, obs)?"] --> F[".draw_path(obs, &mut rng)"]
//!     E -->|".mean_probability()"| C
//! ```
//!
//! Recoverable substitutions (unknown family names without parameters,
//! resized probability vectors) are returned as [`NoiseWarning`] values and
//! logged through `tracing`.

mod error;
mod family;
mod occurrence;
mod sampler;
mod warning;

pub use error::NoiseError;
pub use family::{ErrorFamily, ErrorSpec, FamilyParams};
pub use occurrence::OccurrenceModel;
pub use sampler::{ErrorSampler, NoiseContext, Renormalization};
pub use warning::NoiseWarning;
