//! # smooth-sim
//!
//! Simulation of GES and SSARIMA models in single-source-of-error
//! state-space form.
//!
//! ## Workflow
//!
//! ```mermaid
//! graph LR
//!     A["GesConfig::new(orders, lags)"] -->|"simulate_ges(&config)?"| C["Simulation"]
//!     B["SsarimaConfig::new(ar, i, ma, lags)"] -->|"simulate_ssarima(&config)?"| C
//!     C --> D[".data() / .states() / .residuals()"]
//!     C --> E[".transition() / .measurement() / .persistence()"]
//!     C --> F[".log_likelihood()"]
//!     C --> G[".warnings()"]
//! ```
//!
//! Each call runs: lag normalisation, per-path matrix generation under the
//! stability constraint, error and occurrence generation, the recursion and
//! packaging. Paths run in parallel with `rayon`; every path draws from its
//! own RNG seeded from the master seed.
//!
//! ## Output shapes
//!
//! | Accessor | One path | `k` paths |
//! |----------|----------|-----------|
//! | [`Simulation::data()`] | `(obs)` | `(obs, k)` |
//! | [`Simulation::states()`] | `(max_lag + obs, c)` | `(max_lag + obs, c, k)` |
//! | [`Simulation::transition()`] | `(c, c)` | `(c, c, k)` |

mod config;
mod error;
mod ges;
mod paths;
mod result;
mod ssarima;
mod warning;

pub use config::{GesConfig, SimSettings, SsarimaConfig, normalize_count};
pub use error::SimError;
pub use ges::simulate_ges;
pub use paths::ADDITIVE_SCALE_FLOOR;
pub use result::{Simulation, TimeIndex, ges_name};
pub use ssarima::{ArimaOrders, ArimaPolynomials, simulate_ssarima};
pub use warning::SimulationWarning;
