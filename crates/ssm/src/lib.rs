//! # smooth-ssm
//!
//! Single-source-of-error state-space kernel: lag normalisation, structural
//! matrices with a joint stability test, bounded random generation of
//! stable matrices, and the recursion that simulates or filters a series.
//!
//! ## Workflow
//!
//! ```mermaid
//! graph LR
//!     A["LagStructure::new(&orders, &lags)?"] --> B["model_lags / n_components"]
//!     C["MatrixSupply::validate(n)"] --> D["draw_stable_matrices(n, &supply, &search, &mut rng)?"]
//!     B --> D
//!     D --> E["StructuralMatrices"]
//!     E --> F["simulate_path / simulate_batch"]
//!     E --> G["filter_path"]
//! ```
//!
//! ## Glossary
//!
//! | Symbol | Accessor | Meaning |
//! |--------|----------|---------|
//! | F | [`StructuralMatrices::transition()`] | Deterministic evolution of the state |
//! | w | [`StructuralMatrices::measurement()`] | Projection of the state onto the series |
//! | g | [`StructuralMatrices::persistence()`] | How strongly each error updates the state |
//! | D | [`StructuralMatrices::closed_loop()`] | `F - g w'`; stable iff the model is forecastable |

mod engine;
mod error;
mod generator;
mod lags;
mod matrices;

pub mod stability;

pub use engine::{
    ErrorType, FilterOutput, PathInputs, PathOutput, filter_path, simulate_batch, simulate_path,
};
pub use error::SsmError;
pub use generator::{
    DiscardedInput, MatrixKind, MatrixSupply, SearchReport, StabilitySearch,
    draw_stable_matrices, search_stable,
};
pub use lags::LagStructure;
pub use matrices::StructuralMatrices;
