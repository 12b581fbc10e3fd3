//! Structural matrices of a single-source-of-error state-space model.
//!
//! ```text
//! y[t]      = w' v[t]               (measurement)
//! state[t]  = F v[t] + g e[t]       (transition + persistence)
//! ```
//!
//! where `v[t]` is the lagged state vector assembled by the engine.

use ndarray::{Array1, Array2, Axis};

use crate::error::SsmError;
use crate::stability;

/// Transition matrix `F`, measurement vector `w` and persistence vector `g`.
///
/// Value object: validated once at construction and then only read.
#[derive(Clone, Debug, PartialEq)]
pub struct StructuralMatrices {
    transition: Array2<f64>,
    measurement: Array1<f64>,
    persistence: Array1<f64>,
}

impl StructuralMatrices {
    /// Builds the matrices after checking that they describe the same number
    /// of components.
    ///
    /// # Errors
    ///
    /// Returns [`SsmError::ShapeMismatch`] when `transition` is not square or
    /// a vector's length differs from the transition's dimension, and
    /// [`SsmError::EmptyModel`] for zero components.
    pub fn new(
        transition: Array2<f64>,
        measurement: Array1<f64>,
        persistence: Array1<f64>,
    ) -> Result<Self, SsmError> {
        let n = measurement.len();
        if n == 0 {
            return Err(SsmError::EmptyModel);
        }
        if transition.dim() != (n, n) {
            return Err(SsmError::ShapeMismatch {
                name: "transition",
                expected: vec![n, n],
                got: transition.shape().to_vec(),
            });
        }
        if persistence.len() != n {
            return Err(SsmError::ShapeMismatch {
                name: "persistence",
                expected: vec![n],
                got: vec![persistence.len()],
            });
        }
        Ok(Self {
            transition,
            measurement,
            persistence,
        })
    }

    /// Number of state components.
    pub fn n_components(&self) -> usize {
        self.measurement.len()
    }

    /// Transition matrix `F`.
    pub fn transition(&self) -> &Array2<f64> {
        &self.transition
    }

    /// Measurement vector `w`.
    pub fn measurement(&self) -> &Array1<f64> {
        &self.measurement
    }

    /// Persistence vector `g`.
    pub fn persistence(&self) -> &Array1<f64> {
        &self.persistence
    }

    /// Closed-loop matrix `D = F - g w'`.
    pub fn closed_loop(&self) -> Array2<f64> {
        let g = self.persistence.view().insert_axis(Axis(1)); // (n, 1)
        let w = self.measurement.view().insert_axis(Axis(0)); // (1, n)
        &self.transition - &g.dot(&w)
    }

    /// Spectral radii of `F` and `D` as `(transition, closed_loop)`.
    pub fn spectral_radii(&self) -> (f64, f64) {
        (
            stability::spectral_radius(&self.transition),
            stability::spectral_radius(&self.closed_loop()),
        )
    }

    /// Joint stability test: both `F` and `F - g w'` lie within the unit
    /// circle.
    pub fn is_stable(&self) -> bool {
        stability::within_unit_circle(&self.transition)
            && stability::within_unit_circle(&self.closed_loop())
    }

    /// Decomposes into `(F, w, g)`.
    pub fn into_parts(self) -> (Array2<f64>, Array1<f64>, Array1<f64>) {
        (self.transition, self.measurement, self.persistence)
    }
}
