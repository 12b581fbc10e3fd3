//! Random structural-parameter generation under a stability constraint.
//!
//! Missing pieces of `(F, w, g)` are drawn i.i.d. from `U[-1, 1]` and the
//! draw is rejected until both `F` and `F - g w'` lie within the unit
//! circle. The search is bounded: once [`StabilitySearch::max_attempts`]
//! draws have failed, the generated pieces of the last draw are halved
//! repeatedly until the test passes.

use std::fmt;

use ndarray::{Array1, Array2};
use rand::Rng;
use tracing::{debug, warn};

use crate::error::SsmError;
use crate::matrices::StructuralMatrices;
use crate::stability;

/// Identifies one of the three structural arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatrixKind {
    /// Transition matrix `F`.
    Transition,
    /// Measurement vector `w`.
    Measurement,
    /// Persistence vector `g`.
    Persistence,
}

impl fmt::Display for MatrixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatrixKind::Transition => "transition",
            MatrixKind::Measurement => "measurement",
            MatrixKind::Persistence => "persistence",
        };
        f.write_str(name)
    }
}

/// A user-supplied array that was dropped because of its shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscardedInput {
    /// Which array was dropped.
    pub kind: MatrixKind,
    /// Shape required by the model.
    pub expected: Vec<usize>,
    /// Shape that was supplied.
    pub got: Vec<usize>,
}

impl fmt::Display for DiscardedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "supplied {} has shape {:?}, expected {:?}; regenerated",
            self.kind, self.got, self.expected
        )
    }
}

/// Optional user-supplied structural arrays.
///
/// Pieces that are present are broadcast to every simulated path; missing
/// pieces are drawn per path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatrixSupply {
    transition: Option<Array2<f64>>,
    measurement: Option<Array1<f64>>,
    persistence: Option<Array1<f64>>,
}

impl MatrixSupply {
    /// Creates an empty supply: everything is generated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Supplies the transition matrix `F`.
    pub fn with_transition(mut self, transition: Array2<f64>) -> Self {
        self.transition = Some(transition);
        self
    }

    /// Supplies the measurement vector `w`.
    pub fn with_measurement(mut self, measurement: Array1<f64>) -> Self {
        self.measurement = Some(measurement);
        self
    }

    /// Supplies the persistence vector `g`.
    pub fn with_persistence(mut self, persistence: Array1<f64>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Returns the supplied transition matrix, if any.
    pub fn transition(&self) -> Option<&Array2<f64>> {
        self.transition.as_ref()
    }

    /// Returns the supplied measurement vector, if any.
    pub fn measurement(&self) -> Option<&Array1<f64>> {
        self.measurement.as_ref()
    }

    /// Returns the supplied persistence vector, if any.
    pub fn persistence(&self) -> Option<&Array1<f64>> {
        self.persistence.as_ref()
    }

    /// Returns `true` when all three arrays are supplied.
    pub fn is_complete(&self) -> bool {
        self.transition.is_some() && self.measurement.is_some() && self.persistence.is_some()
    }

    /// Drops every array whose shape does not match `n_components`.
    ///
    /// Each dropped array is logged at `warn` level and reported in the
    /// returned list; it will be regenerated like a missing one.
    pub fn validate(self, n_components: usize) -> (Self, Vec<DiscardedInput>) {
        let mut discarded = Vec::new();
        let n = n_components;

        let transition = self.transition.filter(|f| {
            let ok = f.dim() == (n, n);
            if !ok {
                discarded.push(DiscardedInput {
                    kind: MatrixKind::Transition,
                    expected: vec![n, n],
                    got: f.shape().to_vec(),
                });
            }
            ok
        });
        let measurement = self.measurement.filter(|w| {
            let ok = w.len() == n;
            if !ok {
                discarded.push(DiscardedInput {
                    kind: MatrixKind::Measurement,
                    expected: vec![n],
                    got: vec![w.len()],
                });
            }
            ok
        });
        let persistence = self.persistence.filter(|g| {
            let ok = g.len() == n;
            if !ok {
                discarded.push(DiscardedInput {
                    kind: MatrixKind::Persistence,
                    expected: vec![n],
                    got: vec![g.len()],
                });
            }
            ok
        });

        for d in &discarded {
            warn!(kind = %d.kind, expected = ?d.expected, got = ?d.got, "discarding wrong-shaped input");
        }

        (
            Self {
                transition,
                measurement,
                persistence,
            },
            discarded,
        )
    }
}

/// Bounds of the reject-and-retry stability search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StabilitySearch {
    max_attempts: usize,
    max_shrink_steps: usize,
}

impl StabilitySearch {
    /// Creates a search with defaults.
    ///
    /// Defaults: `max_attempts = 10_000`, `max_shrink_steps = 64`.
    pub fn new() -> Self {
        Self {
            max_attempts: 10_000,
            max_shrink_steps: 64,
        }
    }

    /// Sets the number of random draws before falling back to shrinking.
    /// At least one draw is always made.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the number of halving steps applied to the last draw.
    pub fn with_max_shrink_steps(mut self, max_shrink_steps: usize) -> Self {
        self.max_shrink_steps = max_shrink_steps;
        self
    }

    /// Returns the maximum number of random draws.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Returns the maximum number of shrink steps.
    pub fn max_shrink_steps(&self) -> usize {
        self.max_shrink_steps
    }
}

impl Default for StabilitySearch {
    fn default() -> Self {
        Self::new()
    }
}

/// How a search ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchReport {
    /// Random draws made.
    pub attempts: usize,
    /// Halving steps applied to the last draw (0 when a draw passed).
    pub shrink_steps: usize,
}

/// Bounded reject-and-retry search.
///
/// Calls `draw` until `accept` passes or `search.max_attempts()` draws were
/// made, then applies `shrink(candidate, factor)` with factors
/// `1/2, 1/4, ...` to the last draw.
///
/// # Errors
///
/// Returns [`SsmError::StabilityNotReached`] when both phases fail.
pub fn search_stable<C, R, D, A, S>(
    search: &StabilitySearch,
    rng: &mut R,
    mut draw: D,
    accept: A,
    shrink: S,
) -> Result<(C, SearchReport), SsmError>
where
    R: Rng + ?Sized,
    D: FnMut(&mut R) -> C,
    A: Fn(&C) -> bool,
    S: Fn(&C, f64) -> C,
{
    let max_attempts = search.max_attempts().max(1);
    let mut last = draw(rng);
    let mut attempts = 1;
    loop {
        if accept(&last) {
            return Ok((
                last,
                SearchReport {
                    attempts,
                    shrink_steps: 0,
                },
            ));
        }
        if attempts >= max_attempts {
            break;
        }
        last = draw(rng);
        attempts += 1;
    }

    debug!(attempts, "stability search exhausted, shrinking last draw");
    let mut factor = 1.0;
    for step in 1..=search.max_shrink_steps() {
        factor *= 0.5;
        let candidate = shrink(&last, factor);
        if accept(&candidate) {
            return Ok((
                candidate,
                SearchReport {
                    attempts,
                    shrink_steps: step,
                },
            ));
        }
    }

    Err(SsmError::StabilityNotReached {
        attempts,
        shrink_steps: search.max_shrink_steps(),
    })
}

fn uniform_vector<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Array1<f64> {
    Array1::from_shape_fn(n, |_| rng.random_range(-1.0..=1.0))
}

fn uniform_matrix<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Array2<f64> {
    Array2::from_shape_fn((n, n), |_| rng.random_range(-1.0..=1.0))
}

/// Completes `supply` into a stable set of structural matrices.
///
/// `supply` must already be validated for `n_components`
/// (see [`MatrixSupply::validate`]). When every piece is supplied it is
/// returned unchanged and no stability test is applied.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`SsmError::EmptyModel`] | `n_components == 0` |
/// | [`SsmError::ShapeMismatch`] | `supply` was not validated for `n_components` |
/// | [`SsmError::UnstableTransition`] | supplied `F` is unstable while other pieces are generated |
/// | [`SsmError::StabilityNotReached`] | bounded search and shrink fallback failed |
pub fn draw_stable_matrices<R: Rng + ?Sized>(
    n_components: usize,
    supply: &MatrixSupply,
    search: &StabilitySearch,
    rng: &mut R,
) -> Result<(StructuralMatrices, SearchReport), SsmError> {
    let n = n_components;
    if n == 0 {
        return Err(SsmError::EmptyModel);
    }

    if let (Some(f), Some(w), Some(g)) = (
        supply.transition.as_ref(),
        supply.measurement.as_ref(),
        supply.persistence.as_ref(),
    ) {
        let matrices = StructuralMatrices::new(f.clone(), w.clone(), g.clone())?;
        return Ok((
            matrices,
            SearchReport {
                attempts: 0,
                shrink_steps: 0,
            },
        ));
    }

    if let Some(f) = supply.transition.as_ref() {
        let radius = stability::spectral_radius(f);
        if !(radius.is_finite() && radius <= 1.0 + stability::STABILITY_TOLERANCE) {
            return Err(SsmError::UnstableTransition { radius });
        }
    }

    let draw = |rng: &mut R| {
        let f = supply
            .transition
            .clone()
            .unwrap_or_else(|| uniform_matrix(n, rng));
        let w = supply
            .measurement
            .clone()
            .unwrap_or_else(|| uniform_vector(n, rng));
        let g = supply
            .persistence
            .clone()
            .unwrap_or_else(|| uniform_vector(n, rng));
        StructuralMatrices::new(f, w, g)
    };
    let accept = |candidate: &Result<StructuralMatrices, SsmError>| {
        candidate.as_ref().is_ok_and(StructuralMatrices::is_stable)
    };
    let shrink = |candidate: &Result<StructuralMatrices, SsmError>, factor: f64| {
        let m = candidate.clone()?;
        let (f, w, g) = m.into_parts();
        StructuralMatrices::new(
            if supply.transition.is_some() { f } else { f * factor },
            if supply.measurement.is_some() { w } else { w * factor },
            if supply.persistence.is_some() { g } else { g * factor },
        )
    };

    let (matrices, report) = search_stable(search, rng, draw, accept, shrink)?;
    debug!(
        attempts = report.attempts,
        shrink_steps = report.shrink_steps,
        "stable structural matrices drawn"
    );
    Ok((matrices?, report))
}
