//! Result packaging.
//!
//! Per-path outputs are stacked along a trailing path axis. With a single
//! path that axis is dropped, so a state trajectory is `(time, component)`
//! instead of `(time, component, 1)`.

use ndarray::{Array, ArrayD, Axis, Dimension, IxDyn};
use smooth_ssm::{ErrorType, StructuralMatrices};

use crate::paths::PathRun;
use crate::warning::SimulationWarning;

/// Time stamps of a regularly spaced series.
///
/// Element `i` is at `start + i / frequency`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeIndex {
    start: f64,
    frequency: usize,
    len: usize,
}

impl TimeIndex {
    /// Creates an index; a zero frequency is treated as 1.
    pub fn new(start: f64, frequency: usize, len: usize) -> Self {
        Self {
            start,
            frequency: frequency.max(1),
            len,
        }
    }

    /// Time of the first element.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Observations per unit of time.
    pub fn frequency(&self) -> usize {
        self.frequency
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` when the index has no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Time of every element.
    pub fn times(&self) -> Vec<f64> {
        let f = self.frequency as f64;
        (0..self.len).map(|i| self.start + i as f64 / f).collect()
    }
}

/// Stacks per-path arrays along a new trailing axis; one path keeps its
/// own shape.
pub(crate) fn stack_paths<D: Dimension>(parts: &[Array<f64, D>]) -> ArrayD<f64> {
    match parts {
        [single] => single.clone().into_dyn(),
        _ => {
            let base = parts.first().map(|p| p.shape().to_vec()).unwrap_or_default();
            let axis = base.len();
            let mut shape = base;
            shape.push(parts.len());
            let mut out = ArrayD::zeros(IxDyn(&shape));
            for (i, part) in parts.iter().enumerate() {
                out.index_axis_mut(Axis(axis), i)
                    .assign(&part.view().into_dyn());
            }
            out
        }
    }
}

/// Display name of a GES model, e.g. `"GES(1[1],2[12])"`.
pub fn ges_name(orders: &[usize], lags: &[usize], intermittent: bool) -> String {
    let body = orders
        .iter()
        .zip(lags)
        .map(|(o, l)| format!("{o}[{l}]"))
        .collect::<Vec<_>>()
        .join(",");
    let prefix = if intermittent { "i" } else { "" };
    format!("{prefix}GES({body})")
}

/// Output of a simulation call.
///
/// Arrays carry a trailing path axis when more than one path was simulated.
#[derive(Clone, Debug)]
pub struct Simulation {
    model: String,
    error_type: ErrorType,
    model_lags: Vec<usize>,
    matrices: Vec<StructuralMatrices>,
    transition: ArrayD<f64>,
    measurement: ArrayD<f64>,
    persistence: ArrayD<f64>,
    initial: ArrayD<f64>,
    data: ArrayD<f64>,
    states: ArrayD<f64>,
    residuals: ArrayD<f64>,
    occurrence: ArrayD<f64>,
    log_likelihood: Vec<f64>,
    data_index: TimeIndex,
    state_index: TimeIndex,
    warnings: Vec<SimulationWarning>,
}

impl Simulation {
    /// Packages a finished run (crate-internal constructor).
    pub(crate) fn from_run(
        model: String,
        error_type: ErrorType,
        model_lags: Vec<usize>,
        frequency: usize,
        run: PathRun,
    ) -> Self {
        let PathRun {
            draws,
            outputs,
            warnings,
            ..
        } = run;
        let max_lag = model_lags.iter().copied().max().unwrap_or(0);
        let n_obs = outputs.first().map_or(0, |o| o.observations.len());

        let transitions: Vec<_> = draws.iter().map(|d| d.matrices.transition().clone()).collect();
        let measurements: Vec<_> = draws.iter().map(|d| d.matrices.measurement().clone()).collect();
        let persistences: Vec<_> = draws.iter().map(|d| d.matrices.persistence().clone()).collect();
        let initials: Vec<_> = draws.iter().map(|d| d.initial.clone()).collect();
        let occurrences: Vec<_> = draws.iter().map(|d| d.occurrence.clone()).collect();
        let data: Vec<_> = outputs.iter().map(|o| o.observations.clone()).collect();
        let states: Vec<_> = outputs.iter().map(|o| o.states.clone()).collect();
        let residuals: Vec<_> = outputs.iter().map(|o| o.errors.clone()).collect();
        let log_likelihood = outputs
            .iter()
            .map(|o| {
                o.errors
                    .as_slice()
                    .map_or(f64::NAN, smooth_stats::gaussian_log_likelihood)
            })
            .collect();

        let freq = frequency.max(1);
        let data_index = TimeIndex::new(1.0, freq, n_obs);
        let state_index = TimeIndex::new(1.0 - max_lag as f64 / freq as f64, freq, max_lag + n_obs);

        Self {
            model,
            error_type,
            model_lags,
            matrices: draws.into_iter().map(|d| d.matrices).collect(),
            transition: stack_paths(&transitions),
            measurement: stack_paths(&measurements),
            persistence: stack_paths(&persistences),
            initial: stack_paths(&initials),
            data: stack_paths(&data),
            states: stack_paths(&states),
            residuals: stack_paths(&residuals),
            occurrence: stack_paths(&occurrences),
            log_likelihood,
            data_index,
            state_index,
            warnings,
        }
    }

    /// Model display name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Error type used for the recursion.
    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// Per-component lags.
    pub fn model_lags(&self) -> &[usize] {
        &self.model_lags
    }

    /// Number of simulated paths.
    pub fn n_paths(&self) -> usize {
        self.matrices.len()
    }

    /// Realised structural matrices, one entry per path.
    pub fn matrices(&self) -> &[StructuralMatrices] {
        &self.matrices
    }

    /// Transition matrices: `(c, c)` or `(c, c, paths)`.
    pub fn transition(&self) -> &ArrayD<f64> {
        &self.transition
    }

    /// Measurement vectors: `(c)` or `(c, paths)`.
    pub fn measurement(&self) -> &ArrayD<f64> {
        &self.measurement
    }

    /// Persistence vectors: `(c)` or `(c, paths)`.
    pub fn persistence(&self) -> &ArrayD<f64> {
        &self.persistence
    }

    /// Initial blocks: `(max_lag, c)` or `(max_lag, c, paths)`.
    pub fn initial(&self) -> &ArrayD<f64> {
        &self.initial
    }

    /// Generated series: `(obs)` or `(obs, paths)`.
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// State trajectories: `(max_lag + obs, c)` or `(max_lag + obs, c, paths)`.
    pub fn states(&self) -> &ArrayD<f64> {
        &self.states
    }

    /// Residuals (the realised errors): `(obs)` or `(obs, paths)`.
    pub fn residuals(&self) -> &ArrayD<f64> {
        &self.residuals
    }

    /// Occurrence masks: `(obs)` or `(obs, paths)`.
    pub fn occurrence(&self) -> &ArrayD<f64> {
        &self.occurrence
    }

    /// Gaussian log-likelihood of each path's residuals at their fitted
    /// variance.
    pub fn log_likelihood(&self) -> &[f64] {
        &self.log_likelihood
    }

    /// Time index of [`Simulation::data`].
    pub fn data_index(&self) -> &TimeIndex {
        &self.data_index
    }

    /// Time index of [`Simulation::states`]; starts `max_lag` periods before
    /// the data.
    pub fn state_index(&self) -> &TimeIndex {
        &self.state_index
    }

    /// Recoverable problems met while simulating.
    pub fn warnings(&self) -> &[SimulationWarning] {
        &self.warnings
    }
}
