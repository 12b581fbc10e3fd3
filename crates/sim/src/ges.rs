//! GES simulation entry point.

use smooth_ssm::{LagStructure, draw_stable_matrices};
use tracing::info;

use crate::config::GesConfig;
use crate::error::SimError;
use crate::paths;
use crate::result::{Simulation, ges_name};
use crate::warning::SimulationWarning;

/// Simulates a GES model.
///
/// Pipeline: normalise `(orders, lags)`, drop wrong-shaped user arrays with a
/// warning, then per path draw the missing structural pieces under the
/// stability constraint, the initial block, errors and occurrence, and run
/// the recursion. Paths run in parallel; with a seed the result is
/// reproducible.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`SimError::Ssm`] | invalid `(orders, lags)`, unstable supplied `F`, stability search exhausted, non-positive multiplicative factor |
/// | [`SimError::Noise`] | invalid error family parameters or occurrence probabilities |
///
/// # Example
///
/// ```
/// use smooth_sim::{GesConfig, simulate_ges};
///
/// let config = GesConfig::new(vec![1], vec![1])
///     .with_observations(50.0)
///     .with_seed(42);
/// let sim = simulate_ges(&config).unwrap();
/// assert_eq!(sim.model(), "GES(1[1])");
/// assert_eq!(sim.states().shape(), &[51, 1]);
/// ```
#[tracing::instrument(skip_all, fields(orders = ?config.orders(), lags = ?config.lags()))]
pub fn simulate_ges(config: &GesConfig) -> Result<Simulation, SimError> {
    let structure = LagStructure::new(config.orders(), config.lags())?;
    let n = structure.n_components();
    let settings = config.settings();

    let (supply, discarded) = config.supply().clone().validate(n);
    let warnings: Vec<SimulationWarning> = discarded.into_iter().map(Into::into).collect();

    let search = *settings.stability_search();
    let run = paths::run(settings, structure.model_lags(), warnings, |rng| {
        draw_stable_matrices(n, &supply, &search, rng).map(|(m, _)| m)
    })?;

    let model = ges_name(structure.orders(), structure.lags(), run.intermittent);
    info!(model = %model, paths = run.outputs.len(), "GES simulation finished");
    Ok(Simulation::from_run(
        model,
        settings.error_type(),
        structure.model_lags().to_vec(),
        settings.frequency(),
        run,
    ))
}
