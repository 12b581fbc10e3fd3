//! Per-path input drawing and parallel execution.
//!
//! One seed per path is taken from the master RNG before any parallel work,
//! so results depend only on the master seed and not on scheduling.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use smooth_noise::{ErrorSampler, NoiseContext, OccurrenceModel};
use smooth_ssm::{
    ErrorType, PathInputs, PathOutput, SsmError, StructuralMatrices, simulate_batch,
};
use tracing::{debug, warn};

use crate::config::SimSettings;
use crate::error::SimError;
use crate::warning::SimulationWarning;

/// Upper bound of the uniform draw for generated initial states.
pub(crate) const INITIAL_UPPER: f64 = 1000.0;

/// Error scale for multiplicative models; errors are relative there.
pub(crate) const MULTIPLICATIVE_ERROR_SCALE: f64 = 0.01;

/// Error scale used when the initial block averages to zero.
pub const ADDITIVE_SCALE_FLOOR: f64 = 1.0;

/// Randomly drawn inputs of one path.
#[derive(Clone, Debug)]
pub(crate) struct PathDraw {
    pub matrices: StructuralMatrices,
    pub initial: Array2<f64>,
    pub errors: Array1<f64>,
    pub occurrence: Array1<f64>,
    pub scale_floored: bool,
}

/// Everything produced by [`run`].
#[derive(Debug)]
pub(crate) struct PathRun {
    pub draws: Vec<PathDraw>,
    pub outputs: Vec<PathOutput>,
    pub warnings: Vec<SimulationWarning>,
    pub intermittent: bool,
}

pub(crate) fn path_seeds(seed: Option<u64>, paths: usize) -> Vec<u64> {
    let mut master = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };
    (0..paths).map(|_| master.random()).collect()
}

/// Draws an initial block on `[0, INITIAL_UPPER)`; multiplicative models
/// store the logarithm of a strictly positive draw.
pub(crate) fn draw_initial<R: Rng + ?Sized>(
    max_lag: usize,
    n_components: usize,
    error_type: ErrorType,
    rng: &mut R,
) -> Array2<f64> {
    Array2::from_shape_fn((max_lag, n_components), |_| match error_type {
        ErrorType::Additive => rng.random_range(0.0..INITIAL_UPPER),
        ErrorType::Multiplicative => rng.random_range(f64::MIN_POSITIVE..INITIAL_UPPER).ln(),
    })
}

/// Level scale handed to the error sampler, and whether the additive scale
/// fell below `f64::EPSILON` and was replaced by [`ADDITIVE_SCALE_FLOOR`].
pub(crate) fn error_scale(initial: &Array2<f64>, error_type: ErrorType) -> (f64, bool) {
    match error_type {
        ErrorType::Additive => {
            let scale = initial.mean().map_or(0.0, f64::abs);
            if scale < f64::EPSILON {
                (ADDITIVE_SCALE_FLOOR, true)
            } else {
                (scale, false)
            }
        }
        ErrorType::Multiplicative => (MULTIPLICATIVE_ERROR_SCALE, false),
    }
}

fn validated_initial<'a>(
    settings: &'a SimSettings,
    max_lag: usize,
    n_components: usize,
    warnings: &mut Vec<SimulationWarning>,
) -> Option<&'a Array2<f64>> {
    let initial = settings.initial()?;
    if initial.dim() == (max_lag, n_components) {
        return Some(initial);
    }
    let expected = vec![max_lag, n_components];
    let got = initial.shape().to_vec();
    warn!(?expected, ?got, "discarding wrong-shaped initial block");
    warnings.push(SimulationWarning::InitialDiscarded { expected, got });
    None
}

/// Draws per-path inputs and runs the recursion for every path.
///
/// `draw_matrices` is called once per path with that path's RNG, before the
/// initial block, errors and occurrence are drawn from the same RNG.
pub(crate) fn run<M>(
    settings: &SimSettings,
    model_lags: &[usize],
    mut warnings: Vec<SimulationWarning>,
    draw_matrices: M,
) -> Result<PathRun, SimError>
where
    M: Fn(&mut StdRng) -> Result<StructuralMatrices, SsmError> + Sync,
{
    let n_components = model_lags.len();
    let max_lag = model_lags.iter().copied().max().unwrap_or(0);
    let n_obs = settings.observations();
    let error_type = settings.error_type();

    let mut paths = settings.paths();
    if paths == 0 {
        warn!("zero paths requested, simulating one");
        warnings.push(SimulationWarning::PathsRaised);
        paths = 1;
    }

    let (spec, spec_warning) = settings.resolve_error()?;
    warnings.extend(spec_warning.map(SimulationWarning::from));

    let (occurrence, occurrence_warning) = OccurrenceModel::new(settings.occurrence(), n_obs)?;
    warnings.extend(occurrence_warning.map(SimulationWarning::from));

    let ctx = NoiseContext::new(n_obs, n_components, max_lag)
        .with_occurrence_mean(occurrence.mean_probability());
    let sampler = ErrorSampler::new(&spec, &ctx)?;

    let initial = validated_initial(settings, max_lag, n_components, &mut warnings);
    let seeds = path_seeds(settings.seed(), paths);

    let draws = seeds
        .par_iter()
        .map(|&seed| -> Result<PathDraw, SimError> {
            let mut rng = StdRng::seed_from_u64(seed);
            let matrices = draw_matrices(&mut rng)?;
            let initial = match initial {
                Some(block) => block.clone(),
                None => draw_initial(max_lag, n_components, error_type, &mut rng),
            };
            let (scale, scale_floored) = error_scale(&initial, error_type);
            let errors = sampler.draw_path(n_obs, scale, &mut rng);
            let occurrence = occurrence.draw_path(n_obs, &mut rng);
            Ok(PathDraw {
                matrices,
                initial,
                errors,
                occurrence,
                scale_floored,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let floored = draws.iter().filter(|d| d.scale_floored).count();
    if floored > 0 {
        warn!(
            paths = floored,
            floor = ADDITIVE_SCALE_FLOOR,
            "initial block averages to zero, using the error scale floor"
        );
        warnings.push(SimulationWarning::ErrorScaleFloored { paths: floored });
    }

    let inputs: Vec<PathInputs<'_>> = draws
        .iter()
        .map(|d| PathInputs {
            matrices: &d.matrices,
            initial: d.initial.view(),
            errors: d.errors.view(),
            occurrence: d.occurrence.view(),
        })
        .collect();
    let outputs = simulate_batch(model_lags, error_type, &inputs)?;
    debug!(paths, n_obs, "paths simulated");

    Ok(PathRun {
        draws,
        outputs,
        warnings,
        intermittent: occurrence.is_intermittent(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn seeds_are_reproducible() {
        assert_eq!(path_seeds(Some(1), 4), path_seeds(Some(1), 4));
        assert_ne!(path_seeds(Some(1), 4), path_seeds(Some(2), 4));
        assert_eq!(path_seeds(None, 3).len(), 3);
    }

    #[test]
    fn initial_ranges() {
        let mut rng = StdRng::seed_from_u64(4);
        let a = draw_initial(12, 3, ErrorType::Additive, &mut rng);
        assert_eq!(a.dim(), (12, 3));
        assert!(a.iter().all(|&x| (0.0..INITIAL_UPPER).contains(&x)));
        let m = draw_initial(2, 2, ErrorType::Multiplicative, &mut rng);
        assert!(m.iter().all(|&x| x.is_finite() && x < INITIAL_UPPER.ln()));
    }

    #[test]
    fn scale_is_absolute_mean() {
        let block = array![[-4.0, 2.0], [-6.0, 0.0]];
        assert_eq!(error_scale(&block, ErrorType::Additive), (2.0, false));
        assert_eq!(
            error_scale(&block, ErrorType::Multiplicative),
            (MULTIPLICATIVE_ERROR_SCALE, false)
        );
    }

    #[test]
    fn zero_mean_scale_is_floored() {
        assert_eq!(
            error_scale(&array![[-5.0, 5.0]], ErrorType::Additive),
            (ADDITIVE_SCALE_FLOOR, true)
        );
        assert_eq!(
            error_scale(&array![[0.0]], ErrorType::Additive),
            (ADDITIVE_SCALE_FLOOR, true)
        );
    }

    #[test]
    fn wrong_initial_is_discarded() {
        let settings = SimSettings::new().with_initial(array![[1.0, 2.0]]);
        let mut warnings = Vec::new();
        assert!(validated_initial(&settings, 1, 1, &mut warnings).is_none());
        assert_eq!(
            warnings,
            vec![SimulationWarning::InitialDiscarded {
                expected: vec![1, 1],
                got: vec![1, 2]
            }]
        );
        let mut warnings = Vec::new();
        assert!(validated_initial(&settings, 1, 2, &mut warnings).is_some());
        assert!(warnings.is_empty());
    }
}
