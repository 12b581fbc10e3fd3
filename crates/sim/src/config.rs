//! Configuration types for GES and SSARIMA simulation.

use ndarray::{Array1, Array2};
use smooth_noise::{ErrorSpec, NoiseError, NoiseWarning};
use smooth_ssm::{ErrorType, MatrixSupply, StabilitySearch};

/// Coerces a real-valued count to a non-negative integer: `round(|x|)`.
///
/// Non-finite input gives 0. Never fails.
///
/// # Example
///
/// ```
/// use smooth_sim::normalize_count;
///
/// assert_eq!(normalize_count(-2.6), 3);
/// assert_eq!(normalize_count(10.0), 10);
/// ```
pub fn normalize_count(x: f64) -> usize {
    if !x.is_finite() {
        return 0;
    }
    x.abs().round() as usize
}

#[derive(Clone, Debug, PartialEq)]
enum ErrorChoice {
    Spec(ErrorSpec),
    Named { name: String, params: Vec<f64> },
}

/// Settings shared by every simulated model.
#[derive(Clone, Debug, PartialEq)]
pub struct SimSettings {
    observations: usize,
    paths: usize,
    frequency: usize,
    error_type: ErrorType,
    error: ErrorChoice,
    occurrence: Vec<f64>,
    initial: Option<Array2<f64>>,
    seed: Option<u64>,
    search: StabilitySearch,
}

impl SimSettings {
    /// Creates settings with defaults.
    ///
    /// Defaults: 10 observations, 1 path, frequency 1, additive errors,
    /// default normal errors, occurrence probability 1, generated initial
    /// block, OS-seeded RNG, default [`StabilitySearch`].
    pub fn new() -> Self {
        Self {
            observations: 10,
            paths: 1,
            frequency: 1,
            error_type: ErrorType::Additive,
            error: ErrorChoice::Spec(ErrorSpec::default()),
            occurrence: vec![1.0],
            initial: None,
            seed: None,
            search: StabilitySearch::new(),
        }
    }

    /// Sets the number of observations per path, coerced with
    /// [`normalize_count`].
    pub fn with_observations(mut self, observations: f64) -> Self {
        self.observations = normalize_count(observations);
        self
    }

    /// Sets the number of paths, coerced with [`normalize_count`].
    pub fn with_paths(mut self, paths: f64) -> Self {
        self.paths = normalize_count(paths);
        self
    }

    /// Sets the series frequency, coerced with [`normalize_count`].
    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = normalize_count(frequency);
        self
    }

    /// Sets the error type.
    pub fn with_error_type(mut self, error_type: ErrorType) -> Self {
        self.error_type = error_type;
        self
    }

    /// Sets a resolved error specification.
    pub fn with_error_spec(mut self, spec: ErrorSpec) -> Self {
        self.error = ErrorChoice::Spec(spec);
        self
    }

    /// Sets the error family by name with positional parameters; resolved
    /// when the simulation runs.
    pub fn with_error_distribution(mut self, name: impl Into<String>, params: Vec<f64>) -> Self {
        self.error = ErrorChoice::Named {
            name: name.into(),
            params,
        };
        self
    }

    /// Sets the occurrence probabilities (one value or one per observation).
    pub fn with_occurrence(mut self, probabilities: Vec<f64>) -> Self {
        self.occurrence = probabilities;
        self
    }

    /// Supplies the initial block, shape `(max_lag, n_components)`.
    pub fn with_initial(mut self, initial: Array2<f64>) -> Self {
        self.initial = Some(initial);
        self
    }

    /// Seeds the master RNG.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the stability-search bounds.
    pub fn with_stability_search(mut self, search: StabilitySearch) -> Self {
        self.search = search;
        self
    }

    /// Returns the number of observations per path.
    pub fn observations(&self) -> usize {
        self.observations
    }

    /// Returns the number of paths.
    pub fn paths(&self) -> usize {
        self.paths
    }

    /// Returns the series frequency.
    pub fn frequency(&self) -> usize {
        self.frequency
    }

    /// Returns the error type.
    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// Returns the occurrence probabilities.
    pub fn occurrence(&self) -> &[f64] {
        &self.occurrence
    }

    /// Returns the supplied initial block, if any.
    pub fn initial(&self) -> Option<&Array2<f64>> {
        self.initial.as_ref()
    }

    /// Returns the seed, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns the stability-search bounds.
    pub fn stability_search(&self) -> &StabilitySearch {
        &self.search
    }

    /// Resolves the configured error family.
    pub(crate) fn resolve_error(&self) -> Result<(ErrorSpec, Option<NoiseWarning>), NoiseError> {
        match &self.error {
            ErrorChoice::Spec(spec) => Ok((*spec, None)),
            ErrorChoice::Named { name, params } => ErrorSpec::from_name(name, params),
        }
    }
}

impl Default for SimSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Forwards the shared builders to the embedded [`SimSettings`].
macro_rules! settings_builders {
    ($ty:ty) => {
        impl $ty {
            /// Replaces the shared settings.
            pub fn with_settings(mut self, settings: SimSettings) -> Self {
                self.settings = settings;
                self
            }

            /// Returns the shared settings.
            pub fn settings(&self) -> &SimSettings {
                &self.settings
            }

            /// See [`SimSettings::with_observations`].
            pub fn with_observations(mut self, observations: f64) -> Self {
                self.settings = self.settings.with_observations(observations);
                self
            }

            /// See [`SimSettings::with_paths`].
            pub fn with_paths(mut self, paths: f64) -> Self {
                self.settings = self.settings.with_paths(paths);
                self
            }

            /// See [`SimSettings::with_frequency`].
            pub fn with_frequency(mut self, frequency: f64) -> Self {
                self.settings = self.settings.with_frequency(frequency);
                self
            }

            /// See [`SimSettings::with_error_type`].
            pub fn with_error_type(mut self, error_type: ErrorType) -> Self {
                self.settings = self.settings.with_error_type(error_type);
                self
            }

            /// See [`SimSettings::with_error_spec`].
            pub fn with_error_spec(mut self, spec: ErrorSpec) -> Self {
                self.settings = self.settings.with_error_spec(spec);
                self
            }

            /// See [`SimSettings::with_error_distribution`].
            pub fn with_error_distribution(
                mut self,
                name: impl Into<String>,
                params: Vec<f64>,
            ) -> Self {
                self.settings = self.settings.with_error_distribution(name, params);
                self
            }

            /// See [`SimSettings::with_occurrence`].
            pub fn with_occurrence(mut self, probabilities: Vec<f64>) -> Self {
                self.settings = self.settings.with_occurrence(probabilities);
                self
            }

            /// See [`SimSettings::with_initial`].
            pub fn with_initial(mut self, initial: Array2<f64>) -> Self {
                self.settings = self.settings.with_initial(initial);
                self
            }

            /// See [`SimSettings::with_seed`].
            pub fn with_seed(mut self, seed: u64) -> Self {
                self.settings = self.settings.with_seed(seed);
                self
            }

            /// See [`SimSettings::with_stability_search`].
            pub fn with_stability_search(mut self, search: StabilitySearch) -> Self {
                self.settings = self.settings.with_stability_search(search);
                self
            }
        }
    };
}

/// Configuration of a GES simulation.
///
/// `orders` and `lags` are taken as signed integers so that invalid input
/// reaches the normaliser and fails there with a typed error.
#[derive(Clone, Debug, PartialEq)]
pub struct GesConfig {
    orders: Vec<i64>,
    lags: Vec<i64>,
    supply: MatrixSupply,
    settings: SimSettings,
}

impl GesConfig {
    /// Creates a configuration with default [`SimSettings`] and generated
    /// matrices.
    pub fn new(orders: Vec<i64>, lags: Vec<i64>) -> Self {
        Self {
            orders,
            lags,
            supply: MatrixSupply::new(),
            settings: SimSettings::new(),
        }
    }

    /// Supplies the transition matrix `F`.
    pub fn with_transition(mut self, transition: Array2<f64>) -> Self {
        self.supply = self.supply.with_transition(transition);
        self
    }

    /// Supplies the measurement vector `w`.
    pub fn with_measurement(mut self, measurement: Array1<f64>) -> Self {
        self.supply = self.supply.with_measurement(measurement);
        self
    }

    /// Supplies the persistence vector `g`.
    pub fn with_persistence(mut self, persistence: Array1<f64>) -> Self {
        self.supply = self.supply.with_persistence(persistence);
        self
    }

    /// Returns the orders as supplied.
    pub fn orders(&self) -> &[i64] {
        &self.orders
    }

    /// Returns the lags as supplied.
    pub fn lags(&self) -> &[i64] {
        &self.lags
    }

    /// Returns the supplied structural arrays.
    pub fn supply(&self) -> &MatrixSupply {
        &self.supply
    }
}

settings_builders!(GesConfig);

/// Configuration of an SSARIMA simulation.
///
/// One AR, I and MA order per lag.
#[derive(Clone, Debug, PartialEq)]
pub struct SsarimaConfig {
    ar_orders: Vec<i64>,
    i_orders: Vec<i64>,
    ma_orders: Vec<i64>,
    lags: Vec<i64>,
    ar_coefficients: Option<Vec<f64>>,
    ma_coefficients: Option<Vec<f64>>,
    settings: SimSettings,
}

impl SsarimaConfig {
    /// Creates a configuration with default [`SimSettings`] and generated
    /// coefficients.
    pub fn new(ar_orders: Vec<i64>, i_orders: Vec<i64>, ma_orders: Vec<i64>, lags: Vec<i64>) -> Self {
        Self {
            ar_orders,
            i_orders,
            ma_orders,
            lags,
            ar_coefficients: None,
            ma_coefficients: None,
            settings: SimSettings::new(),
        }
    }

    /// Supplies AR coefficients, lag by lag in normalised lag order.
    pub fn with_ar_coefficients(mut self, coefficients: Vec<f64>) -> Self {
        self.ar_coefficients = Some(coefficients);
        self
    }

    /// Supplies MA coefficients, lag by lag in normalised lag order.
    pub fn with_ma_coefficients(mut self, coefficients: Vec<f64>) -> Self {
        self.ma_coefficients = Some(coefficients);
        self
    }

    /// Returns the AR orders as supplied.
    pub fn ar_orders(&self) -> &[i64] {
        &self.ar_orders
    }

    /// Returns the differencing orders as supplied.
    pub fn i_orders(&self) -> &[i64] {
        &self.i_orders
    }

    /// Returns the MA orders as supplied.
    pub fn ma_orders(&self) -> &[i64] {
        &self.ma_orders
    }

    /// Returns the lags as supplied.
    pub fn lags(&self) -> &[i64] {
        &self.lags
    }

    /// Returns the supplied AR coefficients, if any.
    pub fn ar_coefficients(&self) -> Option<&[f64]> {
        self.ar_coefficients.as_deref()
    }

    /// Returns the supplied MA coefficients, if any.
    pub fn ma_coefficients(&self) -> Option<&[f64]> {
        self.ma_coefficients.as_deref()
    }
}

settings_builders!(SsarimaConfig);

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use smooth_noise::ErrorFamily;

    #[test]
    fn normalize_count_rounds_absolute_value() {
        assert_eq!(normalize_count(0.0), 0);
        assert_eq!(normalize_count(0.4), 0);
        assert_eq!(normalize_count(0.5), 1);
        assert_eq!(normalize_count(-7.2), 7);
        assert_eq!(normalize_count(f64::NAN), 0);
        assert_eq!(normalize_count(f64::INFINITY), 0);
    }

    #[test]
    fn settings_defaults() {
        let s = SimSettings::default();
        assert_eq!(s.observations(), 10);
        assert_eq!(s.paths(), 1);
        assert_eq!(s.frequency(), 1);
        assert_eq!(s.error_type(), ErrorType::Additive);
        assert_eq!(s.occurrence(), &[1.0]);
        assert!(s.initial().is_none());
        assert!(s.seed().is_none());
        assert_eq!(s.stability_search().max_attempts(), 10_000);
    }

    #[test]
    fn builders_coerce_counts() {
        let c = GesConfig::new(vec![1], vec![1])
            .with_observations(-49.6)
            .with_paths(2.2)
            .with_frequency(12.0);
        assert_eq!(c.settings().observations(), 50);
        assert_eq!(c.settings().paths(), 2);
        assert_eq!(c.settings().frequency(), 12);
    }

    #[test]
    fn ges_supply() {
        let c = GesConfig::new(vec![1], vec![1])
            .with_transition(array![[1.0]])
            .with_persistence(array![0.2]);
        assert!(c.supply().transition().is_some());
        assert!(c.supply().measurement().is_none());
        assert_eq!(c.orders(), &[1]);
        assert_eq!(c.lags(), &[1]);
    }

    #[test]
    fn error_resolution() {
        let s = SimSettings::new().with_error_distribution("rbeta", vec![2.0, 3.0]);
        let (spec, warning) = s.resolve_error().unwrap();
        assert_eq!(spec.family(), ErrorFamily::Beta);
        assert!(warning.is_none());

        let s = SimSettings::new().with_error_distribution("nonsense", vec![]);
        let (spec, warning) = s.resolve_error().unwrap();
        assert_eq!(spec.family(), ErrorFamily::Normal);
        assert!(warning.is_some());
    }

    #[test]
    fn ssarima_accessors() {
        let c = SsarimaConfig::new(vec![1, 0], vec![0, 1], vec![1, 1], vec![1, 12])
            .with_ar_coefficients(vec![0.5])
            .with_seed(3);
        assert_eq!(c.ar_orders(), &[1, 0]);
        assert_eq!(c.i_orders(), &[0, 1]);
        assert_eq!(c.ma_orders(), &[1, 1]);
        assert_eq!(c.lags(), &[1, 12]);
        assert_eq!(c.ar_coefficients(), Some(&[0.5][..]));
        assert!(c.ma_coefficients().is_none());
        assert_eq!(c.settings().seed(), Some(3));
    }
}
