use std::path::PathBuf;

use serde::Deserialize;

/// Top-level `smooth simulate` configuration.
///
/// Exactly one of `[ges]` or `[ssarima]` must be present.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulateToml {
    /// RNG seed.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Output JSON path.
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// GES model.
    #[serde(default)]
    pub ges: Option<GesToml>,

    /// SSARIMA model.
    #[serde(default)]
    pub ssarima: Option<SsarimaToml>,

    /// Run settings shared by both models.
    #[serde(default)]
    pub settings: SettingsToml,

    /// Error distribution.
    #[serde(default)]
    pub errors: ErrorsToml,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GesToml {
    pub orders: Vec<i64>,
    pub lags: Vec<i64>,
    /// Rows of `F`.
    #[serde(default)]
    pub transition: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub measurement: Option<Vec<f64>>,
    #[serde(default)]
    pub persistence: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SsarimaToml {
    pub ar: Vec<i64>,
    pub i: Vec<i64>,
    pub ma: Vec<i64>,
    pub lags: Vec<i64>,
    #[serde(default)]
    pub ar_coefficients: Option<Vec<f64>>,
    #[serde(default)]
    pub ma_coefficients: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsToml {
    #[serde(default = "default_observations")]
    pub observations: f64,
    #[serde(default = "default_one")]
    pub paths: f64,
    #[serde(default = "default_one")]
    pub frequency: f64,
    #[serde(default = "default_error_type")]
    pub error_type: String,
    #[serde(default = "default_occurrence")]
    pub occurrence: Vec<f64>,
    /// Rows of the initial block.
    #[serde(default)]
    pub initial: Option<Vec<Vec<f64>>>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_max_shrink_steps")]
    pub max_shrink_steps: usize,
}

impl Default for SettingsToml {
    fn default() -> Self {
        Self {
            observations: default_observations(),
            paths: default_one(),
            frequency: default_one(),
            error_type: default_error_type(),
            occurrence: default_occurrence(),
            initial: None,
            max_attempts: default_max_attempts(),
            max_shrink_steps: default_max_shrink_steps(),
        }
    }
}

fn default_observations() -> f64 {
    10.0
}
fn default_one() -> f64 {
    1.0
}
fn default_error_type() -> String {
    "additive".to_string()
}
fn default_occurrence() -> Vec<f64> {
    vec![1.0]
}
fn default_max_attempts() -> usize {
    10_000
}
fn default_max_shrink_steps() -> usize {
    64
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorsToml {
    #[serde(default = "default_distribution")]
    pub distribution: String,
    /// Positional distribution parameters.
    #[serde(default)]
    pub params: Vec<f64>,
}

impl Default for ErrorsToml {
    fn default() -> Self {
        Self {
            distribution: default_distribution(),
            params: Vec::new(),
        }
    }
}

fn default_distribution() -> String {
    "normal".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_ges_config_uses_defaults() {
        let cfg: SimulateToml = toml::from_str(
            r#"
            [ges]
            orders = [1]
            lags = [1]
            "#,
        )
        .unwrap();
        assert!(cfg.ges.is_some());
        assert!(cfg.ssarima.is_none());
        assert_eq!(cfg.settings.observations, 10.0);
        assert_eq!(cfg.settings.occurrence, vec![1.0]);
        assert_eq!(cfg.errors.distribution, "normal");
    }

    #[test]
    fn full_config_parses() {
        let cfg: SimulateToml = toml::from_str(
            r#"
            seed = 7
            output = "out.json"

            [ssarima]
            ar = [1, 0]
            i = [0, 1]
            ma = [1, 1]
            lags = [1, 12]
            ar_coefficients = [0.5]

            [settings]
            observations = 120
            paths = 3
            frequency = 12
            error_type = "multiplicative"
            occurrence = [0.8]
            max_attempts = 50

            [errors]
            distribution = "t"
            params = [5.0]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.seed, Some(7));
        let s = cfg.ssarima.unwrap();
        assert_eq!(s.lags, vec![1, 12]);
        assert_eq!(s.ar_coefficients, Some(vec![0.5]));
        assert_eq!(cfg.settings.paths, 3.0);
        assert_eq!(cfg.settings.max_shrink_steps, 64);
        assert_eq!(cfg.errors.params, vec![5.0]);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = toml::from_str::<SimulateToml>(
            r#"
            [settings]
            horizon = 3
            "#,
        );
        assert!(err.is_err());
    }
}
