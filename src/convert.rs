//! Pure conversion functions: TOML and CLI values -> crate API config types.

use anyhow::{Result, bail};
use ndarray::{Array1, Array2};

use smooth_forecast::IntervalKind;
use smooth_sim::{GesConfig, SimSettings, SsarimaConfig};
use smooth_ssm::{ErrorType, StabilitySearch};

use crate::cli::IntervalArg;
use crate::config::*;

/// A model ready to simulate.
#[derive(Debug)]
pub enum SimModel {
    Ges(GesConfig),
    Ssarima(SsarimaConfig),
}

/// Parses an error type name.
pub fn parse_error_type(s: &str) -> Result<ErrorType> {
    match s.trim().to_lowercase().as_str() {
        "a" | "additive" => Ok(ErrorType::Additive),
        "m" | "multiplicative" => Ok(ErrorType::Multiplicative),
        other => bail!("unknown error type: {other:?}"),
    }
}

/// Converts TOML rows into a matrix; every row must have the same length.
pub fn matrix_from_rows(rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    let n_cols = rows.first().map_or(0, Vec::len);
    if let Some(bad) = rows.iter().position(|r| r.len() != n_cols) {
        bail!(
            "ragged matrix: row {bad} has {} values, expected {n_cols}",
            rows[bad].len()
        );
    }
    Ok(Array2::from_shape_fn((rows.len(), n_cols), |(i, j)| {
        rows[i][j]
    }))
}

/// Maps the CLI interval flag onto the library enum.
pub fn interval_kind(arg: IntervalArg) -> IntervalKind {
    match arg {
        IntervalArg::None => IntervalKind::None,
        IntervalArg::Parametric => IntervalKind::Parametric,
        IntervalArg::Simulated => IntervalKind::Simulated,
        IntervalArg::Bootstrap => IntervalKind::Bootstrap,
    }
}

/// Builds [`SimSettings`] from the TOML settings and error tables.
pub fn build_settings(
    settings: &SettingsToml,
    errors: &ErrorsToml,
    seed: Option<u64>,
) -> Result<SimSettings> {
    let search = StabilitySearch::new()
        .with_max_attempts(settings.max_attempts)
        .with_max_shrink_steps(settings.max_shrink_steps);
    let mut cfg = SimSettings::new()
        .with_observations(settings.observations)
        .with_paths(settings.paths)
        .with_frequency(settings.frequency)
        .with_error_type(parse_error_type(&settings.error_type)?)
        .with_error_distribution(errors.distribution.clone(), errors.params.clone())
        .with_occurrence(settings.occurrence.clone())
        .with_stability_search(search);
    if let Some(ref rows) = settings.initial {
        cfg = cfg.with_initial(matrix_from_rows(rows)?);
    }
    if let Some(s) = seed {
        cfg = cfg.with_seed(s);
    }
    Ok(cfg)
}

/// Builds the model to simulate. A CLI seed wins over the config seed.
///
/// Exactly one of `[ges]` or `[ssarima]` must be set.
pub fn build_model(config: &SimulateToml, seed_override: Option<u64>) -> Result<SimModel> {
    let settings = build_settings(
        &config.settings,
        &config.errors,
        seed_override.or(config.seed),
    )?;
    match (&config.ges, &config.ssarima) {
        (Some(ges), None) => {
            let mut cfg = GesConfig::new(ges.orders.clone(), ges.lags.clone());
            if let Some(ref rows) = ges.transition {
                cfg = cfg.with_transition(matrix_from_rows(rows)?);
            }
            if let Some(ref w) = ges.measurement {
                cfg = cfg.with_measurement(Array1::from(w.clone()));
            }
            if let Some(ref g) = ges.persistence {
                cfg = cfg.with_persistence(Array1::from(g.clone()));
            }
            Ok(SimModel::Ges(cfg.with_settings(settings)))
        }
        (None, Some(arima)) => {
            let mut cfg = SsarimaConfig::new(
                arima.ar.clone(),
                arima.i.clone(),
                arima.ma.clone(),
                arima.lags.clone(),
            );
            if let Some(ref c) = arima.ar_coefficients {
                cfg = cfg.with_ar_coefficients(c.clone());
            }
            if let Some(ref c) = arima.ma_coefficients {
                cfg = cfg.with_ma_coefficients(c.clone());
            }
            Ok(SimModel::Ssarima(cfg.with_settings(settings)))
        }
        (Some(_), Some(_)) => bail!("config must have exactly one of [ges] or [ssarima], got both"),
        (None, None) => bail!("config must have exactly one of [ges] or [ssarima], got neither"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> SimulateToml {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn error_type_names() {
        assert_eq!(parse_error_type("A").unwrap(), ErrorType::Additive);
        assert_eq!(
            parse_error_type(" multiplicative ").unwrap(),
            ErrorType::Multiplicative
        );
        assert!(parse_error_type("log").is_err());
    }

    #[test]
    fn rows_become_matrix() {
        let m = matrix_from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m[[1, 0]], 3.0);
        assert!(matrix_from_rows(&[vec![1.0], vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn cli_seed_overrides_config() {
        let cfg = parse("seed = 1\n[ges]\norders = [1]\nlags = [1]\n");
        let SimModel::Ges(ges) = build_model(&cfg, Some(9)).unwrap() else {
            panic!("expected GES");
        };
        assert_eq!(ges.settings().seed(), Some(9));
        let SimModel::Ges(ges) = build_model(&cfg, None).unwrap() else {
            panic!("expected GES");
        };
        assert_eq!(ges.settings().seed(), Some(1));
    }

    #[test]
    fn supplied_matrices_are_forwarded() {
        let cfg = parse(
            "[ges]\norders = [1]\nlags = [1]\ntransition = [[1.0]]\nmeasurement = [1.0]\n",
        );
        let SimModel::Ges(ges) = build_model(&cfg, None).unwrap() else {
            panic!("expected GES");
        };
        assert!(ges.supply().transition().is_some());
        assert!(ges.supply().persistence().is_none());
    }

    #[test]
    fn exactly_one_model_required() {
        assert!(build_model(&parse(""), None).is_err());
        let both = parse("[ges]\norders = [1]\nlags = [1]\n[ssarima]\nar = [1]\ni = [0]\nma = [0]\nlags = [1]\n");
        assert!(build_model(&both, None).is_err());
    }

    #[test]
    fn interval_mapping() {
        assert_eq!(interval_kind(IntervalArg::Bootstrap), IntervalKind::Bootstrap);
        assert_eq!(interval_kind(IntervalArg::default()), IntervalKind::None);
    }
}
