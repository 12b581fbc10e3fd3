//! JSON reports written by the subcommands.

use std::path::Path;

use anyhow::{Context, Result};
use ndarray::{Array2, ArrayD, Axis};
use serde::Serialize;
use tracing::info;

use smooth_forecast::{Forecast, GesFit};
use smooth_sim::{Simulation, ges_name};
use smooth_ssm::StructuralMatrices;

/// Structural matrices of one model.
#[derive(Debug, Serialize)]
pub struct MatricesReport {
    pub transition: Vec<Vec<f64>>,
    pub measurement: Vec<f64>,
    pub persistence: Vec<f64>,
}

impl From<&StructuralMatrices> for MatricesReport {
    fn from(m: &StructuralMatrices) -> Self {
        Self {
            transition: rows(m.transition()),
            measurement: m.measurement().to_vec(),
            persistence: m.persistence().to_vec(),
        }
    }
}

/// One simulated path.
#[derive(Debug, Serialize)]
pub struct PathReport {
    #[serde(flatten)]
    pub matrices: MatricesReport,
    pub log_likelihood: f64,
    pub data: Vec<f64>,
    pub occurrence: Vec<f64>,
}

/// Output of `smooth simulate`.
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub model: String,
    pub error_type: &'static str,
    pub data_start: f64,
    pub frequency: usize,
    pub warnings: Vec<String>,
    pub paths: Vec<PathReport>,
}

impl From<&Simulation> for SimulationReport {
    fn from(sim: &Simulation) -> Self {
        let n = sim.n_paths();
        let data = per_path(sim.data(), n);
        let occurrence = per_path(sim.occurrence(), n);
        let paths = sim
            .matrices()
            .iter()
            .zip(sim.log_likelihood())
            .zip(data.into_iter().zip(occurrence))
            .map(|((m, &ll), (data, occurrence))| PathReport {
                matrices: m.into(),
                log_likelihood: ll,
                data,
                occurrence,
            })
            .collect();
        Self {
            model: sim.model().to_string(),
            error_type: sim.error_type().code(),
            data_start: sim.data_index().start(),
            frequency: sim.data_index().frequency(),
            warnings: sim.warnings().iter().map(ToString::to_string).collect(),
            paths,
        }
    }
}

/// Forecast section of a fit report.
#[derive(Debug, Serialize)]
pub struct ForecastReport {
    pub interval: &'static str,
    pub level: Option<f64>,
    pub point: Vec<f64>,
    pub lower: Option<Vec<f64>>,
    pub upper: Option<Vec<f64>>,
}

impl From<&Forecast> for ForecastReport {
    fn from(fc: &Forecast) -> Self {
        Self {
            interval: fc.kind().name(),
            level: fc.level(),
            point: fc.point().to_vec(),
            lower: fc.lower().map(|a| a.to_vec()),
            upper: fc.upper().map(|a| a.to_vec()),
        }
    }
}

/// Output of `smooth fit`.
#[derive(Debug, Serialize)]
pub struct FitReport {
    pub model: String,
    pub error_type: &'static str,
    pub n_obs: usize,
    pub sigma2: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub aicc: f64,
    pub bic: f64,
    #[serde(flatten)]
    pub matrices: MatricesReport,
    pub forecast: Option<ForecastReport>,
}

impl FitReport {
    pub fn new(fit: &GesFit, forecast: Option<&Forecast>) -> Self {
        let s = fit.structure();
        Self {
            model: ges_name(s.orders(), s.lags(), false),
            error_type: fit.error_type().code(),
            n_obs: fit.n_obs(),
            sigma2: fit.sigma2(),
            log_likelihood: fit.log_likelihood(),
            aic: fit.aic(),
            aicc: fit.aicc(),
            bic: fit.bic(),
            matrices: fit.matrices().into(),
            forecast: forecast.map(Into::into),
        }
    }
}

fn rows(m: &Array2<f64>) -> Vec<Vec<f64>> {
    m.rows().into_iter().map(|r| r.to_vec()).collect()
}

/// Splits an array with an optional trailing path axis into one vector per
/// path.
pub fn per_path(arr: &ArrayD<f64>, n_paths: usize) -> Vec<Vec<f64>> {
    if n_paths <= 1 || arr.ndim() == 0 {
        return vec![arr.iter().copied().collect()];
    }
    arr.axis_iter(Axis(arr.ndim() - 1))
        .map(|v| v.iter().copied().collect())
        .collect()
}

/// Writes pretty JSON to `path`, or to stdout when `path` is `None`.
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialise report")?;
    match path {
        Some(p) => {
            std::fs::write(p, json)
                .with_context(|| format!("failed to write report: {}", p.display()))?;
            info!(path = %p.display(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
