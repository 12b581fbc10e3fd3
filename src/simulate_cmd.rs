//! Simulate command: run a GES or SSARIMA model described by a TOML file.

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use smooth_sim::{Simulation, simulate_ges, simulate_ssarima};

use crate::cli::SimulateArgs;
use crate::config::SimulateToml;
use crate::convert::{self, SimModel};
use crate::report::{self, SimulationReport};

/// Loads the config and runs the simulation.
pub fn simulate(args: &SimulateArgs) -> Result<(SimulateToml, Simulation)> {
    let toml_str = std::fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read config file: {}", args.config.display()))?;
    let config: SimulateToml =
        toml::from_str(&toml_str).context("failed to parse TOML config")?;

    let sim = match convert::build_model(&config, args.seed)? {
        SimModel::Ges(cfg) => simulate_ges(&cfg).context("GES simulation failed")?,
        SimModel::Ssarima(cfg) => simulate_ssarima(&cfg).context("SSARIMA simulation failed")?,
    };
    info!(model = sim.model(), paths = sim.n_paths(), "simulation complete");
    for w in sim.warnings() {
        warn!(%w, "input replaced");
    }
    Ok((config, sim))
}

/// Run the simulate command.
pub fn run(args: SimulateArgs) -> Result<()> {
    let _cmd = info_span!("simulate").entered();
    let (config, sim) = simulate(&args)?;
    let output = args.output.or(config.output);
    report::write_json(&SimulationReport::from(&sim), output.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("sim.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn writes_json_report() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let out = dir.path().join("out.json");
        let config = write_config(
            &dir,
            "seed = 3\n[ges]\norders = [1]\nlags = [1]\n[settings]\nobservations = 25\npaths = 2\n",
        );
        run(SimulateArgs {
            config,
            output: Some(out.clone()),
            seed: None,
        })
        .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(json["model"], "GES(1[1])");
        assert_eq!(json["paths"].as_array().unwrap().len(), 2);
        assert_eq!(json["paths"][0]["data"].as_array().unwrap().len(), 25);
        assert_eq!(json["paths"][1]["transition"][0].as_array().unwrap().len(), 1);
    }

    #[test]
    fn seed_makes_runs_identical() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = write_config(
            &dir,
            "[ssarima]\nar = [1]\ni = [1]\nma = [1]\nlags = [1]\n[settings]\nobservations = 30\n",
        );
        let args = || SimulateArgs {
            config: config.clone(),
            output: None,
            seed: Some(12),
        };
        let (_, a) = simulate(&args()).unwrap();
        let (_, b) = simulate(&args()).unwrap();
        assert_eq!(a.model(), "ARIMA(1,1,1)");
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn missing_config_is_reported() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = simulate(&SimulateArgs {
            config: dir.path().join("absent.toml"),
            output: None,
            seed: None,
        })
        .unwrap_err();
        assert!(format!("{err:#}").contains("failed to read config file"));
    }
}
