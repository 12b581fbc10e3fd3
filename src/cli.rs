use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// State-space simulation and forecasting for GES and SSARIMA models.
#[derive(Parser)]
#[command(
    name = "smooth",
    version,
    about = "State-space simulation and forecasting"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Simulate a GES or SSARIMA model described by a TOML file.
    Simulate(SimulateArgs),
    /// Fit a GES model to a series and optionally forecast it.
    Fit(FitArgs),
}

/// Arguments for the `simulate` subcommand.
#[derive(clap::Args)]
pub struct SimulateArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "smooth.toml")]
    pub config: PathBuf,

    /// Override output JSON path from config; stdout when neither is set.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override RNG seed from config.
    #[arg(short, long)]
    pub seed: Option<u64>,
}

/// Prediction interval class on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum IntervalArg {
    /// Point forecasts only.
    #[default]
    None,
    /// Analytic Normal interval.
    Parametric,
    /// Quantiles of simulated paths.
    Simulated,
    /// Quantiles of paths driven by resampled residuals.
    Bootstrap,
}

/// Arguments for the `fit` subcommand.
#[derive(clap::Args)]
pub struct FitArgs {
    /// Path to a JSON array of observations.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Component orders, one per lag.
    #[arg(long, value_delimiter = ',', default_value = "1")]
    pub orders: Vec<i64>,

    /// Lags, one per order.
    #[arg(long, value_delimiter = ',', default_value = "1")]
    pub lags: Vec<i64>,

    /// Error type: additive or multiplicative.
    #[arg(long, default_value = "additive")]
    pub error_type: String,

    /// Number of steps to forecast.
    #[arg(long, default_value_t = 0)]
    pub horizon: usize,

    /// Prediction interval class.
    #[arg(long, value_enum, default_value_t = IntervalArg::None)]
    pub interval: IntervalArg,

    /// Confidence level of the interval.
    #[arg(long, default_value_t = 0.95)]
    pub level: f64,

    /// RNG seed for simulated and bootstrap intervals.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Output JSON path; stdout when not set.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
