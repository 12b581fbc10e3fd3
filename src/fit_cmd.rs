//! Fit command: estimate a GES model from a JSON series and forecast it.

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, info_span};

use smooth_forecast::GesSpec;

use crate::cli::FitArgs;
use crate::convert;
use crate::report::{self, FitReport};

/// Fits the model and builds the report.
pub fn fit(args: &FitArgs) -> Result<FitReport> {
    let json = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read series: {}", args.input.display()))?;
    let data: Vec<f64> =
        serde_json::from_str(&json).context("series must be a JSON array of numbers")?;
    info!(n = data.len(), "series loaded");

    let spec = GesSpec::new(args.orders.clone(), args.lags.clone())
        .with_error_type(convert::parse_error_type(&args.error_type)?);
    let fit = spec.fit(&data).context("GES estimation failed")?;
    info!(sigma2 = fit.sigma2(), aic = fit.aic(), "model fitted");

    let forecast = if args.horizon > 0 {
        let mut rng = match args.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        let fc = fit
            .forecast(
                args.horizon,
                convert::interval_kind(args.interval),
                args.level,
                &mut rng,
            )
            .context("forecast failed")?;
        Some(fc)
    } else {
        None
    };
    Ok(FitReport::new(&fit, forecast.as_ref()))
}

/// Run the fit command.
pub fn run(args: FitArgs) -> Result<()> {
    let _cmd = info_span!("fit").entered();
    let report = fit(&args)?;
    report::write_json(&report, args.output.as_deref())
}
