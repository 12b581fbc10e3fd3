//! Simulate-then-fit integration tests for smooth-forecast.

use approx::assert_abs_diff_eq;
use ndarray::array;
use rand::SeedableRng;
use smooth_forecast::{ForecastError, GesSpec, IntervalKind};
use smooth_sim::{GesConfig, simulate_ges};
use smooth_ssm::ErrorType;

fn simulated_local_level(seed: u64) -> Vec<f64> {
    let sim = simulate_ges(
        &GesConfig::new(vec![1], vec![1])
            .with_transition(array![[1.0]])
            .with_measurement(array![1.0])
            .with_persistence(array![0.3])
            .with_initial(array![[100.0]])
            .with_observations(200.0)
            .with_seed(seed),
    )
    .unwrap();
    sim.data().iter().copied().collect()
}

#[test]
fn fit_recovers_simulation_noise() {
    let data = simulated_local_level(11);
    let fit = GesSpec::new(vec![1], vec![1]).fit(&data).unwrap();
    // Errors were drawn with variance |mean(initial)| = 100.
    assert!(
        fit.sigma2() > 60.0 && fit.sigma2() < 150.0,
        "sigma2 = {}",
        fit.sigma2()
    );
    assert_eq!(fit.fitted().len(), 200);
    assert!(fit.aic() < fit.aicc());
}

#[test]
fn parametric_interval_widens_for_random_walk() {
    let data = simulated_local_level(5);
    let fit = GesSpec::new(vec![1], vec![1]).fit(&data).unwrap();
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    let fc = fit
        .forecast(10, IntervalKind::Parametric, 0.95, &mut rng)
        .unwrap();
    let (lo, hi) = (fc.lower().unwrap(), fc.upper().unwrap());
    let widths: Vec<f64> = (0..10).map(|i| hi[i] - lo[i]).collect();
    assert!(widths.windows(2).all(|w| w[1] >= w[0] - 1e-9));
    assert!(
        (0..10).all(|i| lo[i] <= fc.point()[i] && fc.point()[i] <= hi[i])
    );
}

#[test]
fn simulated_and_bootstrap_intervals_bracket_point() {
    let data = simulated_local_level(21);
    let fit = GesSpec::new(vec![1], vec![1]).fit(&data).unwrap();
    for kind in [IntervalKind::Simulated, IntervalKind::Bootstrap] {
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let fc = fit.forecast(5, kind, 0.8, &mut rng).unwrap();
        assert_eq!(fc.kind(), kind);
        assert_eq!(fc.level(), Some(0.8));
        let (lo, hi) = (fc.lower().unwrap(), fc.upper().unwrap());
        for i in 0..5 {
            assert!(lo[i] < hi[i]);
        }
    }
}

#[test]
fn point_only_forecast_has_no_bounds() {
    let data = simulated_local_level(2);
    let fit = GesSpec::new(vec![1], vec![1]).fit(&data).unwrap();
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    let fc = fit.forecast(3, IntervalKind::None, 2.0, &mut rng).unwrap();
    assert!(fc.lower().is_none());
    assert_eq!(fc.level(), None);
}

#[test]
fn invalid_level_is_rejected() {
    let data = simulated_local_level(2);
    let fit = GesSpec::new(vec![1], vec![1]).fit(&data).unwrap();
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    let err = fit
        .forecast(3, IntervalKind::Simulated, 1.0, &mut rng)
        .unwrap_err();
    assert!(matches!(err, ForecastError::InvalidLevel { .. }));
}

#[test]
fn multiplicative_fit_refuses_parametric_interval() {
    let data: Vec<f64> = (0..60).map(|t| 20.0 + (t % 4) as f64).collect();
    let fit = GesSpec::new(vec![1], vec![1])
        .with_error_type(ErrorType::Multiplicative)
        .fit(&data)
        .unwrap();
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    let err = fit
        .forecast(4, IntervalKind::Parametric, 0.95, &mut rng)
        .unwrap_err();
    assert!(matches!(
        err,
        ForecastError::UnsupportedInterval {
            interval: "parametric"
        }
    ));
    let fc = fit
        .forecast(4, IntervalKind::Bootstrap, 0.95, &mut rng)
        .unwrap();
    assert!(fc.point().iter().all(|&y| y > 0.0));
}

#[test]
fn point_forecast_follows_last_state() {
    let data = simulated_local_level(8);
    let fit = GesSpec::new(vec![1], vec![1]).fit(&data).unwrap();
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    let fc = fit.forecast(1, IntervalKind::None, 0.95, &mut rng).unwrap();
    let m = fit.matrices();
    let expected = m.measurement()[0] * fit.final_states()[[0, 0]];
    assert_abs_diff_eq!(fc.point()[0], expected, epsilon = 1e-9);
}
