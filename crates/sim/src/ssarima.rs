//! SSARIMA: seasonal ARIMA in single-source-of-error state-space form.
//!
//! The lag polynomials are multiplied out,
//!
//! ```text
//! AR(B) = prod_l (1 - phi_l(B^l)) (1 - B^l)^d_l  = 1 - a_1 B - ... - a_r B^r
//! MA(B) = prod_l (1 + theta_l(B^l))              = 1 + m_1 B + ... + m_r B^r
//! ```
//!
//! and the model is written with `F` = companion of `a`, `w = (1, 0, ...)`
//! and `g_i = a_i + m_i`. Every component has lag 1.

use ndarray::{Array1, Array2};
use rand::Rng;
use smooth_ssm::{
    LagStructure, SearchReport, SsmError, StabilitySearch, StructuralMatrices, search_stable,
    stability,
};
use tracing::{info, warn};

use crate::config::SsarimaConfig;
use crate::error::SimError;
use crate::paths;
use crate::result::Simulation;
use crate::warning::SimulationWarning;

/// Normalised per-lag AR, I and MA orders.
///
/// Lags are unique and positive; lags whose three orders are all zero are
/// dropped. An empty structure is white noise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArimaOrders {
    lags: Vec<usize>,
    ar: Vec<usize>,
    i: Vec<usize>,
    ma: Vec<usize>,
}

impl ArimaOrders {
    /// Normalises the orders.
    ///
    /// Steps: drop lag-zero entries, drop entries whose orders are all zero,
    /// merge duplicate lags keeping the first-seen position and the largest
    /// of each order.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`SsmError::DimensionMismatch`] | an order vector's length differs from `lags` |
    /// | [`SsmError::NegativeOrder`] | any order `< 0` |
    /// | [`SsmError::NegativeLag`] | any lag `< 0` |
    pub fn new(ar: &[i64], i: &[i64], ma: &[i64], lags: &[i64]) -> Result<Self, SsmError> {
        for orders in [ar, i, ma] {
            if orders.len() != lags.len() {
                return Err(SsmError::DimensionMismatch {
                    orders: orders.len(),
                    lags: lags.len(),
                });
            }
            if let Some((index, &value)) = orders.iter().enumerate().find(|(_, o)| **o < 0) {
                return Err(SsmError::NegativeOrder { index, value });
            }
        }
        if let Some((index, &value)) = lags.iter().enumerate().find(|(_, l)| **l < 0) {
            return Err(SsmError::NegativeLag { index, value });
        }

        let mut merged: Vec<(usize, [usize; 3])> = Vec::new();
        for (k, &lag) in lags.iter().enumerate() {
            let orders = [ar[k] as usize, i[k] as usize, ma[k] as usize];
            if lag == 0 || orders == [0, 0, 0] {
                continue;
            }
            let lag = lag as usize;
            match merged.iter_mut().find(|(l, _)| *l == lag) {
                Some((_, existing)) => {
                    for (e, o) in existing.iter_mut().zip(orders) {
                        *e = (*e).max(o);
                    }
                }
                None => merged.push((lag, orders)),
            }
        }

        Ok(Self {
            lags: merged.iter().map(|&(l, _)| l).collect(),
            ar: merged.iter().map(|&(_, o)| o[0]).collect(),
            i: merged.iter().map(|&(_, o)| o[1]).collect(),
            ma: merged.iter().map(|&(_, o)| o[2]).collect(),
        })
    }

    /// Unique lags.
    pub fn lags(&self) -> &[usize] {
        &self.lags
    }

    /// AR order per lag.
    pub fn ar(&self) -> &[usize] {
        &self.ar
    }

    /// Differencing order per lag.
    pub fn i(&self) -> &[usize] {
        &self.i
    }

    /// MA order per lag.
    pub fn ma(&self) -> &[usize] {
        &self.ma
    }

    /// Total number of AR coefficients.
    pub fn n_ar(&self) -> usize {
        self.ar.iter().sum()
    }

    /// Total number of MA coefficients.
    pub fn n_ma(&self) -> usize {
        self.ma.iter().sum()
    }

    /// Display name: `ARIMA(p,d,q)` for a single lag-1 entry, otherwise
    /// `SARIMA(p,d,q)[l](P,D,Q)[L]...`; prefixed with `i` when intermittent.
    pub fn name(&self, intermittent: bool) -> String {
        let prefix = if intermittent { "i" } else { "" };
        match self.lags.as_slice() {
            [] => format!("{prefix}ARIMA(0,0,0)"),
            [1] => format!("{prefix}ARIMA({},{},{})", self.ar[0], self.i[0], self.ma[0]),
            _ => {
                let body: String = (0..self.lags.len())
                    .map(|k| {
                        format!(
                            "({},{},{})[{}]",
                            self.ar[k], self.i[k], self.ma[k], self.lags[k]
                        )
                    })
                    .collect();
                format!("{prefix}SARIMA{body}")
            }
        }
    }
}

fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `1 + sign * (c_1 B^lag + c_2 B^(2 lag) + ...)`.
fn lag_poly(coefficients: &[f64], lag: usize, sign: f64) -> Vec<f64> {
    let mut p = vec![0.0; coefficients.len() * lag + 1];
    p[0] = 1.0;
    for (k, &c) in coefficients.iter().enumerate() {
        p[(k + 1) * lag] = sign * c;
    }
    p
}

/// `(1 - B^lag)^d`.
fn difference_poly(lag: usize, d: usize) -> Vec<f64> {
    let step = lag_poly(&[1.0], lag, -1.0);
    (0..d).fold(vec![1.0], |acc, _| poly_mul(&acc, &step))
}

/// Multiplied-out lag polynomials of an SSARIMA model, coefficient 0 first.
#[derive(Clone, Debug, PartialEq)]
pub struct ArimaPolynomials {
    ar_stationary: Vec<f64>,
    ar: Vec<f64>,
    ma: Vec<f64>,
}

impl ArimaPolynomials {
    /// Builds the polynomials; `ar_coefficients` and `ma_coefficients` are
    /// laid out lag by lag with `orders.ar()[k]` / `orders.ma()[k]` entries.
    ///
    /// # Errors
    ///
    /// Returns [`SsmError::ShapeMismatch`] when a coefficient vector's length
    /// differs from the total order.
    pub fn new(
        orders: &ArimaOrders,
        ar_coefficients: &[f64],
        ma_coefficients: &[f64],
    ) -> Result<Self, SsmError> {
        for (name, coefficients, expected) in [
            ("ar_coefficients", ar_coefficients, orders.n_ar()),
            ("ma_coefficients", ma_coefficients, orders.n_ma()),
        ] {
            if coefficients.len() != expected {
                return Err(SsmError::ShapeMismatch {
                    name,
                    expected: vec![expected],
                    got: vec![coefficients.len()],
                });
            }
        }
        let mut ar_stationary = vec![1.0];
        let mut integrated = vec![1.0];
        let mut ma = vec![1.0];
        let (mut ar_pos, mut ma_pos) = (0, 0);
        for (k, &lag) in orders.lags().iter().enumerate() {
            let phi = &ar_coefficients[ar_pos..ar_pos + orders.ar()[k]];
            let theta = &ma_coefficients[ma_pos..ma_pos + orders.ma()[k]];
            ar_pos += phi.len();
            ma_pos += theta.len();
            ar_stationary = poly_mul(&ar_stationary, &lag_poly(phi, lag, -1.0));
            integrated = poly_mul(&integrated, &difference_poly(lag, orders.i()[k]));
            ma = poly_mul(&ma, &lag_poly(theta, lag, 1.0));
        }
        let ar = poly_mul(&ar_stationary, &integrated);
        Ok(Self {
            ar_stationary,
            ar,
            ma,
        })
    }

    /// Stationary part of the AR polynomial.
    pub fn ar_stationary(&self) -> &[f64] {
        &self.ar_stationary
    }

    /// Full AR polynomial including differences.
    pub fn ar(&self) -> &[f64] {
        &self.ar
    }

    /// MA polynomial.
    pub fn ma(&self) -> &[f64] {
        &self.ma
    }

    /// `true` when the stationary AR part has every inverse root in the
    /// closed unit disc.
    pub fn is_stationary(&self) -> bool {
        let a: Vec<f64> = self.ar_stationary[1..].iter().map(|x| -x).collect();
        stability::within_unit_circle(&stability::companion(&a))
    }

    /// State dimension `max(deg AR, deg MA)`, at least 1.
    pub fn n_components(&self) -> usize {
        (self.ar.len() - 1).max(self.ma.len() - 1).max(1)
    }

    /// Builds the state-space matrices.
    ///
    /// # Errors
    ///
    /// Propagates [`StructuralMatrices::new`] errors.
    pub fn to_matrices(&self) -> Result<StructuralMatrices, SsmError> {
        let r = self.n_components();
        let coef = |p: &[f64], i: usize| p.get(i).copied().unwrap_or(0.0);
        let a: Vec<f64> = (1..=r).map(|i| -coef(&self.ar, i)).collect();
        let m: Vec<f64> = (1..=r).map(|i| coef(&self.ma, i)).collect();

        let transition: Array2<f64> = stability::companion(&a);
        let mut measurement = Array1::zeros(r);
        measurement[0] = 1.0;
        let persistence = Array1::from_iter(a.iter().zip(&m).map(|(x, y)| x + y));
        StructuralMatrices::new(transition, measurement, persistence)
    }
}

fn uniform_coefficients<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<f64> {
    (0..n).map(|_| rng.random_range(-1.0..=1.0)).collect()
}

fn scaled(c: &[f64], factor: f64) -> Vec<f64> {
    c.iter().map(|x| x * factor).collect()
}

/// Draws coefficients for one path and builds its matrices.
///
/// AR coefficients are drawn until the stationary AR part is stable; MA
/// coefficients until `F - g w'` is stable.
fn draw_arima_matrices<R: Rng + ?Sized>(
    orders: &ArimaOrders,
    ar_supplied: Option<&[f64]>,
    ma_supplied: Option<&[f64]>,
    search: &StabilitySearch,
    rng: &mut R,
) -> Result<StructuralMatrices, SsmError> {
    let ar = match ar_supplied {
        Some(c) => c.to_vec(),
        None if orders.n_ar() == 0 => Vec::new(),
        None => {
            let (c, _): (Vec<f64>, SearchReport) = search_stable(
                search,
                rng,
                |rng| uniform_coefficients(orders.n_ar(), rng),
                |c| {
                    ArimaPolynomials::new(orders, c, &vec![0.0; orders.n_ma()])
                        .is_ok_and(|p| p.is_stationary())
                },
                |c, f| scaled(c, f),
            )?;
            c
        }
    };

    let ma = match ma_supplied {
        Some(c) => c.to_vec(),
        None if orders.n_ma() == 0 => Vec::new(),
        None => {
            let invertible = |c: &Vec<f64>| {
                ArimaPolynomials::new(orders, &ar, c)
                    .and_then(|p| p.to_matrices())
                    .is_ok_and(|m| stability::within_unit_circle(&m.closed_loop()))
            };
            let (c, _) = search_stable(
                search,
                rng,
                |rng| uniform_coefficients(orders.n_ma(), rng),
                invertible,
                |c, f| scaled(c, f),
            )?;
            c
        }
    };

    ArimaPolynomials::new(orders, &ar, &ma)?.to_matrices()
}

fn validated_coefficients(
    supplied: Option<&[f64]>,
    expected: usize,
    kind: &'static str,
    warnings: &mut Vec<SimulationWarning>,
) -> Option<Vec<f64>> {
    let c = supplied?;
    if c.len() == expected {
        return Some(c.to_vec());
    }
    warn!(kind, expected, got = c.len(), "discarding wrong-length coefficients");
    warnings.push(SimulationWarning::CoefficientsDiscarded {
        kind,
        expected,
        got: c.len(),
    });
    None
}

/// Simulates an SSARIMA model.
///
/// Errors, occurrence, recursion and packaging are shared with
/// [`simulate_ges`](crate::simulate_ges).
///
/// # Errors
///
/// As [`simulate_ges`](crate::simulate_ges); `DimensionMismatch` refers to
/// the first order vector whose length differs from `lags`.
///
/// # Example
///
/// ```
/// use smooth_sim::{SsarimaConfig, simulate_ssarima};
///
/// let config = SsarimaConfig::new(vec![0], vec![1], vec![0], vec![1])
///     .with_observations(20.0)
///     .with_seed(1);
/// let sim = simulate_ssarima(&config).unwrap();
/// assert_eq!(sim.model(), "ARIMA(0,1,0)");
/// ```
#[tracing::instrument(skip_all, fields(lags = ?config.lags()))]
pub fn simulate_ssarima(config: &SsarimaConfig) -> Result<Simulation, SimError> {
    let orders = ArimaOrders::new(
        config.ar_orders(),
        config.i_orders(),
        config.ma_orders(),
        config.lags(),
    )?;
    let settings = config.settings();
    let mut warnings = Vec::new();
    let ar = validated_coefficients(config.ar_coefficients(), orders.n_ar(), "ar", &mut warnings);
    let ma = validated_coefficients(config.ma_coefficients(), orders.n_ma(), "ma", &mut warnings);

    // State dimension does not depend on coefficient values.
    let r = ArimaPolynomials::new(
        &orders,
        &vec![0.0; orders.n_ar()],
        &vec![0.0; orders.n_ma()],
    )?
    .n_components();
    let structure = LagStructure::unit_lags(r)?;

    let search = *settings.stability_search();
    let run = paths::run(settings, structure.model_lags(), warnings, |rng| {
        draw_arima_matrices(&orders, ar.as_deref(), ma.as_deref(), &search, rng)
    })?;

    let model = orders.name(run.intermittent);
    info!(model = %model, paths = run.outputs.len(), "SSARIMA simulation finished");
    Ok(Simulation::from_run(
        model,
        settings.error_type(),
        structure.model_lags().to_vec(),
        settings.frequency(),
        run,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn orders_normalisation() {
        let o = ArimaOrders::new(&[1, 0, 2], &[0, 0, 1], &[1, 0, 0], &[1, 4, 1]).unwrap();
        assert_eq!(o.lags(), &[1]);
        assert_eq!(o.ar(), &[2]);
        assert_eq!(o.i(), &[1]);
        assert_eq!(o.ma(), &[1]);
        assert_eq!(o.n_ar(), 2);
    }

    #[test]
    fn orders_errors() {
        assert!(matches!(
            ArimaOrders::new(&[1], &[0, 0], &[0], &[1]),
            Err(SsmError::DimensionMismatch { orders: 2, lags: 1 })
        ));
        assert!(matches!(
            ArimaOrders::new(&[1], &[-1], &[0], &[1]),
            Err(SsmError::NegativeOrder { index: 0, value: -1 })
        ));
        assert!(matches!(
            ArimaOrders::new(&[1], &[0], &[0], &[-1]),
            Err(SsmError::NegativeLag { .. })
        ));
    }

    #[test]
    fn names() {
        let o = ArimaOrders::new(&[1], &[1], &[1], &[1]).unwrap();
        assert_eq!(o.name(false), "ARIMA(1,1,1)");
        let o = ArimaOrders::new(&[1, 0], &[0, 1], &[1, 1], &[1, 12]).unwrap();
        assert_eq!(o.name(true), "iSARIMA(1,0,1)[1](0,1,1)[12]");
        let o = ArimaOrders::new(&[0], &[0], &[0], &[1]).unwrap();
        assert_eq!(o.name(false), "ARIMA(0,0,0)");
    }

    #[test]
    fn random_walk_matrices() {
        let o = ArimaOrders::new(&[0], &[1], &[0], &[1]).unwrap();
        let m = ArimaPolynomials::new(&o, &[], &[]).unwrap().to_matrices().unwrap();
        assert_eq!(m.transition(), &ndarray::array![[1.0]]);
        assert_eq!(m.measurement(), &ndarray::array![1.0]);
        assert_eq!(m.persistence(), &ndarray::array![1.0]);
    }

    #[test]
    fn white_noise_matrices() {
        let o = ArimaOrders::new(&[], &[], &[], &[]).unwrap();
        let p = ArimaPolynomials::new(&o, &[], &[]).unwrap();
        assert_eq!(p.n_components(), 1);
        let m = p.to_matrices().unwrap();
        assert_eq!(m.transition(), &ndarray::array![[0.0]]);
        assert_eq!(m.persistence(), &ndarray::array![0.0]);
    }

    #[test]
    fn seasonal_difference_polynomial() {
        // (1 - B)(1 - B^4) = 1 - B - B^4 + B^5
        let o = ArimaOrders::new(&[0, 0], &[1, 1], &[0, 0], &[1, 4]).unwrap();
        let p = ArimaPolynomials::new(&o, &[], &[]).unwrap();
        assert_eq!(p.ar(), &[1.0, -1.0, 0.0, 0.0, -1.0, 1.0]);
        assert_eq!(p.n_components(), 5);
    }

    #[test]
    fn coefficient_length_checked() {
        let o = ArimaOrders::new(&[2], &[0], &[1], &[1]).unwrap();
        assert!(matches!(
            ArimaPolynomials::new(&o, &[0.1], &[0.2]),
            Err(SsmError::ShapeMismatch {
                name: "ar_coefficients",
                ..
            })
        ));
    }

    #[test]
    fn arma11_matrices() {
        let o = ArimaOrders::new(&[1], &[0], &[1], &[1]).unwrap();
        let m = ArimaPolynomials::new(&o, &[0.6], &[0.3]).unwrap().to_matrices().unwrap();
        assert_abs_diff_eq!(m.transition()[[0, 0]], 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(m.persistence()[0], 0.9, epsilon = 1e-12);
    }

    #[test]
    fn multiplicative_seasonal_ar() {
        // (1 - 0.5B)(1 - 0.4B^2) = 1 - 0.5B - 0.4B^2 + 0.2B^3
        let o = ArimaOrders::new(&[1, 1], &[0, 0], &[0, 0], &[1, 2]).unwrap();
        let p = ArimaPolynomials::new(&o, &[0.5, 0.4], &[]).unwrap();
        let expected = [1.0, -0.5, -0.4, 0.2];
        for (x, y) in p.ar().iter().zip(expected) {
            assert_abs_diff_eq!(*x, y, epsilon = 1e-12);
        }
        assert!(p.is_stationary());
    }

    #[test]
    fn drawn_coefficients_are_stationary_and_invertible() {
        let o = ArimaOrders::new(&[2, 1], &[1, 0], &[2, 1], &[1, 4]).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..5 {
            let m =
                draw_arima_matrices(&o, None, None, &StabilitySearch::new(), &mut rng).unwrap();
            assert!(stability::within_unit_circle(&m.closed_loop()));
        }
    }

    #[test]
    fn wrong_length_coefficients_warn() {
        let mut warnings = Vec::new();
        let c = validated_coefficients(Some(&[0.1, 0.2]), 1, "ar", &mut warnings);
        assert!(c.is_none());
        assert_eq!(
            warnings,
            vec![SimulationWarning::CoefficientsDiscarded {
                kind: "ar",
                expected: 1,
                got: 2
            }]
        );
    }
}
