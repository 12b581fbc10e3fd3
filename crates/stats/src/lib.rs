//! Statistical helper functions for the smooth workspace.

use std::f64::consts::{E, PI};

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    match data.len() {
        0 => 0.0,
        n => data.iter().sum::<f64>() / n as f64,
    }
}

/// Mean of squared values; 0.0 for an empty slice.
pub fn mean_square(data: &[f64]) -> f64 {
    match data.len() {
        0 => 0.0,
        n => data.iter().map(|&x| x * x).sum::<f64>() / n as f64,
    }
}

/// Unbiased sample variance (`n - 1` denominator); 0.0 below two values.
pub fn variance(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let centre = mean(data);
    let ss: f64 = data.iter().map(|&x| (x - centre).powi(2)).sum();
    ss / (data.len() - 1) as f64
}

/// Square root of [`variance`].
pub fn sd(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// Type-7 quantile (linear interpolation between order statistics) of an
/// ascending slice, as used for empirical prediction bounds.
///
/// Returns `NaN` for an empty slice. `p` is clamped to `[0, 1]`.
pub fn quantile_type7(sorted: &[f64], p: f64) -> f64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return f64::NAN;
    };
    let h = last as f64 * p.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(last);
    sorted[lo] + h.fract() * (sorted[hi] - sorted[lo])
}

/// Sorts a copy of `data` (NaN-tolerant) and returns it.
pub fn sorted(data: &[f64]) -> Vec<f64> {
    let mut out = data.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    out
}

/// Gaussian log-likelihood of `residuals` evaluated at the fitted variance
/// `sigma2 = mean(e^2)`:
///
/// ```text
/// ll = -n/2 * (ln(2 * pi * e) + ln(sigma2))
/// ```
///
/// Returns `NaN` for an empty slice and `+inf` when every residual is zero.
pub fn gaussian_log_likelihood(residuals: &[f64]) -> f64 {
    if residuals.is_empty() {
        return f64::NAN;
    }
    let n = residuals.len() as f64;
    -0.5 * n * ((2.0 * PI * E).ln() + mean_square(residuals).ln())
}

/// Akaike Information Criterion: `2k - 2 ll`.
pub fn aic(log_likelihood: f64, k: usize) -> f64 {
    2.0 * k as f64 - 2.0 * log_likelihood
}

/// Corrected AIC: `AIC + 2k(k+1) / (n - k - 1)`.
///
/// Returns `+inf` when `n <= k + 1`.
pub fn aicc(log_likelihood: f64, k: usize, n: usize) -> f64 {
    if n <= k + 1 {
        return f64::INFINITY;
    }
    let kf = k as f64;
    aic(log_likelihood, k) + 2.0 * kf * (kf + 1.0) / (n - k - 1) as f64
}

/// Bayesian Information Criterion: `k ln(n) - 2 ll`.
pub fn bic(log_likelihood: f64, k: usize, n: usize) -> f64 {
    k as f64 * (n as f64).ln() - 2.0 * log_likelihood
}
