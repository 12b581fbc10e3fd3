//! Spectral stability checks.
//!
//! Eigenvalues of the (generally non-symmetric) state matrices are obtained
//! from `nalgebra`'s real Schur decomposition; stability means every
//! eigenvalue lies in the closed unit disc.

use nalgebra::DMatrix;
use ndarray::Array2;

/// Slack added to the unit bound to absorb round-off in the eigen solver.
pub const STABILITY_TOLERANCE: f64 = 1e-7;

/// Copies an `ndarray` matrix into a `nalgebra::DMatrix`.
fn to_dmatrix(m: &Array2<f64>) -> DMatrix<f64> {
    let (rows, cols) = m.dim();
    DMatrix::from_fn(rows, cols, |i, j| m[[i, j]])
}

/// Returns the largest eigenvalue modulus of a square matrix.
///
/// An empty matrix has spectral radius 0. Non-finite entries yield `NaN`.
pub fn spectral_radius(m: &Array2<f64>) -> f64 {
    if m.is_empty() {
        return 0.0;
    }
    if m.iter().any(|x| !x.is_finite()) {
        return f64::NAN;
    }
    to_dmatrix(m)
        .complex_eigenvalues()
        .iter()
        .map(|z| z.norm())
        .fold(0.0, f64::max)
}

/// Returns `true` when every eigenvalue of `m` has modulus `<= 1`
/// (up to [`STABILITY_TOLERANCE`]).
pub fn within_unit_circle(m: &Array2<f64>) -> bool {
    let radius = spectral_radius(m);
    radius.is_finite() && radius <= 1.0 + STABILITY_TOLERANCE
}

/// Builds the companion matrix of `1 - a_1 B - ... - a_p B^p`.
///
/// The first column holds `a`, the super-diagonal holds ones. Its eigenvalues
/// are the inverse roots of the polynomial, so the polynomial is stationary
/// exactly when the companion matrix lies within the unit circle.
pub fn companion(a: &[f64]) -> Array2<f64> {
    let p = a.len();
    let mut m = Array2::zeros((p, p));
    for (i, &ai) in a.iter().enumerate() {
        m[[i, 0]] = ai;
    }
    for i in 0..p.saturating_sub(1) {
        m[[i, i + 1]] = 1.0;
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn diagonal_radius() {
        let m = array![[0.5, 0.0], [0.0, -0.9]];
        assert_abs_diff_eq!(spectral_radius(&m), 0.9, epsilon = 1e-10);
        assert!(within_unit_circle(&m));
    }

    #[test]
    fn rotation_has_complex_pair() {
        // Eigenvalues 0.8 * exp(+-i theta)
        let (c, s) = (0.8 * 0.3_f64.cos(), 0.8 * 0.3_f64.sin());
        let m = array![[c, -s], [s, c]];
        assert_abs_diff_eq!(spectral_radius(&m), 0.8, epsilon = 1e-10);
    }

    #[test]
    fn unstable_detected() {
        let m = array![[1.5, 0.2], [0.0, 0.1]];
        assert!(!within_unit_circle(&m));
    }

    #[test]
    fn unit_root_is_stable() {
        let m = array![[1.0]];
        assert!(within_unit_circle(&m));
    }

    #[test]
    fn empty_matrix() {
        assert_eq!(spectral_radius(&Array2::zeros((0, 0))), 0.0);
    }

    #[test]
    fn non_finite_is_unstable() {
        let m = array![[f64::NAN]];
        assert!(spectral_radius(&m).is_nan());
        assert!(!within_unit_circle(&m));
    }

    #[test]
    fn companion_layout() {
        let m = companion(&[0.5, -0.3, 0.1]);
        assert_eq!(m.dim(), (3, 3));
        assert_abs_diff_eq!(m[[0, 0]], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(m[[1, 0]], -0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(m[[2, 0]], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(m[[0, 1]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m[[1, 2]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m[[2, 2]], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn companion_ar2_stationarity() {
        // 1 - 0.5B - 0.3B^2 is stationary; 1 - 0.5B - 0.6B^2 is not.
        assert!(within_unit_circle(&companion(&[0.5, 0.3])));
        assert!(!within_unit_circle(&companion(&[0.5, 0.6])));
    }
}
