//! Lag/order normalisation.
//!
//! Turns the user's `(orders, lags)` pairs into the canonical
//! [`LagStructure`] the rest of the workspace works with:
//!
//! ```text
//! orders = [1, 2, 0], lags = [3, 3, 12]
//!   drop lag == 0      -> unchanged
//!   drop order == 0    -> orders = [1, 2], lags = [3, 3]
//!   merge duplicates   -> orders = [2],    lags = [3]
//!   model_lags         -> [3, 3]
//! ```

use crate::error::SsmError;

/// Canonical description of the state vector's periodicities.
///
/// After construction the lags are unique, every order is positive and
/// `model_lags().len() == n_components()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LagStructure {
    orders: Vec<usize>,
    lags: Vec<usize>,
    model_lags: Vec<usize>,
}

impl LagStructure {
    /// Normalises `(orders, lags)`.
    ///
    /// Steps, in order: drop pairs whose lag is zero, drop pairs whose order
    /// is zero, then merge duplicate lags keeping the first-seen position and
    /// the largest order.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`SsmError::DimensionMismatch`] | `orders.len() != lags.len()` |
    /// | [`SsmError::NegativeOrder`] | any order `< 0` |
    /// | [`SsmError::NegativeLag`] | any lag `< 0` |
    /// | [`SsmError::EmptyModel`] | nothing survives normalisation |
    ///
    /// # Example
    ///
    /// ```
    /// use smooth_ssm::LagStructure;
    ///
    /// let s = LagStructure::new(&[1, 2], &[3, 3]).unwrap();
    /// assert_eq!(s.orders(), &[2]);
    /// assert_eq!(s.lags(), &[3]);
    /// assert_eq!(s.model_lags(), &[3, 3]);
    /// ```
    pub fn new(orders: &[i64], lags: &[i64]) -> Result<Self, SsmError> {
        if orders.len() != lags.len() {
            return Err(SsmError::DimensionMismatch {
                orders: orders.len(),
                lags: lags.len(),
            });
        }
        if let Some((index, &value)) = orders.iter().enumerate().find(|(_, o)| **o < 0) {
            return Err(SsmError::NegativeOrder { index, value });
        }
        if let Some((index, &value)) = lags.iter().enumerate().find(|(_, l)| **l < 0) {
            return Err(SsmError::NegativeLag { index, value });
        }

        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(lags.len());
        for (&order, &lag) in orders.iter().zip(lags.iter()) {
            if lag == 0 || order == 0 {
                continue;
            }
            let (order, lag) = (order as usize, lag as usize);
            match merged.iter_mut().find(|(l, _)| *l == lag) {
                Some(entry) => entry.1 = entry.1.max(order),
                None => merged.push((lag, order)),
            }
        }

        if merged.is_empty() {
            return Err(SsmError::EmptyModel);
        }

        let lags: Vec<usize> = merged.iter().map(|&(l, _)| l).collect();
        let orders: Vec<usize> = merged.iter().map(|&(_, o)| o).collect();
        let model_lags = merged
            .iter()
            .flat_map(|&(lag, order)| std::iter::repeat_n(lag, order))
            .collect();

        Ok(Self {
            orders,
            lags,
            model_lags,
        })
    }

    /// Builds a structure of `n_components` components that all have lag 1.
    ///
    /// Used by ARIMA-type models whose state vector is a single companion
    /// block.
    ///
    /// # Errors
    ///
    /// Returns [`SsmError::EmptyModel`] when `n_components == 0`.
    pub fn unit_lags(n_components: usize) -> Result<Self, SsmError> {
        if n_components == 0 {
            return Err(SsmError::EmptyModel);
        }
        Ok(Self {
            orders: vec![n_components],
            lags: vec![1],
            model_lags: vec![1; n_components],
        })
    }

    /// Returns the surviving orders, one per unique lag.
    pub fn orders(&self) -> &[usize] {
        &self.orders
    }

    /// Returns the unique lags in first-seen order.
    pub fn lags(&self) -> &[usize] {
        &self.lags
    }

    /// Returns the per-component lag vector.
    pub fn model_lags(&self) -> &[usize] {
        &self.model_lags
    }

    /// Returns the largest lag; also the number of initial state rows.
    pub fn max_lag(&self) -> usize {
        self.model_lags.iter().copied().max().unwrap_or(0)
    }

    /// Returns the number of state components (`sum(orders)`).
    pub fn n_components(&self) -> usize {
        self.model_lags.len()
    }
}
