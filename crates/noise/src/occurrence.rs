//! Occurrence (intermittency) masks.

use ndarray::Array1;
use rand::Rng;
use tracing::warn;

use crate::error::NoiseError;
use crate::warning::NoiseWarning;

/// Per-step probability that a period is observed.
///
/// Holds either a single constant probability or one probability per
/// observation.
#[derive(Clone, Debug, PartialEq)]
pub struct OccurrenceModel {
    probabilities: Vec<f64>,
}

impl OccurrenceModel {
    /// Every period is observed.
    pub fn always() -> Self {
        Self {
            probabilities: vec![1.0],
        }
    }

    /// Validates `probabilities` against a series of `n_obs` observations.
    ///
    /// A constant vector collapses to its single value. A non-constant vector
    /// of the wrong length is truncated or padded with its last element and a
    /// warning is returned.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`NoiseError::EmptyProbability`] | `probabilities` is empty |
    /// | [`NoiseError::InvalidProbability`] | a value outside `[0, 1]` or NaN |
    pub fn new(
        probabilities: &[f64],
        n_obs: usize,
    ) -> Result<(Self, Option<NoiseWarning>), NoiseError> {
        let Some(&first) = probabilities.first() else {
            return Err(NoiseError::EmptyProbability);
        };
        if let Some((index, &value)) = probabilities
            .iter()
            .enumerate()
            .find(|(_, p)| !(0.0..=1.0).contains(*p))
        {
            return Err(NoiseError::InvalidProbability { index, value });
        }

        if probabilities.iter().all(|&p| p == first) {
            return Ok((
                Self {
                    probabilities: vec![first],
                },
                None,
            ));
        }

        let from = probabilities.len();
        let mut probs = probabilities.to_vec();
        let warning = if from > n_obs {
            probs.truncate(n_obs);
            Some(NoiseWarning::ProbabilityTruncated { from, to: n_obs })
        } else if from < n_obs {
            let last = probabilities[from - 1];
            probs.resize(n_obs, last);
            Some(NoiseWarning::ProbabilityPadded { from, to: n_obs })
        } else {
            None
        };
        if let Some(w) = &warning {
            warn!(from, to = n_obs, "{w}");
        }
        if probs.is_empty() {
            probs.push(first);
        }

        Ok((
            Self {
                probabilities: probs,
            },
            warning,
        ))
    }

    /// Stored probabilities: one value, or one per observation.
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// `true` when any probability differs from 1.
    pub fn is_intermittent(&self) -> bool {
        self.probabilities.iter().any(|&p| p != 1.0)
    }

    /// Mean occurrence probability `iprob`.
    pub fn mean_probability(&self) -> f64 {
        smooth_stats::mean(&self.probabilities)
    }

    fn probability_at(&self, t: usize) -> f64 {
        let last = self.probabilities.len() - 1;
        self.probabilities[t.min(last)]
    }

    /// Draws a binary mask of length `n_obs`.
    ///
    /// All ones without touching the RNG when the model is not intermittent;
    /// otherwise one Bernoulli draw per step.
    pub fn draw_path<R: Rng + ?Sized>(&self, n_obs: usize, rng: &mut R) -> Array1<f64> {
        if !self.is_intermittent() {
            return Array1::ones(n_obs);
        }
        Array1::from_shape_fn(n_obs, |t| {
            if rng.random_bool(self.probability_at(t)) {
                1.0
            } else {
                0.0
            }
        })
    }
}

impl Default for OccurrenceModel {
    fn default() -> Self {
        Self::always()
    }
}
