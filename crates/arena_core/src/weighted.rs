//! Weighted random selection.

use rand::Rng;
use serde::Serialize;

use crate::error::WeightError;

/// `(value, weight)` pairs with validated weights.
///
/// Weights are finite and non-negative with at least one positive entry, so
/// [`WeightedChoice::pick`] always returns something with positive weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightedChoice<T> {
    values: Vec<T>,
    weights: Vec<f64>,
    total: f64,
}

impl<T> WeightedChoice<T> {
    pub fn new(values: Vec<T>, weights: Vec<f64>) -> Result<Self, WeightError> {
        check_weights(values.len(), &weights)?;
        let total = weights.iter().sum();
        Ok(Self { values, weights, total })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Draw one value with probability proportional to its weight.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> &T {
        let mut r = rng.gen::<f64>() * self.total;
        let mut last_positive = 0;
        for (i, w) in self.weights.iter().enumerate() {
            if *w <= 0.0 {
                continue;
            }
            last_positive = i;
            r -= *w;
            if r < 0.0 {
                return &self.values[i];
            }
        }
        // float rounding can leave r at exactly zero
        &self.values[last_positive]
    }
}

impl<T: Clone> WeightedChoice<T> {
    pub fn from_slices(values: &[T], weights: &[f64]) -> Result<Self, WeightError> {
        Self::new(values.to_vec(), weights.to_vec())
    }
}

/// Validates a weight list against its value count.
pub fn check_weights(values: usize, weights: &[f64]) -> Result<(), WeightError> {
    if values == 0 {
        return Err(WeightError::Empty);
    }
    if values != weights.len() {
        return Err(WeightError::LengthMismatch { values, weights: weights.len() });
    }
    if let Some((index, weight)) =
        weights.iter().enumerate().find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(WeightError::InvalidWeight { index, weight: *weight });
    }
    if !weights.iter().any(|w| *w > 0.0) {
        return Err(WeightError::NoPositiveWeight);
    }
    Ok(())
}

/// `true` with probability `p`, clamped to [0, 1].
pub fn bernoulli<R: Rng>(rng: &mut R, p: f64) -> bool {
    let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
    if p >= 1.0 {
        return true;
    }
    rng.gen::<f64>() < p
}
