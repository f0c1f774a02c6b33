use super::Reduction;
use crate::common::*;

/// Huber-style loss, quadratic below `beta` and linear above.
#[derive(Debug, Clone)]
pub struct SmoothL1Loss {
    beta: f64,
    reduction: Reduction,
}

impl SmoothL1Loss {
    pub fn new(beta: f64, reduction: Reduction) -> Result<Self> {
        ensure!(
            beta.is_finite() && beta >= 0.0,
            "beta must be non-negative, but get {}",
            beta
        );
        Ok(Self { beta, reduction })
    }

    fn element(&self, diff: f64) -> f64 {
        let diff = diff.abs();
        if diff < self.beta {
            0.5 * diff * diff / self.beta
        } else {
            diff - 0.5 * self.beta
        }
    }

    pub fn forward(&self, input: &[f64], target: &[f64]) -> Result<f64> {
        ensure!(
            input.len() == target.len(),
            "input length {} does not match target length {}",
            input.len(),
            target.len()
        );
        let sum: f64 = input
            .iter()
            .zip(target)
            .map(|(lhs, rhs)| self.element(lhs - rhs))
            .sum();

        let loss = match self.reduction {
            Reduction::Sum => sum,
            Reduction::Mean if input.is_empty() => 0.0,
            Reduction::Mean => sum / input.len() as f64,
        };
        Ok(loss)
    }
}

impl Default for SmoothL1Loss {
    fn default() -> Self {
        Self {
            beta: 1.0,
            reduction: Reduction::Sum,
        }
    }
}
