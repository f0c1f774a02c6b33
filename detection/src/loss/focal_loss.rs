use crate::{common::*, heatmap::Heatmap};

/// The penalty-reduced pixel-wise focal loss on center heatmaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocalLossInit {
    /// Exponent of `1 - y` damping negatives near a center.
    pub alpha: f64,
    /// Exponent of the prediction error.
    pub beta: f64,
}

impl FocalLossInit {
    pub fn build(self) -> Result<FocalLoss> {
        let Self { alpha, beta } = self;
        ensure!(
            alpha.is_finite() && alpha >= 0.0,
            "alpha must be non-negative, but get {}",
            alpha
        );
        ensure!(
            beta.is_finite() && beta >= 0.0,
            "beta must be non-negative, but get {}",
            beta
        );
        Ok(FocalLoss { alpha, beta })
    }
}

impl Default for FocalLossInit {
    fn default() -> Self {
        Self {
            alpha: 4.0,
            beta: 3.0,
        }
    }
}

/// Partial sums of the focal loss, combinable across images.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FocalLossSums {
    pub positive: f64,
    pub negative: f64,
    pub num_positive: usize,
}

impl FocalLossSums {
    /// The normalized loss. Without positive pixels the negative term is used alone.
    pub fn loss(&self) -> f64 {
        if self.num_positive == 0 {
            -self.negative
        } else {
            -(self.positive + self.negative) / self.num_positive as f64
        }
    }
}

impl std::ops::Add for FocalLossSums {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            positive: self.positive + rhs.positive,
            negative: self.negative + rhs.negative,
            num_positive: self.num_positive + rhs.num_positive,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FocalLoss {
    alpha: f64,
    beta: f64,
}

impl FocalLoss {
    const EPSILON: f64 = 1e-12;

    /// Sum the positive and negative terms over maps of identical shape.
    ///
    /// Pixels with target exactly 1 are positives.
    pub fn accumulate<S1, S2, D>(
        &self,
        input: &ArrayBase<S1, D>,
        target: &ArrayBase<S2, D>,
    ) -> Result<FocalLossSums>
    where
        S1: Data<Elem = f64>,
        S2: Data<Elem = f64>,
        D: Dimension,
    {
        ensure!(
            input.shape() == target.shape(),
            "input shape {:?} does not match target shape {:?}",
            input.shape(),
            target.shape()
        );
        ensure!(
            input
                .iter()
                .chain(target.iter())
                .all(|&value| value.is_finite() && (0.0..=1.0).contains(&value)),
            "focal loss inputs must be in range [0, 1]"
        );

        let sums = input
            .iter()
            .zip(target.iter())
            .fold(FocalLossSums::default(), |mut sums, (&pred, &gt)| {
                if gt == 1.0 {
                    sums.positive += (pred + Self::EPSILON).ln() * (1.0 - pred).powf(self.beta);
                    sums.num_positive += 1;
                } else {
                    sums.negative += (1.0 - pred + Self::EPSILON).ln()
                        * pred.powf(self.beta)
                        * (1.0 - gt).powf(self.alpha);
                }
                sums
            });
        Ok(sums)
    }

    pub fn forward<S1, S2, D>(
        &self,
        input: &ArrayBase<S1, D>,
        target: &ArrayBase<S2, D>,
    ) -> Result<f64>
    where
        S1: Data<Elem = f64>,
        S2: Data<Elem = f64>,
        D: Dimension,
    {
        Ok(self.accumulate(input, target)?.loss())
    }

    /// The loss over a batch, normalized by the positive count of the whole batch.
    pub fn forward_batch(&self, inputs: &[Heatmap], targets: &[Heatmap]) -> Result<f64> {
        ensure!(
            inputs.len() == targets.len(),
            "batch size mismatch: {} inputs and {} targets",
            inputs.len(),
            targets.len()
        );
        let sums = inputs
            .par_iter()
            .zip(targets)
            .map(|(input, target)| self.accumulate(input.array(), target.array()))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .fold(FocalLossSums::default(), |acc, sums| acc + sums);
        Ok(sums.loss())
    }
}
