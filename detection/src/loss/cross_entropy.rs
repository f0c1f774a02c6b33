use super::Reduction;
use crate::{common::*, matcher::log_softmax};

/// Cross entropy on logits with sparse class targets and optional per-class weights.
#[derive(Debug, Clone)]
pub struct CrossEntropyLoss {
    weight: Option<Vec<f64>>,
    reduction: Reduction,
}

impl CrossEntropyLoss {
    pub fn new(weight: Option<Vec<f64>>, reduction: Reduction) -> Result<Self> {
        if let Some(weight) = &weight {
            ensure!(
                weight.iter().all(|&value| value.is_finite() && value >= 0.0),
                "class weights must be non-negative"
            );
        }
        Ok(Self { weight, reduction })
    }

    /// Compute the loss of `[batch, num_classes]` logits against class ids.
    ///
    /// With mean reduction the weighted sum is divided by the sum of target
    /// weights. An empty batch or a zero total weight gives zero.
    pub fn forward(&self, input: ArrayView2<'_, f64>, target: &[usize]) -> Result<f64> {
        let (batch_size, num_classes) = input.dim();
        ensure!(
            batch_size == target.len(),
            "expect {} targets, but get {}",
            batch_size,
            target.len()
        );
        if let Some(&class) = target.iter().find(|&&class| class >= num_classes) {
            bail!("target class {} must be less than {}", class, num_classes);
        }
        if let Some(weight) = &self.weight {
            ensure!(
                weight.len() == num_classes,
                "expect {} class weights, but get {}",
                num_classes,
                weight.len()
            );
        }

        let (loss_sum, weight_sum) = input
            .rows()
            .into_iter()
            .zip(target)
            .map(|(logits, &class)| {
                let weight = self.weight.as_ref().map_or(1.0, |weight| weight[class]);
                let nll = -log_softmax(logits)[class];
                (weight * nll, weight)
            })
            .fold((0.0, 0.0), |(loss_sum, weight_sum), (loss, weight)| {
                (loss_sum + loss, weight_sum + weight)
            });

        let loss = match self.reduction {
            Reduction::Sum => loss_sum,
            Reduction::Mean => {
                if weight_sum > 0.0 {
                    loss_sum / weight_sum
                } else {
                    0.0
                }
            }
        };
        Ok(loss)
    }
}
