use crate::common::*;
use ndarray::{Array1, ArrayView1};

/// The prediction slots of one image.
///
/// Each slot has `num_classes + 1` class logits, the last column being the
/// no-object class, and a normalized box.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct SetPrediction {
    #[get = "pub"]
    logits: Array2<f64>,
    #[get = "pub"]
    boxes: BoxSet<Yolo<f64>>,
}

impl SetPrediction {
    pub fn try_new(logits: Array2<f64>, boxes: BoxSet<Yolo<f64>>) -> Result<Self> {
        let (num_slots, num_columns) = logits.dim();
        ensure!(
            num_slots == boxes.len(),
            "the number of logit rows {} does not match the number of boxes {}",
            num_slots,
            boxes.len()
        );
        ensure!(
            num_columns >= 2,
            "logits must have at least one class and the no-object column"
        );
        ensure!(
            logits.iter().all(|value| value.is_finite()),
            "logits must be finite"
        );
        Ok(Self { logits, boxes })
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// The number of real classes, excluding no-object.
    pub fn num_classes(&self) -> usize {
        self.logits.ncols() - 1
    }

    /// The class id reserved for no-object.
    pub fn no_object_class(&self) -> usize {
        self.num_classes()
    }

    /// Row-wise softmax of the logits.
    pub fn probabilities(&self) -> Array2<f64> {
        let mut probs = self.logits.clone();
        probs.rows_mut().into_iter().for_each(|mut row| {
            let log_probs = log_softmax(row.view());
            row.assign(&log_probs.mapv(f64::exp));
        });
        probs
    }

    /// The most likely class of every slot.
    pub fn argmax_classes(&self) -> Vec<usize> {
        self.logits
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .min_by_key(|&(_, &logit)| -r64(logit))
                    .map(|(class, _)| class)
                    .unwrap_or(0)
            })
            .collect()
    }
}

pub(crate) fn log_softmax(logits: ArrayView1<'_, f64>) -> Array1<f64> {
    let max = logits.fold(f64::NEG_INFINITY, |max, &value| max.max(value));
    let log_sum_exp = logits.mapv(|value| (value - max).exp()).sum().ln() + max;
    logits.mapv(|value| value - log_sum_exp)
}
