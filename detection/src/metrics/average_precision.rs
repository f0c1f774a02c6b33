use crate::common::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecRec<T>
where
    T: Copy,
{
    pub precision: T,
    pub recall: T,
}

/// The way to integrate the area under a precision/recall curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegralMethod {
    /// The exact area under the enveloped step curve.
    Continuous,
    /// The mean of enveloped precision sampled at evenly spaced recall points,
    /// e.g. 101 points in COCO.
    Interpolation(usize),
}

impl Default for IntegralMethod {
    fn default() -> Self {
        Self::Continuous
    }
}

#[derive(Debug, Clone)]
pub struct ApCalculator {
    integral_method: IntegralMethod,
}

impl ApCalculator {
    pub fn new_coco() -> Self {
        Self {
            integral_method: IntegralMethod::Interpolation(101),
        }
    }

    pub fn new(integral_method: IntegralMethod) -> Result<Self> {
        if let IntegralMethod::Interpolation(n_points) = integral_method {
            ensure!(
                n_points >= 2,
                "invalid number of interpolated points {}",
                n_points
            );
        }

        Ok(Self { integral_method })
    }

    pub fn integral_method(&self) -> IntegralMethod {
        self.integral_method
    }

    /// Compute average precision from a precision/recall curve.
    ///
    /// The input must be ordered by non-decreasing recall. An empty curve has
    /// zero precision.
    pub fn compute_by_prec_rec(&self, sorted_prec_rec: &[impl Borrow<PrecRec<R64>>]) -> R64 {
        if sorted_prec_rec.is_empty() {
            return r64(0.0);
        }

        // precision at recall r becomes the max precision at recall >= r
        let enveloped: Vec<PrecRec<R64>> = {
            let mut list: Vec<_> = sorted_prec_rec
                .iter()
                .rev()
                .scan(r64(0.0), |max_precision, prec_rec| {
                    let PrecRec { precision, recall } = *prec_rec.borrow();
                    *max_precision = (*max_precision).max(precision);
                    Some(PrecRec {
                        precision: *max_precision,
                        recall,
                    })
                })
                .collect();
            list.reverse();
            list
        };

        match self.integral_method {
            IntegralMethod::Continuous => enveloped
                .iter()
                .scan(r64(0.0), |prev_recall, prec_rec| {
                    let width = prec_rec.recall - *prev_recall;
                    *prev_recall = prec_rec.recall;
                    Some(width * prec_rec.precision)
                })
                .sum(),
            IntegralMethod::Interpolation(n_points) => {
                let sum: R64 = (0..n_points)
                    .map(|index| r64(index as f64 / (n_points - 1) as f64))
                    .map(|recall| {
                        // the envelope is non-increasing, so the first point
                        // reaching the recall carries the max precision
                        enveloped
                            .iter()
                            .find(|prec_rec| prec_rec.recall >= recall)
                            .map(|prec_rec| prec_rec.precision)
                            .unwrap_or_else(|| r64(0.0))
                    })
                    .sum();
                sum / r64(n_points as f64)
            }
        }
    }

    /// Compute average precision from `(confidence, is_true_positive)` outcomes.
    ///
    /// Outcomes are ranked by descending confidence. Equal confidences keep
    /// their input order.
    pub fn compute_by_outcomes(&self, outcomes: &[(R64, bool)], num_ground_truth: usize) -> R64 {
        if num_ground_truth == 0 {
            return r64(0.0);
        }

        let mut ranked: Vec<_> = outcomes.to_vec();
        ranked.sort_by(|(lhs, _), (rhs, _)| rhs.cmp(lhs));

        let num_ground_truth = r64(num_ground_truth as f64);
        let prec_rec: Vec<_> = ranked
            .into_iter()
            .scan((0usize, 0usize), |(acc_tp, acc_fp), (_, is_tp)| {
                if is_tp {
                    *acc_tp += 1;
                } else {
                    *acc_fp += 1;
                }
                let tp = r64(*acc_tp as f64);
                let fp = r64(*acc_fp as f64);
                Some(PrecRec {
                    precision: tp / (tp + fp),
                    recall: tp / num_ground_truth,
                })
            })
            .collect();

        self.compute_by_prec_rec(&prec_rec)
    }
}

impl Default for ApCalculator {
    fn default() -> Self {
        Self {
            integral_method: IntegralMethod::default(),
        }
    }
}
