use super::{linear_sum_assignment, SetPrediction};
use crate::common::*;

/// Weights of the matching cost terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HungarianMatcherInit {
    /// Weight of the negated class probability.
    pub class_weight: f64,
    /// Weight of the L1 distance between normalized `[cx, cy, w, h]`.
    pub box_weight: f64,
    /// Weight of the negated generalized IoU.
    pub giou_weight: f64,
}

impl HungarianMatcherInit {
    pub fn build(self) -> Result<HungarianMatcher> {
        let Self {
            class_weight,
            box_weight,
            giou_weight,
        } = self;
        let weights = [class_weight, box_weight, giou_weight];

        ensure!(
            weights
                .iter()
                .all(|&weight| weight.is_finite() && weight >= 0.0),
            "matcher weights must be non-negative"
        );
        ensure!(
            weights.iter().any(|&weight| weight > 0.0),
            "at least one matcher weight must be positive"
        );

        Ok(HungarianMatcher {
            class_weight,
            box_weight,
            giou_weight,
        })
    }
}

impl Default for HungarianMatcherInit {
    fn default() -> Self {
        Self {
            class_weight: 1.0,
            box_weight: 1.0,
            giou_weight: 1.0,
        }
    }
}

/// The matched `(prediction, ground_truth)` index pairs of one image,
/// sorted by prediction index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchIndex {
    pairs: Vec<(usize, usize)>,
}

impl MatchIndex {
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.pairs.iter().copied()
    }
}

#[derive(Debug, Clone)]
pub struct HungarianMatcher {
    class_weight: f64,
    box_weight: f64,
    giou_weight: f64,
}

impl HungarianMatcher {
    /// The `[num_predictions, num_ground_truth]` matching cost.
    pub fn cost_matrix(
        &self,
        prediction: &SetPrediction,
        target: &LabeledBoxSet<Yolo<f64>>,
    ) -> Result<Array2<f64>> {
        target.ensure_classes_below(prediction.num_classes())?;

        let probs = prediction.probabilities();
        let unit = ImageSize::unit();
        let pred_boxes = prediction.boxes().to_pascal(&unit);
        let target_boxes = target.boxes().to_pascal(&unit);
        let labels = target.labels();

        let cost = Array2::from_shape_fn((prediction.len(), target.len()), |(pi, ti)| {
            let class_cost = -probs[[pi, labels[ti]]];
            let box_cost: f64 = prediction.boxes()[pi]
                .cxcywh()
                .iter()
                .zip(target.boxes()[ti].cxcywh().iter())
                .map(|(lhs, rhs)| (lhs - rhs).abs())
                .sum();
            let giou_cost = -pred_boxes[pi].giou_with(&target_boxes[ti]);

            self.class_weight * class_cost
                + self.box_weight * box_cost
                + self.giou_weight * giou_cost
        });
        Ok(cost)
    }

    /// Find the minimum-cost matching of one image.
    pub fn match_image(
        &self,
        prediction: &SetPrediction,
        target: &LabeledBoxSet<Yolo<f64>>,
    ) -> Result<MatchIndex> {
        let cost = self.cost_matrix(prediction, target)?;
        let pairs = linear_sum_assignment(cost.view())?;
        Ok(MatchIndex { pairs })
    }

    /// Match every image of a batch in parallel. The output follows the input order.
    pub fn match_batch(
        &self,
        predictions: &[SetPrediction],
        targets: &[LabeledBoxSet<Yolo<f64>>],
    ) -> Result<Vec<MatchIndex>> {
        ensure!(
            predictions.len() == targets.len(),
            "batch size mismatch: {} predictions and {} targets",
            predictions.len(),
            targets.len()
        );
        predictions
            .par_iter()
            .zip(targets)
            .map(|(prediction, target)| self.match_image(prediction, target))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn prediction(logits: Array2<f64>, boxes: &[[f64; 4]]) -> SetPrediction {
        let boxes = boxes.iter().map(|&cxcywh| Yolo::from_cxcywh(cxcywh)).collect();
        SetPrediction::try_new(logits, boxes).unwrap()
    }

    fn target(boxes: &[([f64; 4], usize)]) -> LabeledBoxSet<Yolo<f64>> {
        boxes
            .iter()
            .map(|&(cxcywh, class)| Label {
                rect: Yolo::from_cxcywh(cxcywh),
                class,
            })
            .collect()
    }

    #[test]
    fn matches_nearest_boxes() -> Result<()> {
        let matcher = HungarianMatcherInit::default().build()?;
        let prediction = prediction(
            Array2::zeros((3, 3)),
            &[
                [0.8, 0.8, 0.2, 0.2],
                [0.5, 0.5, 0.1, 0.1],
                [0.2, 0.2, 0.2, 0.2],
            ],
        );
        let target = target(&[([0.21, 0.19, 0.2, 0.2], 0), ([0.79, 0.8, 0.2, 0.2], 1)]);

        let matches = matcher.match_image(&prediction, &target)?;
        assert_eq!(matches.pairs(), &[(0, 1), (2, 0)]);
        Ok(())
    }

    #[test]
    fn class_cost_breaks_geometric_ties() -> Result<()> {
        let matcher = HungarianMatcherInit::default().build()?;
        let logits = array![[5.0, 0.0, 0.0], [0.0, 5.0, 0.0]];
        let prediction = prediction(logits, &[[0.5, 0.5, 0.2, 0.2], [0.5, 0.5, 0.2, 0.2]]);
        let target = target(&[([0.5, 0.5, 0.2, 0.2], 1), ([0.5, 0.5, 0.2, 0.2], 0)]);

        let matches = matcher.match_image(&prediction, &target)?;
        assert_eq!(matches.pairs(), &[(0, 1), (1, 0)]);
        Ok(())
    }

    #[test]
    fn empty_sides_produce_no_pairs() -> Result<()> {
        let matcher = HungarianMatcherInit::default().build()?;
        let prediction = prediction(Array2::zeros((2, 2)), &[[0.5, 0.5, 0.1, 0.1]; 2]);
        let matches = matcher.match_image(&prediction, &LabeledBoxSet::empty())?;
        assert!(matches.is_empty());
        Ok(())
    }

    #[test]
    fn invalid_input_is_rejected() -> Result<()> {
        assert!(HungarianMatcherInit {
            class_weight: -1.0,
            ..Default::default()
        }
        .build()
        .is_err());
        assert!(HungarianMatcherInit {
            class_weight: 0.0,
            box_weight: 0.0,
            giou_weight: 0.0,
        }
        .build()
        .is_err());

        let matcher = HungarianMatcherInit::default().build()?;
        let prediction = prediction(Array2::zeros((1, 2)), &[[0.5, 0.5, 0.1, 0.1]]);
        let target = target(&[([0.5, 0.5, 0.1, 0.1], 1)]);
        assert!(matcher.match_image(&prediction, &target).is_err());
        assert!(matcher.match_batch(&[prediction], &[]).is_err());
        Ok(())
    }
}
