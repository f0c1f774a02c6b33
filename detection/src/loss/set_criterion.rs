use super::{CrossEntropyLoss, Reduction, SmoothL1Loss};
use crate::{
    common::*,
    matcher::{HungarianMatcher, HungarianMatcherInit, MatchIndex, SetPrediction},
};

#[derive(Debug, Clone)]
pub struct SetCriterionInit {
    /// The number of real classes. The no-object class id is `num_classes`.
    pub num_classes: usize,
    /// The classification weight of the no-object class.
    pub no_object_weight: f64,
    /// Enables the generalized IoU term with the given weight.
    pub giou_loss_weight: Option<f64>,
    pub matcher: HungarianMatcherInit,
}

impl SetCriterionInit {
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            no_object_weight: 1.0,
            giou_loss_weight: None,
            matcher: HungarianMatcherInit::default(),
        }
    }

    pub fn build(self) -> Result<SetCriterion> {
        let Self {
            num_classes,
            no_object_weight,
            giou_loss_weight,
            matcher,
        } = self;

        ensure!(num_classes > 0, "num_classes must be positive");
        ensure!(
            no_object_weight.is_finite() && no_object_weight >= 0.0,
            "no_object_weight must be non-negative"
        );
        if let Some(weight) = giou_loss_weight {
            ensure!(
                weight.is_finite() && weight >= 0.0,
                "giou_loss_weight must be non-negative"
            );
        }

        let class_weights = {
            let mut weights = vec![1.0; num_classes + 1];
            weights[num_classes] = no_object_weight;
            weights
        };

        Ok(SetCriterion {
            num_classes,
            giou_loss_weight,
            matcher: matcher.build()?,
            cross_entropy: CrossEntropyLoss::new(Some(class_weights), Reduction::Mean)?,
            box_loss: SmoothL1Loss::new(1.0, Reduction::Sum)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetCriterionOutput {
    pub classification_loss: f64,
    /// Smooth L1 over matched pairs, divided by the batch ground truth count.
    pub box_loss: f64,
    pub giou_loss: Option<f64>,
    /// Mean absolute error of the predicted object count, for logging only.
    pub cardinality_error: f64,
    pub total_loss: f64,
    pub matchings: Vec<MatchIndex>,
}

/// The set prediction loss on top of Hungarian matching.
#[derive(Debug, Clone)]
pub struct SetCriterion {
    num_classes: usize,
    giou_loss_weight: Option<f64>,
    matcher: HungarianMatcher,
    cross_entropy: CrossEntropyLoss,
    box_loss: SmoothL1Loss,
}

impl SetCriterion {
    pub fn matcher(&self) -> &HungarianMatcher {
        &self.matcher
    }

    pub fn forward(
        &self,
        predictions: &[SetPrediction],
        targets: &[LabeledBoxSet<Yolo<f64>>],
    ) -> Result<SetCriterionOutput> {
        ensure!(!predictions.is_empty(), "the batch must not be empty");
        for prediction in predictions {
            ensure!(!prediction.is_empty(), "every image must have prediction slots");
            ensure!(
                prediction.num_classes() == self.num_classes,
                "expect logits for {} classes plus no-object, but get {} columns",
                self.num_classes,
                prediction.logits().ncols()
            );
        }

        let matchings = self.matcher.match_batch(predictions, targets)?;
        let num_boxes: usize = targets.iter().map(|target| target.len()).sum();

        let classification_loss = self.classification_loss(predictions, targets, &matchings)?;
        let (box_loss, giou_loss) = if num_boxes == 0 {
            (0.0, self.giou_loss_weight.map(|_| 0.0))
        } else {
            let (box_sum, giou_sum) = self.box_sums(predictions, targets, &matchings)?;
            let num_boxes = num_boxes as f64;
            (
                box_sum / num_boxes,
                self.giou_loss_weight.map(|_| giou_sum / num_boxes),
            )
        };
        let cardinality_error = cardinality_error(predictions, targets);

        let total_loss = classification_loss
            + box_loss
            + match (self.giou_loss_weight, giou_loss) {
                (Some(weight), Some(loss)) => weight * loss,
                _ => 0.0,
            };
        debug!(
            "set criterion: class {:.4}, box {:.4}, giou {:?}, cardinality {:.2}",
            classification_loss, box_loss, giou_loss, cardinality_error
        );

        Ok(SetCriterionOutput {
            classification_loss,
            box_loss,
            giou_loss,
            cardinality_error,
            total_loss,
            matchings,
        })
    }

    fn classification_loss(
        &self,
        predictions: &[SetPrediction],
        targets: &[LabeledBoxSet<Yolo<f64>>],
        matchings: &[MatchIndex],
    ) -> Result<f64> {
        let views: Vec<_> = predictions
            .iter()
            .map(|prediction| prediction.logits().view())
            .collect();
        let logits = ndarray::concatenate(Axis(0), &views)?;

        let mut target_classes = Vec::with_capacity(logits.nrows());
        for (prediction, target, matching) in izip!(predictions, targets, matchings) {
            let mut classes = vec![self.num_classes; prediction.len()];
            matching
                .iter()
                .for_each(|(pred_index, gt_index)| classes[pred_index] = target.labels()[gt_index]);
            target_classes.extend(classes);
        }

        self.cross_entropy.forward(logits.view(), &target_classes)
    }

    /// Sum the smooth L1 and `1 - giou` terms over matched pairs.
    fn box_sums(
        &self,
        predictions: &[SetPrediction],
        targets: &[LabeledBoxSet<Yolo<f64>>],
        matchings: &[MatchIndex],
    ) -> Result<(f64, f64)> {
        let unit = ImageSize::unit();
        let mut box_sum = 0.0;
        let mut giou_sum = 0.0;

        for (prediction, target, matching) in izip!(predictions, targets, matchings) {
            for (pred_index, gt_index) in matching.iter() {
                let pred_box = &prediction.boxes()[pred_index];
                let gt_box = &target.boxes()[gt_index];
                box_sum += self
                    .box_loss
                    .forward(&pred_box.cxcywh(), &gt_box.cxcywh())?;
                giou_sum += 1.0 - pred_box.to_pascal(&unit).giou_with(&gt_box.to_pascal(&unit));
            }
        }

        Ok((box_sum, giou_sum))
    }
}

fn cardinality_error(predictions: &[SetPrediction], targets: &[LabeledBoxSet<Yolo<f64>>]) -> f64 {
    let total: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(prediction, target)| {
            let no_object = prediction.no_object_class();
            let num_objects = prediction
                .argmax_classes()
                .into_iter()
                .filter(|&class| class != no_object)
                .count();
            (num_objects as f64 - target.len() as f64).abs()
        })
        .sum();
    total / predictions.len() as f64
}
