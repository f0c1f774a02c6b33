use super::{ApCalculator, IntegralMethod};
use crate::common::*;

#[derive(Debug, Clone)]
pub struct MeanApInit {
    pub num_classes: usize,
    pub iou_threshold: f64,
    pub integral_method: IntegralMethod,
}

impl MeanApInit {
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            iou_threshold: 0.5,
            integral_method: IntegralMethod::default(),
        }
    }

    pub fn build(self) -> Result<MeanAveragePrecision> {
        let Self {
            num_classes,
            iou_threshold,
            integral_method,
        } = self;

        ensure!(num_classes > 0, "num_classes must be positive");
        ensure!(
            (0.0..=1.0).contains(&iou_threshold),
            "iou_threshold must be in range [0, 1], but get {}",
            iou_threshold
        );

        Ok(MeanAveragePrecision {
            num_classes,
            iou_threshold,
            ap_calculator: ApCalculator::new(integral_method)?,
            records: vec![ClassRecord::default(); num_classes],
        })
    }
}

/// The detection outcomes of one class.
#[derive(Debug, Clone, Default, PartialEq)]
struct ClassRecord {
    outcomes: Vec<(R64, bool)>,
    num_ground_truth: usize,
}

impl ClassRecord {
    fn extend(&mut self, other: ClassRecord) {
        self.outcomes.extend(other.outcomes);
        self.num_ground_truth += other.num_ground_truth;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeanApOutput {
    /// The mean over classes having ground truth, or zero if there is none.
    pub mean_ap: f64,
    /// AP of every class having at least one ground truth box.
    pub per_class: BTreeMap<usize, f64>,
}

/// Accumulates detections against ground truth over an evaluation run.
#[derive(Debug, Clone)]
pub struct MeanAveragePrecision {
    num_classes: usize,
    iou_threshold: f64,
    ap_calculator: ApCalculator,
    records: Vec<ClassRecord>,
}

impl MeanAveragePrecision {
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn iou_threshold(&self) -> f64 {
        self.iou_threshold
    }

    /// Record the detections of one image.
    ///
    /// Per class, predictions claim the unclaimed ground truth box with the
    /// highest IoU in descending confidence order. A claim needs IoU at
    /// least the threshold, otherwise the prediction is a false positive.
    pub fn add(
        &mut self,
        predictions: &Detections<Pascal<f64>>,
        ground_truth: &LabeledBoxSet<Pascal<f64>>,
    ) -> Result<()> {
        let records = self.match_image(predictions, ground_truth)?;
        self.append(records);
        Ok(())
    }

    /// Record a batch of images, matched in parallel.
    pub fn add_batch(
        &mut self,
        images: &[(Detections<Pascal<f64>>, LabeledBoxSet<Pascal<f64>>)],
    ) -> Result<()> {
        let batch = images
            .par_iter()
            .map(|(predictions, ground_truth)| self.match_image(predictions, ground_truth))
            .collect::<Result<Vec<_>>>()?;
        batch.into_iter().for_each(|records| self.append(records));
        Ok(())
    }

    /// Absorb the records of another evaluator with the same settings.
    pub fn merge(&mut self, other: MeanAveragePrecision) -> Result<()> {
        ensure!(
            self.num_classes == other.num_classes,
            "cannot merge evaluators of {} and {} classes",
            self.num_classes,
            other.num_classes
        );
        ensure!(
            self.iou_threshold == other.iou_threshold,
            "cannot merge evaluators with different IoU thresholds"
        );
        ensure!(
            self.ap_calculator.integral_method() == other.ap_calculator.integral_method(),
            "cannot merge evaluators with different integral methods"
        );
        self.append(other.records);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.records = vec![ClassRecord::default(); self.num_classes];
    }

    pub fn compute(&self) -> MeanApOutput {
        let per_class: BTreeMap<usize, f64> = self
            .records
            .par_iter()
            .enumerate()
            .filter(|(_, record)| record.num_ground_truth > 0)
            .map(|(class, record)| {
                let ap = self
                    .ap_calculator
                    .compute_by_outcomes(&record.outcomes, record.num_ground_truth);
                (class, ap.raw())
            })
            .collect();

        let mean_ap = if per_class.is_empty() {
            warn!("no ground truth is recorded, mAP is set to zero");
            0.0
        } else {
            per_class.values().sum::<f64>() / per_class.len() as f64
        };
        info!(
            "mAP {:.4} over {} classes at IoU threshold {}",
            mean_ap,
            per_class.len(),
            self.iou_threshold
        );

        MeanApOutput { mean_ap, per_class }
    }

    fn append(&mut self, records: Vec<ClassRecord>) {
        self.records
            .iter_mut()
            .zip(records)
            .for_each(|(record, other)| record.extend(other));
    }

    fn match_image(
        &self,
        predictions: &Detections<Pascal<f64>>,
        ground_truth: &LabeledBoxSet<Pascal<f64>>,
    ) -> Result<Vec<ClassRecord>> {
        predictions.ensure_classes_below(self.num_classes)?;
        ground_truth.ensure_classes_below(self.num_classes)?;

        let pred_groups = predictions
            .iter()
            .map(|det| -> Result<_> {
                let confidence = R64::try_new(det.confidence)
                    .filter(|conf| (0.0..=1.0).contains(&conf.raw()))
                    .ok_or_else(|| {
                        format_err!("confidence {} is not in range [0, 1]", det.confidence)
                    })?;
                Ok((det.class, (confidence, det.rect)))
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .into_group_map();
        let gt_groups = ground_truth
            .iter()
            .map(|gt| (gt.class, gt.rect))
            .into_group_map();

        let records = (0..self.num_classes)
            .map(|class| {
                let gts = gt_groups.get(&class).map(Vec::as_slice).unwrap_or(&[]);
                let mut preds = pred_groups.get(&class).cloned().unwrap_or_default();
                preds.sort_by(|(lhs, _), (rhs, _)| rhs.cmp(lhs));

                let mut claimed = vec![false; gts.len()];
                let outcomes = preds
                    .into_iter()
                    .map(|(confidence, pred_box)| {
                        let best = gts
                            .iter()
                            .enumerate()
                            .filter(|&(index, _)| !claimed[index])
                            .map(|(index, gt_box)| (index, pred_box.iou_with(gt_box)))
                            .fold(None, |best: Option<(usize, f64)>, (index, iou)| match best {
                                Some((_, best_iou)) if best_iou >= iou => best,
                                _ => Some((index, iou)),
                            });

                        let is_tp = match best {
                            Some((index, iou)) if iou >= self.iou_threshold => {
                                claimed[index] = true;
                                true
                            }
                            _ => false,
                        };
                        (confidence, is_tp)
                    })
                    .collect();

                ClassRecord {
                    outcomes,
                    num_ground_truth: gts.len(),
                }
            })
            .collect();
        Ok(records)
    }
}
