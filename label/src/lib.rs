//! Boxes paired with class labels and confidence scores.

use anyhow::{ensure, Result};
use bbox::{BoxSet, Element, Pascal, Transform};
use std::ops::Mul;

pub use detections::*;
pub use labeled_box_set::*;

/// A single box with its class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label<R, C> {
    pub rect: R,
    pub class: C,
}

impl<'a, T, C> Mul<&'a Label<Pascal<T>, C>> for &'a Transform<T>
where
    T: Element,
    C: Copy,
{
    type Output = Label<Pascal<T>, C>;

    fn mul(self, rhs: &'a Label<Pascal<T>, C>) -> Self::Output {
        Label {
            rect: self * &rhs.rect,
            class: rhs.class,
        }
    }
}

/// A single predicted box with its class and confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredLabel<R, C> {
    pub rect: R,
    pub class: C,
    pub confidence: f64,
}

fn ensure_classes_below(labels: &[usize], num_classes: usize) -> Result<()> {
    if let Some(&class) = labels.iter().find(|&&class| class >= num_classes) {
        anyhow::bail!(
            "class id {} is out of range for {} classes",
            class,
            num_classes
        );
    }
    Ok(())
}

mod labeled_box_set {
    use super::*;

    /// Ground truth boxes of one image, with a parallel list of class ids.
    #[derive(Debug, Clone, PartialEq)]
    pub struct LabeledBoxSet<R> {
        boxes: BoxSet<R>,
        labels: Vec<usize>,
    }

    impl<R> LabeledBoxSet<R> {
        pub fn try_new(boxes: BoxSet<R>, labels: Vec<usize>) -> Result<Self> {
            ensure!(
                boxes.len() == labels.len(),
                "the number of boxes {} does not match the number of labels {}",
                boxes.len(),
                labels.len()
            );
            Ok(Self { boxes, labels })
        }

        pub fn empty() -> Self {
            Self {
                boxes: BoxSet::empty(),
                labels: vec![],
            }
        }

        pub fn boxes(&self) -> &BoxSet<R> {
            &self.boxes
        }

        pub fn labels(&self) -> &[usize] {
            &self.labels
        }

        pub fn len(&self) -> usize {
            self.labels.len()
        }

        pub fn is_empty(&self) -> bool {
            self.labels.is_empty()
        }

        pub fn iter(&self) -> impl Iterator<Item = Label<&R, usize>> + '_ {
            self.boxes
                .iter()
                .zip(self.labels.iter().copied())
                .map(|(rect, class)| Label { rect, class })
        }

        /// Fail if any class id is not below `num_classes`.
        pub fn ensure_classes_below(&self, num_classes: usize) -> Result<()> {
            ensure_classes_below(&self.labels, num_classes)
        }

        /// Transform the boxes while keeping the labels.
        pub fn map_boxes<S, F>(&self, f: F) -> LabeledBoxSet<S>
        where
            F: FnMut(&R) -> S,
        {
            LabeledBoxSet {
                boxes: self.boxes.map(f),
                labels: self.labels.clone(),
            }
        }
    }

    impl<R> FromIterator<Label<R, usize>> for LabeledBoxSet<R> {
        fn from_iter<I>(iter: I) -> Self
        where
            I: IntoIterator<Item = Label<R, usize>>,
        {
            let (boxes, labels): (Vec<_>, Vec<_>) = iter
                .into_iter()
                .map(|Label { rect, class }| (rect, class))
                .unzip();
            Self {
                boxes: boxes.into(),
                labels,
            }
        }
    }
}

mod detections {
    use super::*;

    /// Predicted boxes of one image, with parallel class ids and confidences.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Detections<R> {
        boxes: BoxSet<R>,
        labels: Vec<usize>,
        confidences: Vec<f64>,
    }

    impl<R> Detections<R> {
        pub fn try_new(
            boxes: BoxSet<R>,
            labels: Vec<usize>,
            confidences: Vec<f64>,
        ) -> Result<Self> {
            ensure!(
                boxes.len() == labels.len() && boxes.len() == confidences.len(),
                "size mismatch: {} boxes, {} labels and {} confidences",
                boxes.len(),
                labels.len(),
                confidences.len()
            );
            ensure!(
                confidences
                    .iter()
                    .all(|conf| conf.is_finite() && (0.0..=1.0).contains(conf)),
                "confidences must be in range [0, 1]"
            );
            Ok(Self {
                boxes,
                labels,
                confidences,
            })
        }

        pub fn empty() -> Self {
            Self {
                boxes: BoxSet::empty(),
                labels: vec![],
                confidences: vec![],
            }
        }

        pub fn boxes(&self) -> &BoxSet<R> {
            &self.boxes
        }

        pub fn labels(&self) -> &[usize] {
            &self.labels
        }

        pub fn confidences(&self) -> &[f64] {
            &self.confidences
        }

        pub fn len(&self) -> usize {
            self.labels.len()
        }

        pub fn is_empty(&self) -> bool {
            self.labels.is_empty()
        }

        pub fn iter(&self) -> impl Iterator<Item = ScoredLabel<&R, usize>> + '_ {
            self.boxes
                .iter()
                .zip(self.labels.iter().copied())
                .zip(self.confidences.iter().copied())
                .map(|((rect, class), confidence)| ScoredLabel {
                    rect,
                    class,
                    confidence,
                })
        }

        pub fn ensure_classes_below(&self, num_classes: usize) -> Result<()> {
            ensure_classes_below(&self.labels, num_classes)
        }

        pub fn map_boxes<S, F>(&self, f: F) -> Detections<S>
        where
            F: FnMut(&R) -> S,
        {
            Detections {
                boxes: self.boxes.map(f),
                labels: self.labels.clone(),
                confidences: self.confidences.clone(),
            }
        }
    }

    impl<R> Detections<R> {
        /// Collect scored boxes, failing on a confidence outside `[0, 1]`.
        pub fn try_from_iter<I>(iter: I) -> Result<Self>
        where
            I: IntoIterator<Item = ScoredLabel<R, usize>>,
        {
            let mut boxes = vec![];
            let mut labels = vec![];
            let mut confidences = vec![];
            iter.into_iter().for_each(|scored| {
                boxes.push(scored.rect);
                labels.push(scored.class);
                confidences.push(scored.confidence);
            });
            Self::try_new(boxes.into(), labels, confidences)
        }
    }
}
