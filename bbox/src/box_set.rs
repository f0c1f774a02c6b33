use crate::{common::*, Coco, Element, ImageSize, Pascal, RectFloat, Transform, Yolo};

/// An ordered, immutable collection of boxes in one coordinate convention.
///
/// Every transformation returns a new set. Operations on an empty set
/// return an empty set.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSet<R> {
    boxes: Vec<R>,
}

impl<R> BoxSet<R> {
    pub fn new(boxes: Vec<R>) -> Self {
        Self { boxes }
    }

    pub fn empty() -> Self {
        Self { boxes: vec![] }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&R> {
        self.boxes.get(index)
    }

    pub fn iter(&self) -> slice::Iter<'_, R> {
        self.boxes.iter()
    }

    pub fn as_slice(&self) -> &[R] {
        &self.boxes
    }

    pub fn into_vec(self) -> Vec<R> {
        self.boxes
    }

    pub fn map<S, F>(&self, f: F) -> BoxSet<S>
    where
        F: FnMut(&R) -> S,
    {
        self.boxes.iter().map(f).collect()
    }

    /// Select boxes by a keep-mask of the same length.
    pub fn try_select(&self, mask: &[bool]) -> Result<Self>
    where
        R: Clone,
    {
        ensure!(
            mask.len() == self.len(),
            "mask length {} does not match the number of boxes {}",
            mask.len(),
            self.len()
        );
        Ok(self
            .boxes
            .iter()
            .zip(mask)
            .filter(|&(_, &keep)| keep)
            .map(|(rect, _)| rect.clone())
            .collect())
    }
}

impl<R> BoxSet<R>
where
    R: RectFloat,
    R::Type: Element,
{
    pub fn areas(&self) -> Vec<R::Type> {
        self.boxes.iter().map(|rect| rect.area()).collect()
    }

    /// Pairwise IoU, indexed as `[self_index][other_index]`.
    pub fn iou_matrix(&self, other: &Self) -> Vec<Vec<R::Type>> {
        self.boxes
            .iter()
            .map(|lhs| other.boxes.iter().map(|rhs| lhs.iou_with(rhs)).collect())
            .collect()
    }

    /// Pairwise generalized IoU, indexed as `[self_index][other_index]`.
    pub fn giou_matrix(&self, other: &Self) -> Vec<Vec<R::Type>> {
        self.boxes
            .iter()
            .map(|lhs| other.boxes.iter().map(|rhs| lhs.giou_with(rhs)).collect())
            .collect()
    }

    /// Keep the boxes whose area satisfies the predicate.
    ///
    /// Returns the kept boxes along with the keep-mask.
    pub fn filter_by_area<F>(&self, mut predicate: F) -> (Self, Vec<bool>)
    where
        R: Clone,
        F: FnMut(R::Type) -> bool,
    {
        let mask: Vec<bool> = self
            .boxes
            .iter()
            .map(|rect| predicate(rect.area()))
            .collect();
        let kept = self
            .boxes
            .iter()
            .zip(&mask)
            .filter(|&(_, &keep)| keep)
            .map(|(rect, _)| rect.clone())
            .collect();
        (kept, mask)
    }
}

impl<T> BoxSet<Pascal<T>>
where
    T: Element,
{
    pub fn to_coco(&self) -> BoxSet<Coco<T>> {
        self.map(Pascal::to_coco)
    }

    pub fn to_yolo(&self, size: &ImageSize<T>) -> BoxSet<Yolo<T>> {
        self.map(|rect| rect.to_yolo(size))
    }

    pub fn clamp(&self, size: &ImageSize<T>) -> Self {
        self.map(|rect| rect.clamp(size))
    }

    pub fn hflip(&self, size: &ImageSize<T>) -> Self {
        self.map(|rect| rect.hflip(size))
    }

    pub fn vflip(&self, size: &ImageSize<T>) -> Self {
        self.map(|rect| rect.vflip(size))
    }

    pub fn shift(&self, dx: T, dy: T) -> Self {
        self.transform(&Transform::shift(dx, dy))
    }

    pub fn resize(&self, scale_x: T, scale_y: T) -> Result<Self> {
        Ok(self.transform(&Transform::try_scale(scale_x, scale_y)?))
    }

    pub fn transform(&self, transform: &Transform<T>) -> Self {
        self.map(|rect| rect.transform(transform))
    }

    /// The fraction of each box lying inside `region`.
    pub fn fill_ratios_in(&self, region: &Pascal<T>) -> Vec<T> {
        self.boxes
            .iter()
            .map(|rect| rect.fill_ratio_in(region))
            .collect()
    }

    /// Mark the boxes with more than `min_fill` of their area inside `region`.
    pub fn inside_region(&self, region: &Pascal<T>, min_fill: T) -> Vec<bool> {
        self.boxes
            .iter()
            .map(|rect| rect.fill_ratio_in(region) > min_fill)
            .collect()
    }
}

impl<T> BoxSet<Coco<T>>
where
    T: Element,
{
    pub fn to_pascal(&self) -> BoxSet<Pascal<T>> {
        self.map(Coco::to_pascal)
    }

    pub fn to_yolo(&self, size: &ImageSize<T>) -> BoxSet<Yolo<T>> {
        self.map(|rect| rect.to_yolo(size))
    }
}

impl<T> BoxSet<Yolo<T>>
where
    T: Element,
{
    pub fn to_pascal(&self, size: &ImageSize<T>) -> BoxSet<Pascal<T>> {
        self.map(|rect| rect.to_pascal(size))
    }

    pub fn to_coco(&self, size: &ImageSize<T>) -> BoxSet<Coco<T>> {
        self.map(|rect| rect.to_coco(size))
    }

    pub fn hflip(&self) -> Self {
        self.map(Yolo::hflip)
    }

    pub fn vflip(&self) -> Self {
        self.map(Yolo::vflip)
    }

    pub fn clamp(&self) -> Self {
        self.map(Yolo::clamp)
    }
}

impl<R> Default for BoxSet<R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<R> From<Vec<R>> for BoxSet<R> {
    fn from(boxes: Vec<R>) -> Self {
        Self::new(boxes)
    }
}

impl<R> FromIterator<R> for BoxSet<R> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = R>,
    {
        Self::new(iter.into_iter().collect())
    }
}

impl<R> Index<usize> for BoxSet<R> {
    type Output = R;

    fn index(&self, index: usize) -> &Self::Output {
        &self.boxes[index]
    }
}

impl<'a, R> IntoIterator for &'a BoxSet<R> {
    type Item = &'a R;
    type IntoIter = slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.boxes.iter()
    }
}

impl<R> IntoIterator for BoxSet<R> {
    type Item = R;
    type IntoIter = vec::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.boxes.into_iter()
    }
}
