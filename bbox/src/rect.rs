use crate::{common::*, Element};

/// The generic rectangle.
///
/// The accessors are expressed in the box's own coordinate space. A
/// normalized [Yolo](crate::Yolo) box reports normalized corners, an absolute
/// [Pascal](crate::Pascal) box reports pixel corners.
pub trait Rect {
    type Type;

    fn x0(&self) -> Self::Type;
    fn y0(&self) -> Self::Type;
    fn x1(&self) -> Self::Type;
    fn y1(&self) -> Self::Type;
    fn cx(&self) -> Self::Type;
    fn cy(&self) -> Self::Type;
    fn w(&self) -> Self::Type;
    fn h(&self) -> Self::Type;
}

pub trait RectFloat: Rect
where
    Self::Type: Element,
{
    fn xyxy(&self) -> [Self::Type; 4] {
        [self.x0(), self.y0(), self.x1(), self.y1()]
    }

    fn cxcywh(&self) -> [Self::Type; 4] {
        [self.cx(), self.cy(), self.w(), self.h()]
    }

    /// The box area. Degenerate and inverted boxes have zero area.
    fn area(&self) -> Self::Type {
        let zero = Self::Type::zero();
        (self.x1() - self.x0()).max(zero) * (self.y1() - self.y0()).max(zero)
    }

    /// Compute the corners of the intersection, if the boxes overlap.
    fn intersect_with(&self, other: &Self) -> Option<[Self::Type; 4]>
    where
        Self: Sized,
    {
        let x0 = self.x0().max(other.x0());
        let y0 = self.y0().max(other.y0());
        let x1 = self.x1().min(other.x1());
        let y1 = self.y1().min(other.y1());
        (x1 > x0 && y1 > y0).then(|| [x0, y0, x1, y1])
    }

    fn intersection_area_with(&self, other: &Self) -> Self::Type
    where
        Self: Sized,
    {
        self.intersect_with(other)
            .map(|[x0, y0, x1, y1]| (x1 - x0) * (y1 - y0))
            .unwrap_or_else(Self::Type::zero)
    }

    /// Compute the corners of the smallest box enclosing both boxes.
    fn closure_with(&self, other: &Self) -> [Self::Type; 4]
    where
        Self: Sized,
    {
        [
            self.x0().min(other.x0()),
            self.y0().min(other.y0()),
            self.x1().max(other.x1()),
            self.y1().max(other.y1()),
        ]
    }

    /// Intersection over union.
    ///
    /// It is zero if either box has zero area.
    fn iou_with(&self, other: &Self) -> Self::Type
    where
        Self: Sized,
    {
        let zero = Self::Type::zero();
        let lhs_area = self.area();
        let rhs_area = other.area();
        if lhs_area <= zero || rhs_area <= zero {
            return zero;
        }

        let inter_area = self.intersection_area_with(other);
        let union_area = lhs_area + rhs_area - inter_area;
        (inter_area / union_area).min(Self::Type::one())
    }

    /// Generalized intersection over union, in range `[-1, 1]`.
    fn giou_with(&self, other: &Self) -> Self::Type
    where
        Self: Sized,
    {
        let zero = Self::Type::zero();
        let inter_area = self.intersection_area_with(other);
        let union_area = self.area() + other.area() - inter_area;
        let closure_area = {
            let [x0, y0, x1, y1] = self.closure_with(other);
            (x1 - x0).max(zero) * (y1 - y0).max(zero)
        };
        if closure_area <= zero {
            return zero;
        }

        self.iou_with(other) - (closure_area - union_area) / closure_area
    }
}

impl<T> RectFloat for T
where
    T: Rect,
    T::Type: Element,
{
}
