use crate::{common::*, Element, Pascal};

/// FCOS-style box, the distances from an anchor point to the left, top,
/// right and bottom box edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ltrb<T> {
    pub(crate) l: T,
    pub(crate) t: T,
    pub(crate) r: T,
    pub(crate) b: T,
}

impl<T> Ltrb<T>
where
    T: Element,
{
    pub fn try_from_ltrb(ltrb: [T; 4]) -> Result<Self> {
        let [l, t, r, b] = ltrb;
        ensure!(
            ltrb.iter().all(|value| value.is_finite()),
            "edge distances must be finite"
        );
        Ok(Self { l, t, r, b })
    }

    pub fn from_ltrb(ltrb: [T; 4]) -> Self {
        Self::try_from_ltrb(ltrb).unwrap()
    }

    /// Measure the edges of `rect` from the point `[x, y]`.
    pub fn from_point_and_box(point: [T; 2], rect: &Pascal<T>) -> Self {
        let [x, y] = point;
        Self {
            l: x - rect.x0,
            t: y - rect.y0,
            r: rect.x1 - x,
            b: rect.y1 - y,
        }
    }

    pub fn ltrb(&self) -> [T; 4] {
        [self.l, self.t, self.r, self.b]
    }

    /// Whether the anchor point lies strictly inside the box.
    pub fn contains_point(&self) -> bool {
        let zero = T::zero();
        self.l > zero && self.t > zero && self.r > zero && self.b > zero
    }

    pub fn to_pascal(&self, point: [T; 2]) -> Result<Pascal<T>> {
        let [x, y] = point;
        Pascal::try_from_xyxy([x - self.l, y - self.t, x + self.r, y + self.b])
    }

    /// How close the anchor point is to the box center, in range `[0, 1]`.
    ///
    /// Points on or outside the box edges score zero.
    pub fn centerness(&self) -> T {
        if !self.contains_point() {
            return T::zero();
        }
        let horizontal = self.l.min(self.r) / self.l.max(self.r);
        let vertical = self.t.min(self.b) / self.t.max(self.b);
        (horizontal * vertical).sqrt()
    }
}
