use crate::{common::*, Element, ImageSize, Pascal, Rect, Yolo};

/// Bounding box in COCO format, `[x, y, w, h]` in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coco<T> {
    pub(crate) x: T,
    pub(crate) y: T,
    pub(crate) w: T,
    pub(crate) h: T,
}

impl<T> Coco<T>
where
    T: Element,
{
    pub fn try_from_xywh(xywh: [T; 4]) -> Result<Self> {
        let [x, y, w, h] = xywh;
        let zero = T::zero();
        ensure!(
            xywh.iter().all(|value| value.is_finite()),
            "box coordinates must be finite"
        );
        ensure!(
            w >= zero && h >= zero,
            "box height and width must be non-negative"
        );

        Ok(Self { x, y, w, h })
    }

    pub fn from_xywh(xywh: [T; 4]) -> Self {
        Self::try_from_xywh(xywh).unwrap()
    }

    pub fn xywh(&self) -> [T; 4] {
        [self.x, self.y, self.w, self.h]
    }

    pub fn to_pascal(&self) -> Pascal<T> {
        Pascal {
            x0: self.x,
            y0: self.y,
            x1: self.x + self.w,
            y1: self.y + self.h,
        }
    }

    pub fn to_yolo(&self, size: &ImageSize<T>) -> Yolo<T> {
        self.to_pascal().to_yolo(size)
    }
}

impl<T> Rect for Coco<T>
where
    T: Element,
{
    type Type = T;

    fn x0(&self) -> T {
        self.x
    }

    fn y0(&self) -> T {
        self.y
    }

    fn x1(&self) -> T {
        self.x + self.w
    }

    fn y1(&self) -> T {
        self.y + self.h
    }

    fn cx(&self) -> T {
        self.x + self.w / T::two()
    }

    fn cy(&self) -> T {
        self.y + self.h / T::two()
    }

    fn w(&self) -> T {
        self.w
    }

    fn h(&self) -> T {
        self.h
    }
}

impl<T> From<Pascal<T>> for Coco<T>
where
    T: Element,
{
    fn from(from: Pascal<T>) -> Self {
        from.to_coco()
    }
}

impl<T> From<&Pascal<T>> for Coco<T>
where
    T: Element,
{
    fn from(from: &Pascal<T>) -> Self {
        from.to_coco()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RectFloat;
    use approx::assert_abs_diff_eq;

    #[test]
    fn coco_pascal_round_trip() {
        let pascal = Pascal::from_xyxy([3.5, 1.25, 10.0, 7.75]);
        let coco = pascal.to_coco();
        assert_eq!(coco.xywh(), [3.5, 1.25, 6.5, 6.5]);

        let [x0, y0, x1, y1] = coco.to_pascal().xyxy();
        let [ex0, ey0, ex1, ey1] = pascal.xyxy();
        assert_abs_diff_eq!(x0, ex0, epsilon = 1e-12);
        assert_abs_diff_eq!(y0, ey0, epsilon = 1e-12);
        assert_abs_diff_eq!(x1, ex1, epsilon = 1e-12);
        assert_abs_diff_eq!(y1, ey1, epsilon = 1e-12);
    }

    #[test]
    fn coco_to_yolo() {
        let size = ImageSize::from_wh([200.0, 100.0]);
        let yolo = Coco::from_xywh([20.0, 10.0, 40.0, 20.0]).to_yolo(&size);
        let [cx, cy, w, h] = yolo.cxcywh();
        assert_abs_diff_eq!(cx, 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(cy, 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(w, 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(h, 0.2, epsilon = 1e-12);
    }
}
