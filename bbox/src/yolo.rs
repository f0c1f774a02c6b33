use crate::{common::*, Coco, Element, ImageSize, Pascal, Rect};

/// Bounding box in YOLO format, `[cx, cy, w, h]` normalized by the image size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Yolo<T> {
    pub(crate) cx: T,
    pub(crate) cy: T,
    pub(crate) w: T,
    pub(crate) h: T,
}

impl<T> Yolo<T>
where
    T: Element,
{
    pub fn try_from_cxcywh(cxcywh: [T; 4]) -> Result<Self> {
        let [cx, cy, w, h] = cxcywh;
        let zero = T::zero();
        ensure!(
            cxcywh.iter().all(|value| value.is_finite()),
            "box coordinates must be finite"
        );
        ensure!(
            w >= zero && h >= zero,
            "box height and width must be non-negative"
        );

        Ok(Self { cx, cy, w, h })
    }

    pub fn from_cxcywh(cxcywh: [T; 4]) -> Self {
        Self::try_from_cxcywh(cxcywh).unwrap()
    }

    pub fn to_pascal(&self, size: &ImageSize<T>) -> Pascal<T> {
        let two = T::two();
        let [size_w, size_h] = size.wh();
        Pascal {
            x0: (self.cx - self.w / two) * size_w,
            y0: (self.cy - self.h / two) * size_h,
            x1: (self.cx + self.w / two) * size_w,
            y1: (self.cy + self.h / two) * size_h,
        }
    }

    pub fn to_coco(&self, size: &ImageSize<T>) -> Coco<T> {
        self.to_pascal(size).to_coco()
    }

    pub fn hflip(&self) -> Self {
        Self {
            cx: T::one() - self.cx,
            ..*self
        }
    }

    pub fn vflip(&self) -> Self {
        Self {
            cy: T::one() - self.cy,
            ..*self
        }
    }

    /// Clip the box into the unit square.
    pub fn clamp(&self) -> Self {
        let unit = ImageSize::unit();
        self.to_pascal(&unit).clamp(&unit).to_yolo(&unit)
    }

    pub fn try_scale(&self, scale_w: T, scale_h: T) -> Result<Self> {
        let zero = T::zero();
        ensure!(
            scale_w > zero && scale_h > zero,
            "scaling factor must be positive"
        );

        Ok(Self {
            w: self.w * scale_w,
            h: self.h * scale_h,
            ..*self
        })
    }
}

impl<T> Rect for Yolo<T>
where
    T: Element,
{
    type Type = T;

    fn x0(&self) -> T {
        self.cx - self.w / T::two()
    }

    fn y0(&self) -> T {
        self.cy - self.h / T::two()
    }

    fn x1(&self) -> T {
        self.cx + self.w / T::two()
    }

    fn y1(&self) -> T {
        self.cy + self.h / T::two()
    }

    fn cx(&self) -> T {
        self.cx
    }

    fn cy(&self) -> T {
        self.cy
    }

    fn w(&self) -> T {
        self.w
    }

    fn h(&self) -> T {
        self.h
    }
}
