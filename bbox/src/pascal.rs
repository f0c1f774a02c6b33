use crate::{common::*, Coco, Element, ImageSize, Rect, RectFloat, Transform, Yolo};

/// Bounding box in Pascal VOC format, `[x0, y0, x1, y1]` in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pascal<T> {
    pub(crate) x0: T,
    pub(crate) y0: T,
    pub(crate) x1: T,
    pub(crate) y1: T,
}

impl<T> Pascal<T>
where
    T: Element,
{
    pub fn try_from_xyxy(xyxy: [T; 4]) -> Result<Self> {
        let [x0, y0, x1, y1] = xyxy;
        ensure!(
            xyxy.iter().all(|value| value.is_finite()),
            "box coordinates must be finite"
        );
        ensure!(x1 >= x0 && y1 >= y0, "x1 >= x0 and y1 >= y0 must hold");

        Ok(Self { x0, y0, x1, y1 })
    }

    pub fn from_xyxy(xyxy: [T; 4]) -> Self {
        Self::try_from_xyxy(xyxy).unwrap()
    }

    pub fn to_coco(&self) -> Coco<T> {
        Coco {
            x: self.x0,
            y: self.y0,
            w: self.x1 - self.x0,
            h: self.y1 - self.y0,
        }
    }

    pub fn to_yolo(&self, size: &ImageSize<T>) -> Yolo<T> {
        let two = T::two();
        let [size_w, size_h] = size.wh();
        Yolo {
            cx: (self.x0 + self.x1) / two / size_w,
            cy: (self.y0 + self.y1) / two / size_h,
            w: (self.x1 - self.x0) / size_w,
            h: (self.y1 - self.y0) / size_h,
        }
    }

    /// Clip the coordinates into `[0, w] x [0, h]` without reordering corners.
    pub fn clamp(&self, size: &ImageSize<T>) -> Self {
        let zero = T::zero();
        let [size_w, size_h] = size.wh();
        let clip_x = |x: T| x.max(zero).min(size_w);
        let clip_y = |y: T| y.max(zero).min(size_h);

        Self {
            x0: clip_x(self.x0),
            y0: clip_y(self.y0),
            x1: clip_x(self.x1),
            y1: clip_y(self.y1),
        }
    }

    /// Mirror the box horizontally within an image.
    pub fn hflip(&self, size: &ImageSize<T>) -> Self {
        let size_w = size.w();
        Self {
            x0: size_w - self.x1,
            y0: self.y0,
            x1: size_w - self.x0,
            y1: self.y1,
        }
    }

    /// Mirror the box vertically within an image.
    pub fn vflip(&self, size: &ImageSize<T>) -> Self {
        let size_h = size.h();
        Self {
            x0: self.x0,
            y0: size_h - self.y1,
            x1: self.x1,
            y1: size_h - self.y0,
        }
    }

    pub fn shift(&self, dx: T, dy: T) -> Self {
        self.transform(&Transform::shift(dx, dy))
    }

    pub fn resize(&self, scale_x: T, scale_y: T) -> Result<Self> {
        Ok(self.transform(&Transform::try_scale(scale_x, scale_y)?))
    }

    pub fn transform(&self, transform: &Transform<T>) -> Self {
        Self {
            x0: self.x0 * transform.sx + transform.tx,
            y0: self.y0 * transform.sy + transform.ty,
            x1: self.x1 * transform.sx + transform.tx,
            y1: self.y1 * transform.sy + transform.ty,
        }
    }

    /// The fraction of this box's area that lies inside `region`.
    ///
    /// A zero-area box has fill ratio zero.
    pub fn fill_ratio_in(&self, region: &Self) -> T {
        let area = self.area();
        if area <= T::zero() {
            return T::zero();
        }
        self.intersection_area_with(region) / area
    }
}

impl<T> Rect for Pascal<T>
where
    T: Element,
{
    type Type = T;

    fn x0(&self) -> T {
        self.x0
    }

    fn y0(&self) -> T {
        self.y0
    }

    fn x1(&self) -> T {
        self.x1
    }

    fn y1(&self) -> T {
        self.y1
    }

    fn cx(&self) -> T {
        self.x0 + self.w() / T::two()
    }

    fn cy(&self) -> T {
        self.y0 + self.h() / T::two()
    }

    fn w(&self) -> T {
        self.x1 - self.x0
    }

    fn h(&self) -> T {
        self.y1 - self.y0
    }
}

impl<T> From<Coco<T>> for Pascal<T>
where
    T: Element,
{
    fn from(from: Coco<T>) -> Self {
        from.to_pascal()
    }
}

impl<T> From<&Coco<T>> for Pascal<T>
where
    T: Element,
{
    fn from(from: &Coco<T>) -> Self {
        from.to_pascal()
    }
}
