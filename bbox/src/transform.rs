use crate::{common::*, Element, ImageSize, Pascal};

/// Axis-aligned affine map `(x, y) -> (x * sx + tx, y * sy + ty)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transform<T> {
    pub sx: T,
    pub sy: T,
    pub tx: T,
    pub ty: T,
}

impl<T> Transform<T>
where
    T: Element,
{
    pub fn identity() -> Self {
        Self {
            sx: T::one(),
            sy: T::one(),
            tx: T::zero(),
            ty: T::zero(),
        }
    }

    pub fn shift(dx: T, dy: T) -> Self {
        Self {
            tx: dx,
            ty: dy,
            ..Self::identity()
        }
    }

    pub fn try_scale(sx: T, sy: T) -> Result<Self> {
        let zero = T::zero();
        ensure!(
            sx.is_finite() && sy.is_finite() && sx > zero && sy > zero,
            "scaling factor must be positive"
        );

        Ok(Self {
            sx,
            sy,
            ..Self::identity()
        })
    }

    /// Build the transform mapping the `src` box onto the `tgt` box.
    pub fn try_from_rects(src: &Pascal<T>, tgt: &Pascal<T>) -> Result<Self> {
        let zero = T::zero();
        let src_w = src.x1 - src.x0;
        let src_h = src.y1 - src.y0;
        ensure!(
            src_w > zero && src_h > zero,
            "the source box must have positive width and height"
        );

        let sx = (tgt.x1 - tgt.x0) / src_w;
        let sy = (tgt.y1 - tgt.y0) / src_h;
        let tx = tgt.x0 - src.x0 * sx;
        let ty = tgt.y0 - src.y0 * sy;

        Ok(Self { sx, sy, tx, ty })
    }

    /// The exact rescale from one image size to another.
    pub fn from_sizes_exact(src_size: &ImageSize<T>, tgt_size: &ImageSize<T>) -> Self {
        Self {
            sx: tgt_size.w() / src_size.w(),
            sy: tgt_size.h() / src_size.h(),
            tx: T::zero(),
            ty: T::zero(),
        }
    }

    pub fn inverse(&self) -> Self {
        let sx = T::one() / self.sx;
        let sy = T::one() / self.sy;
        let tx = -self.tx / self.sx;
        let ty = -self.ty / self.sy;

        Self { sx, sy, tx, ty }
    }
}

impl<T> Mul<&Pascal<T>> for &Transform<T>
where
    T: Element,
{
    type Output = Pascal<T>;

    fn mul(self, rhs: &Pascal<T>) -> Self::Output {
        rhs.transform(self)
    }
}

impl<T> Mul<&Transform<T>> for &Transform<T>
where
    T: Element,
{
    type Output = Transform<T>;

    fn mul(self, rhs: &Transform<T>) -> Self::Output {
        Transform {
            sx: self.sx * rhs.sx,
            sy: self.sy * rhs.sy,
            tx: rhs.tx * self.sx + self.tx,
            ty: rhs.ty * self.sy + self.ty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RectFloat;

    #[test]
    fn rect_transform_inverse() {
        let orig = Transform {
            sx: 2.0,
            sy: 2.0,
            tx: 1.0,
            ty: 1.0,
        };
        assert_eq!(orig.inverse().inverse(), orig);
        assert_eq!(&orig * &orig.inverse(), Transform::identity());
    }

    #[test]
    fn rect_resize_exact() {
        let transform = Transform::from_sizes_exact(
            &ImageSize::from_wh([80.0, 80.0]),
            &ImageSize::from_wh([40.0, 20.0]),
        );
        let expect = Transform {
            sx: 0.5,
            sy: 0.25,
            tx: 0.0,
            ty: 0.0,
        };
        assert_eq!(transform, expect);

        let rect = &transform * &Pascal::from_xyxy([8.0, 8.0, 16.0, 40.0]);
        assert_eq!(rect.xyxy(), [4.0, 2.0, 8.0, 10.0]);
    }

    #[test]
    fn rect_transform_from_rects() {
        let src = Pascal::from_xyxy([0.0, 0.0, 10.0, 10.0]);
        let tgt = Pascal::from_xyxy([5.0, 5.0, 25.0, 15.0]);
        let transform = Transform::try_from_rects(&src, &tgt).unwrap();
        assert_eq!((&transform * &src).xyxy(), tgt.xyxy());

        let flat = Pascal::from_xyxy([0.0, 0.0, 0.0, 10.0]);
        assert!(Transform::try_from_rects(&flat, &tgt).is_err());
    }
}
