use crate::{common::*, Element};

/// The width and height of an image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSize<T> {
    w: T,
    h: T,
}

impl<T> ImageSize<T>
where
    T: Element,
{
    pub fn try_from_wh(wh: [T; 2]) -> Result<Self> {
        let [w, h] = wh;
        let zero = T::zero();
        ensure!(
            w.is_finite() && h.is_finite(),
            "width and height must be finite"
        );
        ensure!(
            w > zero && h > zero,
            "width and height parameters must be positive"
        );
        Ok(Self { w, h })
    }

    pub fn from_wh(wh: [T; 2]) -> Self {
        Self::try_from_wh(wh).unwrap()
    }

    /// The size of the normalized coordinate space.
    pub fn unit() -> Self {
        Self {
            w: T::one(),
            h: T::one(),
        }
    }

    pub fn area(&self) -> T {
        self.w * self.h
    }

    pub fn w(&self) -> T {
        self.w
    }

    pub fn h(&self) -> T {
        self.h
    }

    pub fn wh(&self) -> [T; 2] {
        [self.w, self.h]
    }
}
