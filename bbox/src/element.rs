use crate::common::*;

/// The scalar type of box coordinates.
pub trait Element: Float {
    fn two() -> Self {
        Self::one() + Self::one()
    }
}

impl<T> Element for T where T: Float {}
