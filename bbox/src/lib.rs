//! Safe bounding box types and functions.
//!
//! Boxes are tagged with their coordinate convention at the type level.
//! [Pascal] holds absolute corners, [Coco] holds the absolute top-left corner
//! and size, and [Yolo] holds the center and size normalized by the image
//! size. Conversions are the only way to change the convention.

mod common;

pub use box_set::*;
pub mod box_set;

pub use coco::*;
pub mod coco;

pub use element::*;
pub mod element;

pub use ltrb::*;
pub mod ltrb;

pub use pascal::*;
pub mod pascal;

pub use rect::*;
pub mod rect;

pub use size::*;
pub mod size;

pub use transform::*;
mod transform;

pub use yolo::*;
pub mod yolo;

pub mod prelude {
    pub use crate::rect::{Rect, RectFloat};
}
