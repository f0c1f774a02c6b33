//! Reference points and boxes attached to grid cells.

mod anchor_grid;
mod box_delta;
mod pyramid_anchors;

pub use anchor_grid::*;
pub use box_delta::*;
pub use pyramid_anchors::*;
