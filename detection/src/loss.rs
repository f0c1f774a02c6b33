//! Loss function building blocks.

mod cross_entropy;
mod focal_loss;
mod set_criterion;
mod smooth_l1_loss;

pub use cross_entropy::*;
pub use focal_loss::*;
pub use set_criterion::*;
pub use smooth_l1_loss::*;

use crate::common::*;

/// How per-element losses are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    Sum,
    Mean,
}
