//! Detection accuracy metrics.

mod average_precision;
mod mean_average_precision;

pub use average_precision::*;
pub use mean_average_precision::*;
