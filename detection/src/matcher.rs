//! Bipartite matching between set predictions and ground truth.

mod assignment;
mod hungarian_matcher;
mod set_prediction;

pub use assignment::*;
pub use hungarian_matcher::*;
pub use set_prediction::*;
