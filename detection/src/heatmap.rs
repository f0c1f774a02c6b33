//! Dense center heatmap targets and their decoding back into boxes.

mod decoder;
mod encoder;
mod maps;

pub use decoder::*;
pub use encoder::*;
pub use maps::*;
