//! Detection target codecs, matching, losses and evaluation.
//!
//! The crate works on the box types of [bbox] and the labelled containers of
//! [label]. Dense maps are [ndarray] arrays in `[channel, row, col]` layout.

mod common;
pub mod anchor;
pub mod config;
pub mod heatmap;
pub mod loss;
pub mod matcher;
pub mod metrics;

pub use config::Config;
