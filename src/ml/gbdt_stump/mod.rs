//! Gradient-boosted decision-stump classifier.
//!
//! Multi-class classification via softmax over boosted per-class raw scores.

mod model;

pub use model::{GbdtStumps, Stump};
