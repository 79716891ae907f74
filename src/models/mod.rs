//! Price prediction models.
//!
//! - `linear`: a pre-trained linear model read from a JSON artifact
//! - `synthetic`: a deterministic stand-in used when no artifact is configured
//! - `predictor`: the front the pipeline talks to, with load-time status

pub mod features;
pub mod linear;
pub mod predictor;
pub mod synthetic;

pub use predictor::*;
