//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the validated property description (`PropertyInput`) and its enums
//! - rule engine outputs (`RuleEstimate`, `AdjustmentStep`)
//! - predictor and blend outputs (`MlEstimate`, `BlendedEstimate`)
//! - run configuration (`ValuationConfig`)

pub mod types;

pub use types::*;
