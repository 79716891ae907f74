//! `estate-value` library crate.
//!
//! The binary (`estate`) is a thin wrapper around this library so that:
//!
//! - the valuation core is testable without spawning processes
//! - the rule engine, predictor and blender are reusable from other front ends
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod blend;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod error;
pub mod factors;
pub mod insights;
pub mod io;
pub mod models;
pub mod report;
