//! Rule valuation engine.
//!
//! Implemented as small, pure functions so the chain stays easy to test and
//! to explain step by step.

pub mod rules;
pub mod trace;

pub use rules::*;
pub use trace::TraceBuilder;
