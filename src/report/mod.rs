//! Terminal reporting for valuations, factor tables and batch runs.

pub mod format;

pub use format::*;
