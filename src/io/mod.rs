//! Input/output helpers.
//!
//! - property CSV ingest for batch runs (`ingest`)
//! - estimate and trace CSV exports (`export`)
//! - full valuation report JSON read/write (`json`)

pub mod export;
pub mod ingest;
pub mod json;

pub use export::*;
pub use ingest::*;
pub use json::*;
