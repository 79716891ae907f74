//! Factor registry and clamp policy.
//!
//! - `table`: base rates and multiplier parameters loaded from TOML
//! - `bands`: the fixed clamp band per adjustment factor

pub mod bands;
pub mod table;

pub use bands::*;
pub use table::*;
