//! cc-core: shared foundation for the cave-carbonate workspace.
//!
//! Contains:
//! - numeric (Real, missing-value scrubbing, zero-safe ratios)
//! - units (uom temperature types + Celsius/Kelvin helpers)
//! - error (shared error type)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::*;
