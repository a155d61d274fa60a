//! # Aegis Common
//!
//! Shared value types for the Aegis status-effect engine:
//! - Entity identifiers and an explicit allocator
//! - Simulation clock helpers (milliseconds)
//! - Version information for data formats

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod ids;
pub mod time;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::time::Millis;
    pub use crate::version::*;
}

pub use prelude::*;
