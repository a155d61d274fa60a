//! # Aegis Sim
//!
//! Scenario harness for the Aegis status-effect engine:
//! - TOML scenario files with versioned format and validation
//! - A fixed-step runner that drives combatants through a timeline
//! - Text and JSON reports of the final state

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod runner;
pub mod scenario;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::runner::*;
    pub use crate::scenario::*;
}

pub use prelude::*;
