//! Aegis scenario runner.
//!
//! Usage: `aegis-sim [SCENARIO.toml]`
//!
//! Logging is controlled through `RUST_LOG`; `aegis=info` is always on.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use std::path::PathBuf;

use aegis_sim::{Scenario, Simulation};
use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_SCENARIO: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/scenarios/duel.toml");

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("aegis=info".parse()?))
        .init();

    info!("Aegis simulation starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_SCENARIO), PathBuf::from);
    let scenario = Scenario::load_from(&path)
        .with_context(|| format!("Failed to load scenario {}", path.display()))?;
    let report_json = scenario.settings.report_json;

    let report = Simulation::new(&scenario).run();
    if report_json {
        println!("{}", report.to_json()?);
    } else {
        print!("{report}");
    }

    info!("Aegis simulation complete");
    Ok(())
}
