//! # Marrow Grow
//!
//! Headless runner for Marrow Grow. Plants one cycle for the configured
//! grower, lets the autopilot tend it and records the harvest.
//!
//! Usage: `marrow [CONFIG]`. Without a path the platform config directory
//! is used. Set `RUST_LOG` to change log verbosity.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;
mod score_store;

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("marrow=info".parse()?))
        .init();

    info!("Marrow Grow starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    app::run(config_path)?;

    info!("Marrow Grow shutdown complete");
    Ok(())
}
