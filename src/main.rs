//! # `smash-config`
//!
//! `smash-config` inspects the settings file that describes a Pulp deployment
//! under test: where it is loaded from and saved to, whether it is valid, and
//! which hosts play which roles.
//!
//! ## Usage
//!
//! ```sh
//! smash-config settings load-path
//! smash-config settings validate
//! smash-config hosts --role shell
//! ```
//!
//! Set `PULP_SMASH_LOG_LEVEL` (e.g. `debug`) to control log output.

use anyhow::Result;
use clap::Parser as _;
use smash_config::cli::Args;
use smash_config::error::ConfigError;
use smash_config::system::real::RealSystem;
use std::io;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber based on verbose flag
    let log_level = if args.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("PULP_SMASH_LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt()
        .with_target(false)
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();

    let system = RealSystem::new();
    let mut stdout = io::stdout().lock();
    match smash_config::run(&args, &system, &mut stdout) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            error!("{:#}", err);
            std::process::exit(
                err.downcast_ref::<ConfigError>()
                    .map_or(1, ConfigError::exit_code),
            );
        }
    }
}
