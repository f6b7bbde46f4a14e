//! Router OpenAPI - command-line companion of the library.
//!
//! # Usage
//!
//! Print the component schemas generated for a configuration:
//! ```bash
//! router-openapi schemas --config swagger.yaml
//! ```
//!
//! Write them as YAML:
//! ```bash
//! router-openapi schemas --config swagger.yaml -f yaml -o schemas.yaml
//! ```
//!
//! Drop the cached document so the next start regenerates it:
//! ```bash
//! router-openapi clean --config swagger.yaml
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use router_openapi::cli;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("Router OpenAPI starting...");
    cli::run(args)?;

    Ok(())
}
