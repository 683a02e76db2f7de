//! Swagger From Routes - Command-line tool for generating Swagger documentation.
//!
//! This binary loads route table manifests (YAML or JSON) and assembles them into a
//! Swagger 2.0 document.
//!
//! # Usage
//!
//! ```bash
//! swagger-from-routes [OPTIONS] <PATH>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation:
//! ```bash
//! swagger-from-routes ./routes -o swagger.yaml
//! ```
//!
//! Generate JSON documentation with a custom title:
//! ```bash
//! swagger-from-routes ./routes/api.yaml -f json --title "Shop API" -o swagger.json
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! swagger-from-routes ./routes -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use swagger_from_routes::cli;

fn main() -> Result<()> {
    // Parse once to read the verbose flag before the logger exists
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("Swagger From Routes starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;
    cli::run(args)?;

    info!("Swagger document generation completed successfully");

    Ok(())
}
