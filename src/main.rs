//! OpenAPI Assembler - command-line tool producing an OpenAPI document.
//!
//! # Usage
//!
//! ```bash
//! openapi-assembler [OPTIONS]
//! ```
//!
//! # Examples
//!
//! Use `openapi-assembler.yaml` from the current directory:
//! ```bash
//! openapi-assembler
//! ```
//!
//! Write YAML somewhere else:
//! ```bash
//! openapi-assembler -c api/config.yaml -f yaml -o build/openapi.yaml
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! openapi-assembler -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_assembler::cli;

fn main() -> Result<()> {
    // Parse once to learn the verbosity before the logger exists
    let args_for_verbose = cli::CliArgs::parse();

    let rust_log = std::env::var("RUST_LOG").ok();
    cli::logger(args_for_verbose.verbose, rust_log.as_deref()).init();

    info!("OpenAPI Assembler starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
