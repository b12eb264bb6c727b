//! Swagger Synth - command-line tool for building Swagger 2.0 documents.
//!
//! Reads controller and model manifests, registers every declared controller
//! and writes the resulting document, optionally together with a Swagger UI
//! page that loads it.
//!
//! # Usage
//!
//! ```bash
//! swagger-synth [OPTIONS] <MANIFEST_PATH>
//! ```
//!
//! # Examples
//!
//! Generate JSON documentation from a directory of manifests:
//! ```bash
//! swagger-synth ./api -o swagger.json
//! ```
//!
//! Use a settings file and also write the viewer page:
//! ```bash
//! swagger-synth ./api -c docs.yaml -o public/docs/data.json --ui public/docs/index.html
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use swagger_synth::cli;

fn main() -> Result<()> {
    // Parse first so the verbose flag can pick the log level
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("Swagger Synth starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("Swagger document generation completed successfully");

    Ok(())
}
