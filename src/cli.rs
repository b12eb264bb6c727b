use crate::booter::{boot, InMemoryRouter};
use crate::config::DocsConfig;
use crate::error::Error;
use crate::facts::HttpMethod;
use crate::manifest::load_manifests;
use crate::scanner::ManifestScanner;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Swagger Synth - build Swagger 2.0 documents from controller and model manifests
#[derive(Parser, Debug)]
#[command(name = "swagger-synth")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Manifest file, or a directory scanned for manifest files
    #[arg(value_name = "MANIFEST_PATH")]
    pub manifest_path: PathBuf,

    /// Documentation settings file (YAML or JSON)
    #[arg(short = 'c', long = "config", value_name = "CONFIG")]
    pub config_path: Option<PathBuf>,

    /// Output format (json or yaml)
    #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Also write the Swagger UI page to this file
    #[arg(long = "ui", value_name = "FILE")]
    pub ui_path: Option<PathBuf>,

    /// Host the API is served from
    #[arg(long = "host")]
    pub host: Option<String>,

    /// API title
    #[arg(long = "title")]
    pub title: Option<String>,

    /// API version
    #[arg(long = "api-version")]
    pub api_version: Option<String>,

    /// API description
    #[arg(long = "description")]
    pub description: Option<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.manifest_path.exists() {
        return Err(Error::InvalidArgument(format!(
            "Manifest path does not exist: {}",
            args.manifest_path.display()
        ))
        .into());
    }
    if let Some(config) = &args.config_path {
        if !config.is_file() {
            return Err(Error::InvalidArgument(format!(
                "Config file does not exist: {}",
                config.display()
            ))
            .into());
        }
    }

    info!("Manifest path: {}", args.manifest_path.display());
    info!("Output format: {:?}", args.output_format);
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }

    Ok(args)
}

/// Settings for this run: the config file, or an enabled default, with the
/// command line flags applied on top
fn resolve_config(args: &CliArgs) -> Result<DocsConfig> {
    let mut config = match &args.config_path {
        Some(path) => DocsConfig::load(path)?,
        None => DocsConfig::enabled(),
    };
    config.override_with(
        args.host.clone(),
        args.title.clone(),
        args.api_version.clone(),
        args.description.clone(),
    );
    Ok(config)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting Swagger document generation...");

    let scan_result = ManifestScanner::new(args.manifest_path.clone()).scan()?;
    info!("Found {} manifest files", scan_result.manifest_files.len());
    if scan_result.manifest_files.is_empty() {
        anyhow::bail!("No manifest files found in {}", args.manifest_path.display());
    }

    let loaded = load_manifests(&scan_result.manifest_files)?;
    if loaded.controllers.is_empty() {
        warn!("No controllers declared in the manifests");
    }

    let config = resolve_config(&args)?;
    let controllers: Vec<&str> = loaded.controllers.iter().map(String::as_str).collect();
    let mut router = InMemoryRouter::new();
    let Some(document) = boot(&config, &loaded.store, &controllers, &mut router)? else {
        warn!("Documentation is disabled in the config, nothing to write");
        return Ok(());
    };

    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };
    match &args.output_path {
        Some(output_path) => {
            write_to_file(&content, output_path)?;
            info!("Wrote Swagger document to {}", output_path.display());
        }
        None => println!("{}", content),
    }

    if let Some(ui_path) = &args.ui_path {
        let page = router
            .dispatch(HttpMethod::Get, &config.index_page)
            .context("Swagger UI route was not mounted")?;
        write_to_file(&page.body, ui_path)?;
        info!("Wrote Swagger UI page to {}", ui_path.display());
    }

    info!("Generation complete!");
    info!("  - Manifest files: {}", scan_result.manifest_files.len());
    info!("  - Controllers: {}", loaded.controllers.len());
    info!("  - Paths: {}", document.paths.len());
    info!("  - Definitions: {}", document.definitions.len());

    Ok(())
}
