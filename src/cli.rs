use crate::composer;
use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::controller::{ControllerCollector, CONTROLLER_EXTENSIONS};
use crate::linker;
use crate::postprocess;
use crate::registry::{SchemaRegistry, FRAGMENT_EXTENSIONS};
use crate::scanner::FileScanner;
use crate::serializer::{self, OutputFormat};
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn, LevelFilter};
use std::path::{Path, PathBuf};

/// OpenAPI Assembler - Build an OpenAPI document from schema fragments, annotated controllers and code samples
#[derive(Parser, Debug)]
#[command(name = "openapi-assembler")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config_path: PathBuf,

    /// Output file path (overrides `out` from the configuration)
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Output format (overrides `format` from the configuration)
    #[arg(short = 'f', long = "format", value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Counts gathered over one run, logged at the end of it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub schema_files: usize,
    pub controller_files: usize,
    pub schemas: usize,
    pub controllers: usize,
    pub operations: usize,
    pub linked_params: usize,
    pub unresolved_params: usize,
    pub code_samples: usize,
    pub out: PathBuf,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.config_path.exists() {
        anyhow::bail!(
            "Configuration file does not exist: {}",
            args.config_path.display()
        );
    }

    if !args.config_path.is_file() {
        anyhow::bail!(
            "Configuration path is not a file: {}",
            args.config_path.display()
        );
    }

    info!("Configuration: {}", args.config_path.display());
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    }
    if let Some(ref format) = args.output_format {
        info!("Output format: {:?}", format);
    }

    Ok(args)
}

/// Logger for the binary: Info by default, `RUST_LOG` directives on top of
/// that, and `-v` raising the global level to Debug regardless of either.
pub fn logger(verbose: bool, rust_log: Option<&str>) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Info);
    if let Some(filters) = rust_log {
        builder.parse_filters(filters);
    }
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    let mut config = Config::load(&args.config_path)
        .with_context(|| format!("Failed to load configuration: {}", args.config_path.display()))?;
    if let Some(out) = args.output_path {
        config.out = out;
    }
    if let Some(format) = args.output_format {
        config.format = format;
    }

    let root = std::env::current_dir().context("Failed to determine the working directory")?;
    let summary = generate(config, &root)?;

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Schema files: {}", summary.schema_files);
    info!("  - Controller files: {}", summary.controller_files);
    info!("  - Schemas: {}", summary.schemas);
    info!("  - Controllers: {}", summary.controllers);
    info!("  - Operations: {}", summary.operations);
    info!(
        "  - Annotated parameters: {} linked, {} unresolved",
        summary.linked_params, summary.unresolved_params
    );
    info!("  - Code samples: {}", summary.code_samples);
    info!("  - Output: {}", summary.out.display());

    Ok(())
}

/// Assembles the document described by `config` and writes it.
///
/// Patterns and relative paths are resolved against `root`.
///
/// # Errors
///
/// Any discovery, loading, composition or write failure aborts the run; the
/// output file is only replaced once the whole document has been serialized.
pub fn generate(config: Config, root: &Path) -> Result<Summary> {
    let config = config.resolve_paths(root);
    let servers = config.servers()?;

    // Step 1: Discover schema fragments and controller sources
    info!("Discovering schema fragments...");
    let schema_files = FileScanner::new(root.to_path_buf())
        .with_extensions(FRAGMENT_EXTENSIONS)
        .discover(config.schemas.0.as_slice())
        .context("Schema discovery failed")?;
    info!("Found {} schema files", schema_files.len());

    info!("Discovering controllers...");
    let controller_files = FileScanner::new(root.to_path_buf())
        .with_extensions(CONTROLLER_EXTENSIONS)
        .discover(config.controllers.0.as_slice())
        .context("Controller discovery failed")?;
    info!("Found {} controller files", controller_files.len());
    if controller_files.is_empty() {
        warn!("No controller files matched {:?}", config.controllers.0);
    }

    // Step 2: Build the schema registry
    info!("Building schema registry...");
    let registry = SchemaRegistry::build(&schema_files, &config.base_registry())
        .context("Failed to build schema registry")?;
    info!("Registered {} schemas", registry.len());

    // Step 3: Collect controllers
    info!("Collecting controllers...");
    let mut set = ControllerCollector::collect(&controller_files).context("Failed to collect controllers")?;

    // Step 4: Link annotated parameters to registry schemas
    info!("Linking parameter schemas...");
    let report = linker::link(&mut set.metadata, &registry);
    for key in &report.unresolved {
        debug!(
            "No schema matches the annotation on {} method {} parameter {}",
            key.controller, key.method, key.index
        );
    }

    // Step 5: Compose the document
    info!("Composing OpenAPI document...");
    let mut document = composer::compose(&set.controllers, &set.metadata, &registry, &config.static_overlay)?;

    // Step 6: Post-process
    let code_samples = match &config.samples {
        Some(samples) => {
            info!("Attaching code samples from {}...", samples.dir.display());
            postprocess::attach_code_samples(&mut document, samples)?
        }
        None => 0,
    };
    let updated = postprocess::inject_servers(&mut document, &servers);
    if updated > 0 {
        info!("Injected {} servers into {} operations", servers.len(), updated);
    }

    // Step 7: Serialize and write
    info!("Serializing to {:?} format...", config.format);
    let content = serializer::serialize(&document, config.format)?;

    info!("Writing output to: {}", config.out.display());
    serializer::write_to_file(&content, &config.out)?;
    info!("Successfully wrote OpenAPI document to {}", config.out.display());

    Ok(Summary {
        schema_files: schema_files.len(),
        controller_files: controller_files.len(),
        schemas: registry.len(),
        controllers: set.controllers.len(),
        operations: document.operations().count(),
        linked_params: report.linked.len(),
        unresolved_params: report.unresolved.len(),
        code_samples,
        out: config.out,
    })
}
