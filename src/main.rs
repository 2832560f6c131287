//! sbom-graph: `CycloneDX` component and dependency graph assembly
//!
//! Scans project directories with per-ecosystem extractors and assembles a
//! single de-duplicated, filtered `CycloneDX` document.

#![allow(clippy::needless_pass_by_value)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use sbom_graph::{
    cli,
    config::{AppConfig, AssemblyConfig, ExecutionConfig, FilterConfig, OutputConfig, ProjectConfig},
    model::SpecVersion,
    pipeline::exit_codes,
};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build long version string with format support info
const fn build_long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\n\nOutput Formats:",
        "\n  CycloneDX JSON 1.4, 1.5, 1.6, 1.7",
        "\n\nPresets:",
        "\n  default, required-only, high-confidence, ci"
    )
}

#[derive(Parser)]
#[command(name = "sbom-graph")]
#[command(version, long_version = build_long_version())]
#[command(about = "Assemble CycloneDX component and dependency graphs", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Document written
    1  Document written, components filtered and --fail-on-partial set
    3  Error occurred

EXAMPLES:
    # Scan the current directory
    sbom-graph generate

    # Polyglot repository, production dependencies only
    sbom-graph generate services/web services/api --required-only -O bom.json

    # Re-filter an existing document
    sbom-graph filter bom.json --only org.acme --spec-version 1.5

    # Combine documents produced elsewhere
    sbom-graph merge web.cdx.json api.cdx.json -O combined.json")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Named configuration preset (default, required-only, high-confidence, ci)
    #[arg(long, global = true)]
    preset: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

// ============================================================================
// Command argument structs
// ============================================================================

/// Filter options shared by every document-producing command
#[derive(Args, Default)]
struct FilterArgs {
    /// Drop components whose purl identity confidence is below this value
    #[arg(long)]
    min_confidence: Option<f64>,

    /// Allowed identity techniques (repeatable; `auto` disables the check)
    #[arg(long = "technique")]
    techniques: Vec<String>,

    /// Keep only components with required scope
    #[arg(long)]
    required_only: bool,

    /// Keep only components whose purl contains all of these strings
    #[arg(long)]
    only: Vec<String>,

    /// Drop components whose purl or properties contain any of these strings
    #[arg(long)]
    filter: Vec<String>,

    /// Do not record an incomplete composition when components are filtered
    #[arg(long)]
    no_auto_compositions: bool,
}

/// Output options shared by every document-producing command
#[derive(Args, Default)]
struct OutputArgs {
    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,

    /// CycloneDX spec version of the written document
    #[arg(long)]
    spec_version: Option<SpecVersion>,

    /// Write compact JSON
    #[arg(long)]
    compact: bool,

    /// Exit with code 1 if the filter removed any component
    #[arg(long)]
    fail_on_partial: bool,
}

/// Arguments for the `generate` subcommand
#[derive(Args)]
struct GenerateArgs {
    /// Paths to scan (defaults to the current directory)
    paths: Vec<PathBuf>,

    /// Root component name
    #[arg(long)]
    project_name: Option<String>,

    /// Root component version
    #[arg(long)]
    project_version: Option<String>,

    /// Root component group
    #[arg(long)]
    project_group: Option<String>,

    /// Project types to scan (repeatable)
    #[arg(short = 't', long = "type")]
    project_types: Vec<String>,

    /// Project types to skip (repeatable)
    #[arg(long = "exclude-type")]
    exclude_types: Vec<String>,

    /// Abort when any extractor fails
    #[arg(long)]
    fail_on_error: bool,

    /// Scan paths one after another
    #[arg(long)]
    sequential: bool,

    /// Collect cryptographic assets (CycloneDX 1.6 or later)
    #[arg(long)]
    include_crypto: bool,

    /// Directory that SrcFile paths are made relative to
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Timeout for each external command, in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Write the scan report (commands, warnings) as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,

    #[command(flatten)]
    filter: FilterArgs,

    #[command(flatten)]
    output: OutputArgs,
}

/// Arguments for the `filter` subcommand
#[derive(Args)]
struct FilterCommandArgs {
    /// Document to filter
    input: PathBuf,

    /// Directory that SrcFile paths are made relative to
    #[arg(long)]
    base_dir: Option<PathBuf>,

    #[command(flatten)]
    filter: FilterArgs,

    #[command(flatten)]
    output: OutputArgs,
}

/// Arguments for the `merge` subcommand
#[derive(Args)]
struct MergeArgs {
    /// Documents to combine, first one provides the root
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    #[command(flatten)]
    filter: FilterArgs,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan project paths and generate a document
    Generate(GenerateArgs),

    /// Filter an existing document
    Filter(FilterCommandArgs),

    /// Combine existing documents into one
    Merge(MergeArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate JSON Schema for the config file format
    ConfigSchema {
        /// Write schema to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Sub-subcommands for the `config` command
#[derive(Subcommand)]
enum ConfigAction {
    /// Print current effective configuration (merged from defaults + file)
    Show,
    /// Generate an example .sbom-graph.yaml in the current directory
    Init,
}

// ============================================================================
// CLI → configuration overrides
// ============================================================================

fn filter_overrides(args: FilterArgs) -> FilterConfig {
    let defaults = FilterConfig::default();
    FilterConfig {
        min_confidence: args.min_confidence.unwrap_or(defaults.min_confidence),
        technique: if args.techniques.is_empty() {
            defaults.technique
        } else {
            args.techniques
        },
        required_only: args.required_only,
        only: args.only,
        filter: args.filter,
        auto_compositions: !args.no_auto_compositions,
    }
}

fn output_overrides(args: &OutputArgs) -> OutputConfig {
    OutputConfig {
        file: args.output_file.clone(),
        pretty: !args.compact,
        fail_on_partial: args.fail_on_partial,
    }
}

fn document_overrides(
    filter: FilterArgs,
    output: OutputArgs,
    base_dir: Option<PathBuf>,
) -> AppConfig {
    AppConfig {
        assembly: AssemblyConfig {
            spec_version: output.spec_version.unwrap_or_default(),
            base_dir,
            ..AssemblyConfig::default()
        },
        filter: filter_overrides(filter),
        output: output_overrides(&output),
        ..AppConfig::default()
    }
}

fn generate_overrides(args: GenerateArgs) -> (Vec<PathBuf>, Option<PathBuf>, AppConfig) {
    let mut config = document_overrides(args.filter, args.output, args.base_dir);
    config.project = ProjectConfig {
        name: args.project_name,
        version: args.project_version,
        group: args.project_group,
        project_type: args.project_types,
        exclude_type: args.exclude_types,
        parent_component: None,
    };
    config.assembly.fail_on_error = args.fail_on_error;
    config.assembly.parallel_paths = !args.sequential;
    config.assembly.include_crypto = args.include_crypto;
    if let Some(secs) = args.timeout {
        config.execution = ExecutionConfig {
            timeout_secs: secs,
            ..ExecutionConfig::default()
        };
    }
    (args.paths, args.report, config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays a clean document
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let config_path = cli.config.as_deref();
    let preset = cli.preset.as_deref();
    let result = match cli.command {
        Commands::Generate(args) => {
            let (paths, report, overrides) = generate_overrides(args);
            cli::resolve_config(config_path, preset, &overrides)
                .and_then(|config| cli::run_generate(paths, &config, report, cli.quiet))
        }

        Commands::Filter(args) => {
            let input = args.input;
            let overrides = document_overrides(args.filter, args.output, args.base_dir);
            cli::resolve_config(config_path, preset, &overrides)
                .and_then(|config| cli::run_filter(&input, &config, cli.quiet))
        }

        Commands::Merge(args) => {
            let inputs = args.inputs;
            let overrides = document_overrides(args.filter, args.output, None);
            cli::resolve_config(config_path, preset, &overrides)
                .and_then(|config| cli::run_merge(inputs, &config, cli.quiet))
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "sbom-graph", &mut io::stdout());
            Ok(exit_codes::SUCCESS)
        }

        Commands::ConfigSchema { output } => {
            let schema = sbom_graph::config::generate_json_schema();
            match output {
                Some(path) => {
                    std::fs::write(&path, &schema)?;
                    eprintln!("Schema written to {}", path.display());
                }
                None => println!("{schema}"),
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let (config, loaded_from) = sbom_graph::config::load_or_default(config_path);
                match &loaded_from {
                    Some(path) => eprintln!("# Loaded from: {}", path.display()),
                    None => eprintln!("# No config file found; showing defaults"),
                }
                let yaml = serde_yaml::to_string(&config).context("failed to serialize config")?;
                print!("{yaml}");
                Ok(exit_codes::SUCCESS)
            }
            ConfigAction::Init => {
                let target = std::env::current_dir()
                    .context("cannot determine current directory")?
                    .join(".sbom-graph.yaml");
                if target.exists() {
                    anyhow::bail!(
                        "{} already exists. Remove it first to re-initialize.",
                        target.display()
                    );
                }
                std::fs::write(&target, sbom_graph::config::generate_example_config())
                    .with_context(|| format!("failed to write {}", target.display()))?;
                eprintln!("Wrote {}", target.display());
                Ok(exit_codes::SUCCESS)
            }
        },
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(exit_codes::ERROR);
        }
    }
}
