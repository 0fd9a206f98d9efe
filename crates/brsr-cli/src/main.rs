//! # brsr CLI entry point
//!
//! Parses command-line arguments, loads and verifies the schema registry,
//! and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use brsr_cli::config::{CliConfig, RegistrySource, REGISTRY_ENV};
use brsr_cli::inspect::{run_check, run_keys, run_skeleton, CheckArgs, KeysArgs, SkeletonArgs};
use brsr_cli::transform::{run_flatten, run_transform, FlattenArgs, TransformArgs};
use brsr_cli::Context;

/// BRSR toolkit CLI
///
/// Maps flat extraction output onto the nested Business Responsibility and
/// Sustainability Report document, and inspects the schema registry that
/// defines that mapping.
#[derive(Parser, Debug)]
#[command(name = "brsr", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skeleton JSON file to use instead of the embedded BRSR registry.
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the nested report from a flat extraction file.
    Transform(TransformArgs),

    /// Map a nested report back to flat keys.
    Flatten(FlattenArgs),

    /// List the flat keys the registry sources values from.
    Keys(KeysArgs),

    /// Print the skeleton, or part of it.
    Skeleton(SkeletonArgs),

    /// Verify the registry and print its statistics.
    Check(CheckArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level. Logs go to stderr so
    // stdout carries only the document.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = CliConfig::resolve(cli.config.as_deref())?;

    let source = RegistrySource::resolve(
        cli.registry.as_deref(),
        std::env::var_os(REGISTRY_ENV).map(PathBuf::from),
        &config,
    );
    tracing::debug!(source = %source, "resolved schema registry source");

    // A registry that fails verification stops the process here, before
    // any document is read.
    let registry = source
        .load()
        .with_context(|| format!("failed to load schema registry from {source}"))?;

    let ctx = Context::new(registry, config.transform);

    match cli.command {
        Commands::Transform(args) => run_transform(&args, &ctx),
        Commands::Flatten(args) => run_flatten(&args, &ctx),
        Commands::Keys(args) => run_keys(&args, &ctx),
        Commands::Skeleton(args) => run_skeleton(&args, &ctx),
        Commands::Check(args) => run_check(&args, &ctx),
    }
}
