//! # Transform and Flatten Subcommands
//!
//! `brsr transform` reads the extractor's flat JSON and writes the nested
//! report. It never fails on the contents of the flat store: missing keys
//! are defaulted, unknown keys are ignored, and scalars at array positions
//! are wrapped. It fails only if the input is not a JSON object.
//!
//! `brsr flatten` goes the other way.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use brsr_schema::{flatten, transform_with_report, MissingScalar, TransformOptions};

use crate::{read_flat_input, read_json_input, select_scope, write_json_output, Context};

/// Arguments for the `brsr transform` subcommand.
#[derive(Args, Debug)]
pub struct TransformArgs {
    /// Flat extraction JSON file, or `-` for stdin.
    #[arg(value_name = "FLAT_JSON")]
    pub input: PathBuf,

    /// Write the nested document here instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Emit compact JSON.
    #[arg(long)]
    pub compact: bool,

    /// Use `null` instead of `""` for missing scalar fields.
    #[arg(long)]
    pub null_missing: bool,

    /// Build only this top-level section.
    #[arg(long, conflicts_with = "principle")]
    pub section: Option<String>,

    /// Build only this Section C principle.
    #[arg(long, allow_negative_numbers = true)]
    pub principle: Option<i64>,
}

/// Execute the transform subcommand.
///
/// Returns exit code 0 on success.
pub fn run_transform(args: &TransformArgs, ctx: &Context) -> Result<u8> {
    let flat = read_flat_input(&args.input)?;

    let mut options: TransformOptions = *ctx.transformer.options();
    if args.null_missing {
        options.missing_scalar = MissingScalar::Null;
    }

    let scope = select_scope(ctx.registry(), args.section.as_deref(), args.principle);
    if scope.is_empty() {
        tracing::warn!(
            section = ?args.section,
            principle = ?args.principle,
            "selected scope does not exist in the registry; output is an empty object"
        );
    }

    let (document, report) = transform_with_report(scope, &flat, &options);

    let ignored = flat
        .keys()
        .filter(|key| !ctx.registry().contains_flat_key(key))
        .count();
    tracing::info!(
        leaves = report.leaves,
        filled = report.filled,
        defaulted = report.defaulted,
        normalized = report.normalized,
        coverage = %format!("{:.1}%", report.coverage() * 100.0),
        "transformed flat extraction"
    );
    tracing::debug!(ignored, "flat keys outside the registry");

    write_json_output(&document, args.output.as_deref(), args.compact)?;
    Ok(0)
}

/// Arguments for the `brsr flatten` subcommand.
#[derive(Args, Debug)]
pub struct FlattenArgs {
    /// Nested report JSON file, or `-` for stdin.
    #[arg(value_name = "NESTED_JSON")]
    pub input: PathBuf,

    /// Write the flat store here instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Emit compact JSON.
    #[arg(long)]
    pub compact: bool,
}

/// Execute the flatten subcommand.
///
/// Returns exit code 0 on success.
pub fn run_flatten(args: &FlattenArgs, ctx: &Context) -> Result<u8> {
    let document = read_json_input(&args.input)?;
    let flat = flatten(ctx.registry().root(), &document);

    tracing::info!(
        entries = flat.len(),
        leaves = ctx.registry().leaf_count(),
        "flattened nested report"
    );

    write_json_output(&flat, args.output.as_deref(), args.compact)?;
    Ok(0)
}
