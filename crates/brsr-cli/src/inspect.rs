//! # Registry Inspection Subcommands
//!
//! `brsr keys`, `brsr skeleton` and `brsr check` read the schema registry
//! without touching any extraction data. `keys` is the list handed to the
//! extraction prompt; `skeleton` prints the mapping itself.

use std::io::Write;

use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;

use brsr_core::LeafKind;

use crate::{select_scope, write_json_output, Context};

/// Arguments for the `brsr keys` subcommand.
#[derive(Args, Debug)]
pub struct KeysArgs {
    /// List only this top-level section.
    #[arg(long, conflicts_with = "principle")]
    pub section: Option<String>,

    /// List only this Section C principle.
    #[arg(long, allow_negative_numbers = true)]
    pub principle: Option<i64>,

    /// List only array-valued keys.
    #[arg(long)]
    pub arrays_only: bool,

    /// Print the nested position and leaf kind next to each key.
    #[arg(long)]
    pub paths: bool,
}

/// Execute the keys subcommand.
pub fn run_keys(args: &KeysArgs, ctx: &Context) -> Result<u8> {
    let registry = ctx.registry();
    let scope = select_scope(registry, args.section.as_deref(), args.principle);

    let mut stdout = std::io::stdout().lock();
    for (_, leaf) in scope.leaves() {
        if args.arrays_only && leaf.kind != LeafKind::Array {
            continue;
        }
        if args.paths {
            let position = registry
                .position_of(&leaf.flat_key)
                .map(ToString::to_string)
                .unwrap_or_default();
            writeln!(stdout, "{}\t{}\t{}", leaf.flat_key, position, leaf.kind)?;
        } else {
            writeln!(stdout, "{}", leaf.flat_key)?;
        }
    }
    stdout.flush()?;
    Ok(0)
}

/// Arguments for the `brsr skeleton` subcommand.
#[derive(Args, Debug)]
pub struct SkeletonArgs {
    /// Dotted path to a subtree, e.g. `sectionA.employees`. Fails if absent.
    #[arg(long, conflicts_with_all = ["section", "principle"])]
    pub path: Option<String>,

    /// A top-level section. Prints `{}` if absent.
    #[arg(long, conflicts_with = "principle")]
    pub section: Option<String>,

    /// A Section C principle. Prints `{}` if absent.
    #[arg(long, allow_negative_numbers = true)]
    pub principle: Option<i64>,

    /// Emit compact JSON.
    #[arg(long)]
    pub compact: bool,
}

/// Execute the skeleton subcommand.
pub fn run_skeleton(args: &SkeletonArgs, ctx: &Context) -> Result<u8> {
    let registry = ctx.registry();
    let node = match &args.path {
        Some(dotted) => registry
            .lookup_dotted(dotted)
            .with_context(|| format!("cannot print skeleton at '{dotted}'"))?,
        None => select_scope(registry, args.section.as_deref(), args.principle),
    };
    write_json_output(&node.to_skeleton(), None, args.compact)?;
    Ok(0)
}

/// Arguments for the `brsr check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Print the statistics as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Registry statistics printed by `brsr check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Total leaves.
    pub leaves: usize,
    /// Array leaves.
    pub array_leaves: usize,
    /// Leaf count per top-level section, in declaration order.
    pub sections: Vec<SectionStats>,
}

/// Leaf count of one top-level section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionStats {
    /// Section name.
    pub name: String,
    /// Leaves in the section.
    pub leaves: usize,
}

impl RegistryStats {
    /// Collect statistics from a verified registry.
    pub fn collect(ctx: &Context) -> Self {
        let registry = ctx.registry();
        Self {
            leaves: registry.leaf_count(),
            array_leaves: registry.array_leaf_count(),
            sections: registry
                .section_names()
                .map(|name| SectionStats {
                    name: name.to_string(),
                    leaves: registry.section(name).leaf_count(),
                })
                .collect(),
        }
    }
}

/// Execute the check subcommand.
///
/// The registry was already verified when the context was built, so reaching
/// this point means it passed.
pub fn run_check(args: &CheckArgs, ctx: &Context) -> Result<u8> {
    let stats = RegistryStats::collect(ctx);
    if args.json {
        write_json_output(&stats, None, false)?;
        return Ok(0);
    }

    println!(
        "Registry OK: {} leaves ({} arrays), all flat keys unique",
        stats.leaves, stats.array_leaves
    );
    for section in &stats.sections {
        println!("  {}: {} leaves", section.name, section.leaves);
    }
    Ok(0)
}
