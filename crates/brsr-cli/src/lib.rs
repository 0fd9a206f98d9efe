//! # brsr-cli: CLI Tool for the BRSR Toolkit
//!
//! Provides the `brsr` command-line interface.
//!
//! ## Subcommands
//!
//! - `brsr transform`: flat extraction JSON to nested report JSON.
//! - `brsr flatten`: nested report JSON back to flat keys.
//! - `brsr keys`: list flat keys, optionally scoped to a section or principle.
//! - `brsr skeleton`: print the registry skeleton or a subtree of it.
//! - `brsr check`: verify the registry and print its statistics.
//!
//! ```bash
//! brsr transform extraction.json -o report.json
//! brsr transform extraction.json --principle 6 --null-missing
//! brsr keys --section sectionA --arrays-only
//! brsr --registry custom_skeleton.json check
//! ```

pub mod config;
pub mod inspect;
pub mod transform;

use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use serde::Serialize;

use brsr_core::{FlatStore, SchemaNode};
use brsr_schema::{SchemaRegistry, TransformOptions, Transformer};

/// Shared state handed to every subcommand.
#[derive(Debug, Clone)]
pub struct Context {
    /// Verified registry paired with the configured transform options.
    pub transformer: Transformer,
}

impl Context {
    /// Wrap a verified registry.
    pub fn new(registry: SchemaRegistry, options: TransformOptions) -> Self {
        Self {
            transformer: Transformer::new(Arc::new(registry), options),
        }
    }

    /// The verified registry.
    pub fn registry(&self) -> &SchemaRegistry {
        self.transformer.registry()
    }
}

/// Pick the schema subtree selected by `--section` / `--principle`.
///
/// Unknown names yield an empty object node, like the registry accessors.
pub fn select_scope<'r>(
    registry: &'r SchemaRegistry,
    section: Option<&str>,
    principle: Option<i64>,
) -> &'r SchemaNode {
    match (section, principle) {
        (_, Some(n)) => registry.principle(n),
        (Some(name), None) => registry.section(name),
        (None, None) => registry.root(),
    }
}

/// Read a JSON document from a file, or from stdin when the path is `-`.
pub fn read_json_input(path: &Path) -> Result<serde_json::Value> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// Read a flat extraction store from a file, or from stdin when the path is `-`.
pub fn read_flat_input(path: &Path) -> Result<FlatStore> {
    let store = if path == Path::new("-") {
        FlatStore::from_reader(std::io::stdin().lock())
    } else {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        FlatStore::from_reader(std::io::BufReader::new(file))
    };
    store.with_context(|| format!("{} is not a flat extraction document", path.display()))
}

/// Write a value as JSON to a file, or to stdout when no path is given.
pub fn write_json_output<T: Serialize>(value: &T, output: Option<&Path>, compact: bool) -> Result<()> {
    let mut text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    text.push('\n');

    match output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scope_selection_prefers_principle() {
        let registry = SchemaRegistry::builtin().unwrap();
        assert_eq!(select_scope(&registry, None, None).leaf_count(), 998);
        assert_eq!(select_scope(&registry, Some("sectionB"), None).leaf_count(), 31);
        assert_eq!(select_scope(&registry, None, Some(7)).leaf_count(), 4);
        assert!(select_scope(&registry, Some("sectionQ"), None).is_empty());
    }

    #[test]
    fn json_file_io() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json_output(&json!({"a": [1, 2]}), Some(&path), true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"a\":[1,2]}\n");
        assert_eq!(read_json_input(&path).unwrap(), json!({"a": [1, 2]}));

        std::fs::write(&path, "{broken").unwrap();
        let err = read_json_input(&path).unwrap_err();
        assert!(format!("{err:#}").contains("invalid JSON"));
    }

    #[test]
    fn flat_input_must_be_an_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.json");
        std::fs::write(&path, r#"{"sectiona_cin": "L1"}"#).unwrap();
        assert_eq!(read_flat_input(&path).unwrap().len(), 1);

        std::fs::write(&path, "42").unwrap();
        let err = read_flat_input(&path).unwrap_err();
        assert!(format!("{err:#}").contains("flat store error"));
        assert!(read_flat_input(&dir.path().join("missing.json")).is_err());
    }
}
