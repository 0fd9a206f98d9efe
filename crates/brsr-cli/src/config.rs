//! # CLI Configuration
//!
//! Optional YAML file selected with `--config`:
//!
//! ```yaml
//! registry: path/to/skeleton.json
//! transform:
//!   missing_scalar: "null"  # or empty_string (default)
//! ```
//!
//! Registry source precedence: `--registry` flag, then the `BRSR_REGISTRY`
//! environment variable, then the config file, then the embedded skeleton.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use brsr_schema::{SchemaRegistry, TransformOptions};

/// Environment variable naming an external skeleton file.
pub const REGISTRY_ENV: &str = "BRSR_REGISTRY";

/// Contents of the YAML configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// External skeleton file. Relative paths resolve against the config
    /// file's directory.
    pub registry: Option<PathBuf>,
    /// Transformer policy.
    pub transform: TransformOptions,
}

impl CliConfig {
    /// Parse a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: CliConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;

        if let Some(registry) = config.registry.take() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.registry = Some(if registry.is_absolute() {
                registry
            } else {
                base.join(registry)
            });
        }

        tracing::debug!(path = %path.display(), ?config, "loaded configuration");
        Ok(config)
    }

    /// Load the file if one was given, otherwise use defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Where the schema registry comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    /// The skeleton embedded in `brsr-schema`.
    Builtin,
    /// A skeleton JSON file.
    File(PathBuf),
}

impl RegistrySource {
    /// Apply flag > environment > config precedence.
    pub fn resolve(flag: Option<&Path>, env: Option<PathBuf>, config: &CliConfig) -> Self {
        flag.map(Path::to_path_buf)
            .or(env)
            .or_else(|| config.registry.clone())
            .map_or(Self::Builtin, Self::File)
    }

    /// Build and verify the registry.
    pub fn load(&self) -> Result<SchemaRegistry> {
        let registry = match self {
            Self::Builtin => SchemaRegistry::builtin()?,
            Self::File(path) => SchemaRegistry::load(path)?,
        };
        tracing::info!(
            source = %self,
            leaves = registry.leaf_count(),
            array_leaves = registry.array_leaf_count(),
            "schema registry ready"
        );
        Ok(registry)
    }
}

impl fmt::Display for RegistrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => f.write_str("built-in BRSR skeleton"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}
