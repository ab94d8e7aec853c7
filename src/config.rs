//! Generator configuration
//!
//! Settings come from an optional `dtogen.toml` that sits alongside the assembly
//! description, with environment overrides applied on top:
//!
//! - `DTOGEN_DATA_ROOT` - process data root holding scratch directories and artifacts
//! - `DTOGEN_RUSTC_BIN` - compiler binary used by [`crate::generator::RustcCompiler`]
//!
//! ```toml
//! data_root = "/var/lib/dtogen"
//! artifact_extension = "rlib"
//! derives = ["Debug", "Clone", "PartialEq"]
//!
//! [type_map]
//! decimal = "rust_decimal::Decimal"
//! guid = "uuid::Uuid"
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the config file auto-detected next to an assembly description.
pub const CONFIG_FILE_NAME: &str = "dtogen.toml";

/// Settings shared by the shape extractor and artifact generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Process data root; scratch directories live at `<data_root>/DtoTemp_<connection>`
    pub data_root: PathBuf,
    /// Extension of compiled artifacts (`rlib`)
    pub artifact_extension: String,
    /// Rust edition passed to the compiler
    pub edition: String,
    /// Derives emitted on every generated struct
    pub derives: Vec<String>,
    /// Compiler binary
    pub rustc: String,
    /// Declared type name (case-insensitive) → Rust type path overrides
    pub type_map: BTreeMap<String, String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            data_root: std::env::temp_dir().join("dtogen"),
            artifact_extension: "rlib".to_string(),
            edition: "2021".to_string(),
            derives: vec![
                "Debug".to_string(),
                "Clone".to_string(),
                "PartialEq".to_string(),
            ],
            rustc: "rustc".to_string(),
            type_map: BTreeMap::new(),
        }
    }
}

impl GeneratorConfig {
    /// Defaults rooted at `data_root`.
    pub fn with_data_root(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            ..Self::default()
        }
    }

    /// Scratch directory for a connection: `<data_root>/DtoTemp_<connection>`.
    pub fn scratch_dir(&self, connection: &str) -> PathBuf {
        let connection = connection.replace(['/', '\\'], "_");
        self.data_root.join(format!("DtoTemp_{connection}"))
    }

    /// Directory compiled artifacts and their descriptors are written to.
    pub fn artifact_dir(&self) -> PathBuf {
        self.data_root.join("artifacts")
    }

    /// Apply `DTOGEN_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(root) = std::env::var("DTOGEN_DATA_ROOT") {
            if !root.is_empty() {
                self.data_root = PathBuf::from(root);
            }
        }
        if let Ok(bin) = std::env::var("DTOGEN_RUSTC_BIN") {
            if !bin.is_empty() {
                self.rustc = bin;
            }
        }
        self
    }

    /// Resolve configuration for an assembly file.
    ///
    /// Priority:
    /// 1. Explicitly provided path (via CLI)
    /// 2. `dtogen.toml` alongside the assembly description
    /// 3. Defaults
    ///
    /// Environment overrides are applied last in every case.
    pub fn resolve(explicit_path: Option<&Path>, assembly_path: &Path) -> anyhow::Result<Self> {
        let config = match resolve_config_path(explicit_path, assembly_path) {
            Some(path) => load_config(&path)?.unwrap_or_default(),
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }
}

/// Load a generator config from a TOML file
///
/// Returns `Ok(None)` if the file doesn't exist (not an error) and `Err` if it
/// exists but fails to parse.
pub fn load_config(config_path: &Path) -> anyhow::Result<Option<GeneratorConfig>> {
    if !config_path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read generator config: {}", config_path.display()))?;

    let config: GeneratorConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse generator config: {}", config_path.display()))?;

    Ok(Some(config))
}

/// Look for `dtogen.toml` in the same directory as the assembly description.
pub fn auto_detect_config_path(assembly_path: &Path) -> Option<PathBuf> {
    let dir = assembly_path.parent()?;
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Explicit path if it exists, otherwise the auto-detected one.
pub fn resolve_config_path(explicit_path: Option<&Path>, assembly_path: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        tracing::warn!(path = %path.display(), "config file not found, falling back to auto-detection");
    }

    auto_detect_config_path(assembly_path)
}
