use super::types::DaoAssembly;
use anyhow::Context;
use std::path::Path;

/// Serialization format of an assembly description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyFormat {
    Yaml,
    Json,
}

impl AssemblyFormat {
    /// `.yaml`/`.yml` are YAML; everything else is treated as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => AssemblyFormat::Yaml,
            _ => AssemblyFormat::Json,
        }
    }
}

/// Parse an assembly description from a string.
pub fn parse_assembly(content: &str, format: AssemblyFormat) -> anyhow::Result<DaoAssembly> {
    let assembly = match format {
        AssemblyFormat::Yaml => serde_yaml::from_str(content)?,
        AssemblyFormat::Json => serde_json::from_str(content)?,
    };
    Ok(assembly)
}

/// Load a DAO assembly description from a YAML or JSON file.
///
/// An assembly without a `name` is named after the file stem.
pub fn load_assembly(path: &Path) -> anyhow::Result<DaoAssembly> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read assembly description: {}", path.display()))?;
    let mut assembly = parse_assembly(&content, AssemblyFormat::from_path(path))
        .with_context(|| format!("Failed to parse assembly description: {}", path.display()))?;
    if assembly.name.is_empty() {
        assembly.name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    tracing::debug!(
        assembly = %assembly.name,
        types = assembly.types.len(),
        "loaded assembly description"
    );
    Ok(assembly)
}
