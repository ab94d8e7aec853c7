use crate::error::{GeneratorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Identifies a compiled DTO artifact and the schema it was generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    /// `_{namespace}_{fingerprint}_.{ext}`
    pub file_name: String,
    /// Namespace the DTOs were generated into
    pub namespace: String,
    /// SHA-256 over the canonical table type names
    pub fingerprint: String,
    /// Canonical table type names that were hashed
    pub table_types: Vec<String>,
    /// Where the compiler wrote the artifact
    pub artifact_path: PathBuf,
    /// Scratch directory the source was emitted into
    pub source_dir: PathBuf,
    /// Non-fatal compiler output
    #[serde(default)]
    pub diagnostics: Vec<String>,
}

/// Persists descriptors after generation and looks them up for reuse.
pub trait ArtifactRegistry: Send + Sync {
    fn save(&self, descriptor: &ArtifactDescriptor) -> Result<()>;

    fn find(&self, file_name: &str) -> Result<Option<ArtifactDescriptor>>;
}

/// Stores each descriptor as `<file_name>.json` in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileRegistry {
    dir: PathBuf,
}

impl JsonFileRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, file_name: &str) -> PathBuf {
        self.dir.join(format!("{file_name}.json"))
    }
}

impl ArtifactRegistry for JsonFileRegistry {
    fn save(&self, descriptor: &ArtifactDescriptor) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| GeneratorError::io(&self.dir, e))?;
        let path = self.path_for(&descriptor.file_name);
        let json = serde_json::to_string_pretty(descriptor)
            .map_err(|e| GeneratorError::Registry(e.to_string()))?;
        std::fs::write(&path, json).map_err(|e| GeneratorError::io(&path, e))?;
        tracing::info!(descriptor = %path.display(), "saved artifact descriptor");
        Ok(())
    }

    fn find(&self, file_name: &str) -> Result<Option<ArtifactDescriptor>> {
        let path = self.path_for(file_name);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| GeneratorError::io(&path, e))?;
        let descriptor = serde_json::from_str(&contents).map_err(|e| {
            GeneratorError::Registry(format!("corrupt descriptor {}: {e}", path.display()))
        })?;
        Ok(Some(descriptor))
    }
}

/// Process-local registry; nothing survives the process.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    entries: Mutex<BTreeMap<String, ArtifactDescriptor>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactRegistry for InMemoryRegistry {
    fn save(&self, descriptor: &ArtifactDescriptor) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| GeneratorError::Registry("registry lock poisoned".to_string()))?;
        entries.insert(descriptor.file_name.clone(), descriptor.clone());
        Ok(())
    }

    fn find(&self, file_name: &str) -> Result<Option<ArtifactDescriptor>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| GeneratorError::Registry("registry lock poisoned".to_string()))?;
        Ok(entries.get(file_name).cloned())
    }
}
