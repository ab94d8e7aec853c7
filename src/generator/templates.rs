use askama::Template;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::compiler::SOURCE_ENTRY;
use super::shape::GeneratedShape;
use crate::error::{GeneratorError, Result};

/// Template data for the single emitted source unit (`lib.rs`)
#[derive(Template)]
#[template(path = "dtos.rs.txt", escape = "none")]
pub struct DtoUnitTemplate<'a> {
    /// Assembly the shapes were derived from
    pub assembly: &'a str,
    /// Target namespace, recorded in the header
    pub namespace: &'a str,
    /// Schema fingerprint, recorded in the header
    pub fingerprint: &'a str,
    /// Comma-separated derive list
    pub derives: String,
    /// Union of all shapes' imports, sorted
    pub imports: Vec<String>,
    /// Shapes in table declaration order
    pub shapes: &'a [GeneratedShape],
}

impl<'a> DtoUnitTemplate<'a> {
    pub fn new(
        assembly: &'a str,
        namespace: &'a str,
        fingerprint: &'a str,
        derives: &[String],
        shapes: &'a [GeneratedShape],
    ) -> Self {
        let imports: BTreeSet<String> = shapes
            .iter()
            .flat_map(|s| s.imports.iter().cloned())
            .collect();
        Self {
            assembly,
            namespace,
            fingerprint,
            derives: derives.join(", "),
            imports: imports.into_iter().collect(),
            shapes,
        }
    }
}

/// Render the unit and write it to `dir/lib.rs`.
///
/// # Errors
///
/// Returns an error if rendering or writing fails
pub fn write_dto_unit(dir: &Path, unit: &DtoUnitTemplate<'_>) -> Result<PathBuf> {
    let rendered = unit.render()?;
    let path = dir.join(SOURCE_ENTRY);
    fs::write(&path, rendered).map_err(|e| GeneratorError::io(&path, e))?;
    tracing::info!(path = %path.display(), shapes = unit.shapes.len(), "wrote DTO source");
    Ok(path)
}
