//! # Generator Module
//!
//! Derives plain DTO structs from the table types of a DAO assembly, compiles
//! them into an artifact, and records where that artifact came from.
//!
//! ## Architecture
//!
//! ```text
//! DaoAssembly → ShapeExtractor → DtoUnitTemplate → scratch dir → Compiler → ArtifactRegistry
//! ```
//!
//! 1. **Shape extraction** - [`ShapeExtractor`] turns each table type (or a
//!    property list, or example values) into a [`GeneratedShape`]
//! 2. **Template rendering** - the shapes are rendered with Askama into one
//!    `lib.rs` inside `<data_root>/DtoTemp_<connection>`
//! 3. **Compilation** - a [`Compiler`] (by default `rustc`) builds the artifact
//! 4. **Provenance** - an [`ArtifactDescriptor`] is saved to the
//!    [`ArtifactRegistry`]
//!
//! ## Artifact identity
//!
//! The artifact name is `_{namespace}_{fingerprint}_.{ext}`. The fingerprint
//! only depends on the set of table type names (see [`naming`]), so
//! regenerating an unchanged schema yields the same name and
//! [`DtoGenerator::generate_or_reuse`] can skip the compiler entirely.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dtogen::{assembly::load_assembly, config::GeneratorConfig, generator::DtoGenerator};
//!
//! let assembly = load_assembly("billing.yaml".as_ref())?;
//! let generator = DtoGenerator::new(assembly, GeneratorConfig::default());
//! let descriptor = generator.generate_default()?;
//! println!("{}", descriptor.artifact_path.display());
//! ```
//!
//! ## Generated source
//!
//! For a `Customer` table with `Id: int` and `Total: decimal?`:
//!
//! ```text
//! /// DTO for `Customer`.
//! #[derive(Debug, Clone, PartialEq)]
//! pub struct Customer {
//!     pub Id: i32,
//!     pub Total: f64,
//! }
//! ```

mod artifact;
mod compiler;
pub mod naming;
mod registry;
mod shape;
mod templates;
#[cfg(test)]
mod tests;

pub use artifact::*;
pub use compiler::*;
pub use naming::compute_default_artifact_name;
pub use registry::*;
pub use shape::*;
pub use templates::*;
