//! # dtogen
//!
//! **dtogen** derives plain data-transfer structs from the table types of a
//! DAO assembly, compiles them into a library artifact, and names that
//! artifact after a fingerprint of the schema it was built from.
//!
//! ## Overview
//!
//! The DTOs exist to back DAOs up into an object repository: each table type
//! becomes a struct with the same member names and member types, with
//! nullable wrappers removed. Generating twice from the same set of table
//! types yields the same artifact name, so an unchanged schema never needs a
//! second compile.
//!
//! ## Architecture
//!
//! - **[`assembly`]** - The DAO assembly model and its YAML/JSON loader
//! - **[`generator`]** - Shape extraction, source rendering, compilation and provenance
//! - **[`backup`]** - Associates a live database with a DTO-backed backup repository
//! - **[`config`]** - `dtogen.toml` loading and environment overrides
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`cli`]** - The `dtogen` command line
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dtogen::{DaoAssembly, DaoType, DtoGenerator, GeneratorConfig};
//!
//! let assembly = DaoAssembly::new(
//!     "Billing",
//!     vec![DaoType::new("Acme.Billing", "Customer")
//!         .as_table()
//!         .with_member("Id", "int")
//!         .with_member("Total", "decimal?")],
//! );
//! let generator = DtoGenerator::new(assembly, GeneratorConfig::with_data_root("/var/lib/dtogen"));
//! let descriptor = generator.generate_or_reuse()?;
//! println!("{}", descriptor.file_name);
//! ```

pub mod assembly;
pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;

pub use assembly::{load_assembly, DaoAssembly, DaoMember, DaoType, TypeRef};
pub use backup::{BackedUpDatabase, BackupRepository, DaoBackup, TrackedDatabase};
pub use config::GeneratorConfig;
pub use error::{GeneratorError, Result};
pub use generator::{compute_default_artifact_name, ArtifactDescriptor, DtoGenerator};
