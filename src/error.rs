//! Error taxonomy for shape extraction and artifact generation.
//!
//! Every failure is surfaced to the immediate caller. The only local recovery
//! anywhere in the crate is the attempt to delete a stale scratch directory,
//! and even that failure is reported rather than ignored.

use std::path::PathBuf;

/// Result alias used by the generator and shape extractor.
pub type Result<T, E = GeneratorError> = std::result::Result<T, E>;

/// Failures raised while deriving shapes or producing an artifact.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// The source has no usable types or members.
    ///
    /// Caller error; retrying without different input gives the same result.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The assembly declares no types at all.
    #[error("assembly `{assembly}` has no types defined")]
    EmptyAssembly {
        /// Name of the offending assembly
        assembly: String,
    },

    /// A member's declared type could not be resolved to a nameable type.
    #[error("member `{member}` references unresolvable type `{type_name}`")]
    MissingReference {
        /// Member whose type failed to resolve
        member: String,
        /// Declared type text as written in the source
        type_name: String,
    },

    /// Deleting or creating the scratch directory failed.
    #[error("scratch directory {path:?} could not be prepared: {source}")]
    ScratchDirectory {
        /// Scratch directory that could not be deleted or created
        path: PathBuf,
        /// Underlying filesystem error
        #[source]
        source: std::io::Error,
    },

    /// `write_source` was pointed at a directory that already holds files.
    #[error("source directory {path:?} is not empty")]
    SourceDirectoryNotEmpty {
        /// Directory that was expected to be empty
        path: PathBuf,
    },

    /// The external compiler reported failure. Diagnostics are passed through verbatim.
    #[error("compilation of `{artifact}` failed:\n{diagnostics}")]
    Compilation {
        /// Artifact file name requested from the compiler
        artifact: String,
        /// Raw compiler output
        diagnostics: String,
    },

    /// Any other filesystem failure, annotated with the path involved.
    #[error("i/o error at {path:?}: {source}")]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying filesystem error
        #[source]
        source: std::io::Error,
    },

    /// Source template failed to render.
    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),

    /// The artifact registry could not store or read a descriptor.
    #[error("artifact registry error: {0}")]
    Registry(String),
}

impl GeneratorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GeneratorError::Io {
            path: path.into(),
            source,
        }
    }
}
