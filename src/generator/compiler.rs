use crate::config::GeneratorConfig;
use crate::error::{GeneratorError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Name of the single source unit written into the scratch directory.
pub const SOURCE_ENTRY: &str = "lib.rs";

/// What the generator asks a compiler to build.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    /// Directory holding the emitted source
    pub source_dir: &'a Path,
    /// Desired artifact path
    pub output: &'a Path,
    /// Crate name for the artifact
    pub crate_name: &'a str,
}

/// Result of a successful compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutput {
    /// The produced binary artifact
    pub artifact_path: PathBuf,
    /// Warnings or other non-fatal compiler output, one line per entry
    pub diagnostics: Vec<String>,
}

/// External compiler boundary.
///
/// Implementations report failure as [`GeneratorError::Compilation`] with the
/// compiler's diagnostics untouched; the generator never retries.
pub trait Compiler: Send + Sync {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<CompileOutput>;
}

/// Compiles the emitted unit with `rustc` as an rlib.
#[derive(Debug, Clone)]
pub struct RustcCompiler {
    bin: String,
    edition: String,
}

impl RustcCompiler {
    pub fn new(bin: impl Into<String>, edition: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            edition: edition.into(),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.rustc.clone(), config.edition.clone())
    }
}

impl Compiler for RustcCompiler {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<CompileOutput> {
        let entry = request.source_dir.join(SOURCE_ENTRY);
        let artifact = request
            .output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut cmd = Command::new(&self.bin);
        cmd.arg("--crate-type")
            .arg("rlib")
            .arg("--edition")
            .arg(&self.edition)
            .arg("--crate-name")
            .arg(request.crate_name)
            .arg("-o")
            .arg(request.output)
            .arg(&entry)
            .current_dir(request.source_dir);

        tracing::debug!(compiler = %self.bin, entry = %entry.display(), output = %request.output.display(), "invoking compiler");
        let output = cmd
            .output()
            .map_err(|e| GeneratorError::io(PathBuf::from(&self.bin), e))?;
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(GeneratorError::Compilation {
                artifact,
                diagnostics: stderr,
            });
        }

        Ok(CompileOutput {
            artifact_path: request.output.to_path_buf(),
            diagnostics: stderr
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}
