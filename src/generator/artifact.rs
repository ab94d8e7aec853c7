use askama::Template;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::assembly::DaoAssembly;
use crate::config::GeneratorConfig;
use crate::error::{GeneratorError, Result};

use super::compiler::{CompileRequest, Compiler, RustcCompiler};
use super::naming::{artifact_file_name, canonical_table_names, crate_name_for, fingerprint_of};
use super::registry::{ArtifactDescriptor, ArtifactRegistry, JsonFileRegistry};
use super::shape::{clean_type_name, GeneratedShape, ShapeExtractor};
use super::templates::{write_dto_unit, DtoUnitTemplate};

/// Suffix appended to the source namespace for generated DTOs.
pub const DTO_NAMESPACE_SUFFIX: &str = ".Dtos";

/// Connection name used when no table type or assembly default names one.
pub const DEFAULT_CONNECTION: &str = "default";

/// Generates DTO artifacts from a DAO assembly.
///
/// Intended primarily to back DAOs up into an object repository: the DTOs are
/// plain structs with the tables' shapes.
///
/// [`generate`](Self::generate) runs under an instance-scoped lock, so at most
/// one generation per instance is in flight. Separate instances pointing at
/// the same data root are not coordinated.
pub struct DtoGenerator {
    assembly: DaoAssembly,
    config: GeneratorConfig,
    compiler: Arc<dyn Compiler>,
    registry: Arc<dyn ArtifactRegistry>,
    generate_lock: Mutex<()>,
}

impl std::fmt::Debug for DtoGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DtoGenerator")
            .field("assembly", &self.assembly.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DtoGenerator {
    /// Generator wired to `rustc` and a JSON registry under the config's artifact dir.
    pub fn new(assembly: DaoAssembly, config: GeneratorConfig) -> Self {
        let compiler = Arc::new(RustcCompiler::from_config(&config));
        let registry = Arc::new(JsonFileRegistry::new(config.artifact_dir()));
        Self::with_collaborators(assembly, config, compiler, registry)
    }

    pub fn with_collaborators(
        assembly: DaoAssembly,
        config: GeneratorConfig,
        compiler: Arc<dyn Compiler>,
        registry: Arc<dyn ArtifactRegistry>,
    ) -> Self {
        Self {
            assembly,
            config,
            compiler,
            registry,
            generate_lock: Mutex::new(()),
        }
    }

    pub fn assembly(&self) -> &DaoAssembly {
        &self.assembly
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Namespace of the first table type, else of the first declared type.
    ///
    /// # Errors
    ///
    /// [`GeneratorError::EmptyAssembly`] when the assembly declares no types.
    pub fn derive_namespace(&self) -> Result<String> {
        let one = self
            .assembly
            .first_table()
            .or_else(|| self.assembly.types.first())
            .ok_or_else(|| GeneratorError::EmptyAssembly {
                assembly: self.assembly.name.clone(),
            })?;
        Ok(one.namespace.clone())
    }

    /// [`derive_namespace`](Self::derive_namespace) with the `.Dtos` suffix.
    pub fn dto_namespace(&self) -> Result<String> {
        Ok(format!("{}{}", self.derive_namespace()?, DTO_NAMESPACE_SUFFIX))
    }

    /// Fingerprint over this assembly's table types.
    pub fn fingerprint(&self) -> String {
        fingerprint_of(&canonical_table_names(self.assembly.table_types()))
    }

    /// `_{namespace}_{fingerprint}_.{ext}` where the namespace is the derived source namespace.
    pub fn default_artifact_name(&self) -> Result<String> {
        Ok(artifact_file_name(
            &self.derive_namespace()?,
            &self.fingerprint(),
            &self.config.artifact_extension,
        ))
    }

    /// Shapes for every table type, in declaration order.
    ///
    /// # Errors
    ///
    /// [`GeneratorError::InvalidInput`] when two table types sanitize to the
    /// same struct name, since one unit cannot define both.
    pub fn shapes(&self, namespace: &str) -> Result<Vec<GeneratedShape>> {
        let mut struct_names: BTreeMap<String, String> = BTreeMap::new();
        for table in self.assembly.table_types() {
            let struct_name = clean_type_name(&table.name);
            let full_name = table.full_name();
            if let Some(existing) = struct_names.insert(struct_name.clone(), full_name.clone()) {
                return Err(GeneratorError::InvalidInput(format!(
                    "table types `{existing}` and `{full_name}` both map to struct `{struct_name}`"
                )));
            }
        }
        let mut extractor = ShapeExtractor::for_assembly(&self.assembly, &self.config.type_map);
        self.assembly
            .table_types()
            .map(|table| extractor.from_type(table, namespace))
            .collect()
    }

    /// Write the DTO source unit for `namespace` into `dir`.
    ///
    /// `dir` must exist and be empty, so nothing stale can end up in the artifact.
    pub fn write_source(&self, namespace: &str, dir: &Path) -> Result<PathBuf> {
        let mut entries = fs::read_dir(dir).map_err(|e| GeneratorError::io(dir, e))?;
        if entries.next().is_some() {
            return Err(GeneratorError::SourceDirectoryNotEmpty {
                path: dir.to_path_buf(),
            });
        }
        let shapes = self.table_shapes(namespace)?;
        let fingerprint = self.fingerprint();
        let unit = DtoUnitTemplate::new(
            &self.assembly.name,
            namespace,
            &fingerprint,
            &self.config.derives,
            &shapes,
        );
        write_dto_unit(dir, &unit)
    }

    /// Render the DTO source unit for `namespace` without touching the filesystem.
    pub fn render_source(&self, namespace: &str) -> Result<String> {
        let shapes = self.table_shapes(namespace)?;
        let fingerprint = self.fingerprint();
        let unit = DtoUnitTemplate::new(
            &self.assembly.name,
            namespace,
            &fingerprint,
            &self.config.derives,
            &shapes,
        );
        Ok(unit.render()?)
    }

    fn table_shapes(&self, namespace: &str) -> Result<Vec<GeneratedShape>> {
        if self.assembly.first_table().is_none() {
            return Err(GeneratorError::InvalidInput(format!(
                "assembly `{}` has no table types",
                self.assembly.name
            )));
        }
        self.shapes(namespace)
    }

    /// [`write_source`](Self::write_source) into the default DTO namespace.
    pub fn write_source_default(&self, dir: &Path) -> Result<PathBuf> {
        self.write_source(&self.dto_namespace()?, dir)
    }

    /// Scratch directory for this assembly's connection.
    pub fn scratch_dir(&self) -> PathBuf {
        let connection = self.assembly.connection_name().unwrap_or(DEFAULT_CONNECTION);
        self.config.scratch_dir(connection)
    }

    /// End-to-end generation: fresh scratch dir, source, compile, persist descriptor.
    ///
    /// Blocks while another `generate` on this instance is running.
    ///
    /// # Errors
    ///
    /// - [`GeneratorError::ScratchDirectory`] if a stale scratch directory cannot
    ///   be deleted or a new one created; no source is written in that case
    /// - [`GeneratorError::Compilation`] straight from the compiler
    /// - any shape extraction or registry error
    pub fn generate(&self, namespace: &str, artifact_name: &str) -> Result<ArtifactDescriptor> {
        let _guard = self
            .generate_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.generate_locked(namespace, artifact_name)
    }

    /// [`generate`](Self::generate) into the default namespace and artifact name.
    pub fn generate_default(&self) -> Result<ArtifactDescriptor> {
        let namespace = self.dto_namespace()?;
        let artifact_name = self.default_artifact_name()?;
        self.generate(&namespace, &artifact_name)
    }

    /// Return the registered descriptor for the default artifact name when its
    /// artifact still exists; otherwise generate.
    pub fn generate_or_reuse(&self) -> Result<ArtifactDescriptor> {
        let namespace = self.dto_namespace()?;
        let artifact_name = self.default_artifact_name()?;
        let _guard = self
            .generate_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(existing) = self.registry.find(&artifact_name)? {
            if existing.artifact_path.exists() {
                tracing::info!(artifact = %artifact_name, "schema unchanged, reusing artifact");
                return Ok(existing);
            }
            tracing::debug!(artifact = %artifact_name, "registered artifact missing on disk, regenerating");
        }
        self.generate_locked(&namespace, &artifact_name)
    }

    fn generate_locked(&self, namespace: &str, artifact_name: &str) -> Result<ArtifactDescriptor> {
        let source_dir = self.scratch_dir();
        tracing::info!(
            assembly = %self.assembly.name,
            namespace,
            artifact = artifact_name,
            scratch = %source_dir.display(),
            "generating DTO artifact"
        );
        prepare_scratch_dir(&source_dir)?;

        self.write_source(namespace, &source_dir)?;

        let artifact_dir = self.config.artifact_dir();
        fs::create_dir_all(&artifact_dir).map_err(|e| GeneratorError::io(&artifact_dir, e))?;
        let output = artifact_dir.join(artifact_name);
        let crate_name = crate_name_for(artifact_name);
        let compiled = self.compiler.compile(&CompileRequest {
            source_dir: &source_dir,
            output: &output,
            crate_name: &crate_name,
        })?;

        let table_types = canonical_table_names(self.assembly.table_types());
        let descriptor = ArtifactDescriptor {
            file_name: artifact_name.to_string(),
            namespace: namespace.to_string(),
            fingerprint: fingerprint_of(&table_types),
            table_types,
            artifact_path: compiled.artifact_path,
            source_dir,
            diagnostics: compiled.diagnostics,
        };
        self.registry.save(&descriptor)?;
        tracing::info!(artifact = artifact_name, path = %descriptor.artifact_path.display(), "generated DTO artifact");
        Ok(descriptor)
    }
}

/// Delete a stale scratch directory, then create it fresh.
///
/// A failed delete is reported as a structured warning carrying the path and
/// the error, then returned.
pub fn prepare_scratch_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        if let Err(e) = fs::remove_dir_all(dir) {
            tracing::warn!(
                temp_dir = %dir.display(),
                error = %e,
                "Unable to delete temp source directory"
            );
            return Err(GeneratorError::ScratchDirectory {
                path: dir.to_path_buf(),
                source: e,
            });
        }
    }
    fs::create_dir_all(dir).map_err(|e| GeneratorError::ScratchDirectory {
        path: dir.to_path_buf(),
        source: e,
    })
}
