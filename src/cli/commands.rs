use crate::assembly::load_assembly;
use crate::config::GeneratorConfig;
use crate::generator::DtoGenerator;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Command-line interface for dtogen
///
/// Derives DTO structs from a DAO assembly description and compiles them.
#[derive(Parser, Debug)]
#[command(name = "dtogen")]
#[command(about = "DTO artifact generator for DAO assemblies", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate and compile the DTO artifact for an assembly
    Generate {
        /// Path to the assembly description (YAML or JSON)
        #[arg(short, long)]
        assembly: PathBuf,

        /// Path to dtogen.toml
        /// If not provided, will auto-detect alongside the assembly description
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Data root for scratch directories and artifacts
        #[arg(long, env = "DTOGEN_DATA_ROOT")]
        data_root: Option<PathBuf>,

        /// Target namespace (default: `<namespace>.Dtos`)
        #[arg(long)]
        namespace: Option<String>,

        /// Artifact file name (default: `_<namespace>_<fingerprint>_.<ext>`)
        #[arg(long)]
        name: Option<String>,

        /// Reuse a registered artifact when the schema is unchanged
        #[arg(long, default_value_t = false)]
        reuse: bool,
    },
    /// Emit the DTO source unit without compiling it
    Source {
        /// Path to the assembly description (YAML or JSON)
        #[arg(short, long)]
        assembly: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Target namespace (default: `<namespace>.Dtos`)
        #[arg(long)]
        namespace: Option<String>,

        /// Empty directory to write `lib.rs` into; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the default artifact name and schema fingerprint
    Name {
        /// Path to the assembly description (YAML or JSON)
        #[arg(short, long)]
        assembly: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_generator(
    assembly_path: &Path,
    config_path: Option<&Path>,
    data_root: Option<&Path>,
) -> anyhow::Result<DtoGenerator> {
    let assembly = load_assembly(assembly_path)?;
    let mut config = GeneratorConfig::resolve(config_path, assembly_path)?;
    if let Some(root) = data_root {
        config.data_root = root.to_path_buf();
    }
    Ok(DtoGenerator::new(assembly, config))
}

/// Execute the CLI command provided by the user
///
/// # Errors
///
/// Returns an error if:
/// - The assembly description or config cannot be loaded or parsed
/// - Shape extraction or compilation fails
/// - Output cannot be written
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&cli, &mut out)
}

/// Execute a parsed command, writing user-facing output to `out`.
pub fn run(cli: &Cli, out: &mut dyn Write) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Generate {
            assembly,
            config,
            data_root,
            namespace,
            name,
            reuse,
        } => {
            let generator = load_generator(assembly, config.as_deref(), data_root.as_deref())?;
            let descriptor = match (namespace, name, reuse) {
                (None, None, true) => generator.generate_or_reuse()?,
                (None, None, false) => generator.generate_default()?,
                _ => {
                    if *reuse {
                        tracing::warn!("--reuse only applies to the default namespace and name");
                    }
                    let namespace = match namespace {
                        Some(ns) => ns.clone(),
                        None => generator.dto_namespace()?,
                    };
                    let name = match name {
                        Some(n) => n.clone(),
                        None => generator.default_artifact_name()?,
                    };
                    generator.generate(&namespace, &name)?
                }
            };
            for line in &descriptor.diagnostics {
                writeln!(out, "{line}")?;
            }
            writeln!(out, "{}", descriptor.artifact_path.display())?;
            Ok(())
        }
        Commands::Source {
            assembly,
            config,
            namespace,
            output,
        } => {
            let generator = load_generator(assembly, config.as_deref(), None)?;
            let namespace = match namespace {
                Some(ns) => ns.clone(),
                None => generator.dto_namespace()?,
            };
            match output {
                Some(dir) => {
                    std::fs::create_dir_all(dir).with_context(|| {
                        format!("Failed to create output directory: {}", dir.display())
                    })?;
                    let path = generator.write_source(&namespace, dir)?;
                    writeln!(out, "{}", path.display())?;
                }
                None => {
                    out.write_all(generator.render_source(&namespace)?.as_bytes())?;
                }
            }
            Ok(())
        }
        Commands::Name { assembly, config } => {
            let generator = load_generator(assembly, config.as_deref(), None)?;
            writeln!(out, "{}", generator.default_artifact_name()?)?;
            writeln!(out, "fingerprint: {}", generator.fingerprint())?;
            Ok(())
        }
    }
}
