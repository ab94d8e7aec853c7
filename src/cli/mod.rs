//! # CLI Module
//!
//! Command-line front end for the DTO generator.
//!
//! ## Commands
//!
//! ### `generate`
//!
//! Compile the DTO artifact for an assembly and print its path:
//!
//! ```bash
//! dtogen generate --assembly billing.yaml --reuse
//! ```
//!
//! Options:
//! - `--assembly <FILE>` - Assembly description, YAML or JSON (required)
//! - `--config <FILE>` - `dtogen.toml`; auto-detected next to the assembly
//! - `--data-root <DIR>` - Overrides the configured data root
//! - `--namespace`, `--name` - Override the default namespace and artifact name
//! - `--reuse` - Skip compilation when the registered artifact still matches
//!
//! ### `source`
//!
//! Print the generated `lib.rs`, or write it into an empty directory:
//!
//! ```bash
//! dtogen source --assembly billing.yaml --output ./dto-src
//! ```
//!
//! ### `name`
//!
//! Print the default artifact name and fingerprint:
//!
//! ```bash
//! dtogen name --assembly billing.yaml
//! ```

mod commands;


pub use commands::{run, run_cli, Cli, Commands};
