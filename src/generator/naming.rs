//! Deterministic artifact identity.
//!
//! The canonical hashed input is the set of table types' fully qualified names
//! (`namespace.Name`), compared case-sensitively, deduplicated, sorted by byte
//! order and joined with `,`. The SHA-256 of that string, as lowercase hex, is
//! the schema fingerprint. Declaration order never affects the result.

use crate::assembly::DaoType;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Canonical, order-independent form of a set of table types.
pub fn canonical_table_names<'a, I>(table_types: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a DaoType>,
{
    table_types
        .into_iter()
        .map(DaoType::full_name)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// SHA-256 fingerprint over the canonical table names.
pub fn schema_fingerprint<'a, I>(table_types: I) -> String
where
    I: IntoIterator<Item = &'a DaoType>,
{
    fingerprint_of(&canonical_table_names(table_types))
}

/// SHA-256 over already canonical names.
pub fn fingerprint_of(canonical_names: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_names.join(",").as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// `_{namespace}_{fingerprint}_.{ext}`
///
/// Path separators in the namespace become `_`, so the name always stays a
/// single file inside the artifact directory.
pub fn artifact_file_name(namespace: &str, fingerprint: &str, extension: &str) -> String {
    let namespace = namespace.replace(['/', '\\'], "_");
    let extension = extension.trim_start_matches('.');
    format!("_{namespace}_{fingerprint}_.{extension}")
}

/// Default artifact name for `namespace` and the given table types.
///
/// Two calls over set-equal table types yield the same name regardless of order.
pub fn compute_default_artifact_name<'a, I>(
    namespace: &str,
    table_types: I,
    extension: &str,
) -> String
where
    I: IntoIterator<Item = &'a DaoType>,
{
    artifact_file_name(namespace, &schema_fingerprint(table_types), extension)
}

/// Crate name the compiler is asked to produce for an artifact file name.
pub fn crate_name_for(artifact_name: &str) -> String {
    let stem = artifact_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(artifact_name);
    let name: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let name = name.trim_matches('_').to_string();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("dto_{name}")
    } else {
        name
    }
}
