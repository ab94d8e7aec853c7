use crate::assembly::{DaoAssembly, DaoType, TypeRef};
use crate::error::{GeneratorError, Result};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Declared type used when an example value is absent.
///
/// Mirrors a default-constructed object: it always resolves (to `()`), so a
/// member can still be emitted for a `null` example.
pub const PLACEHOLDER_TYPE: &str = "object";

/// A struct to be emitted, derived from a DAO type, a property list, or example values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedShape {
    /// Sanitized Rust type name (`Billing_Customer`)
    pub type_name: String,
    /// Type name as it appeared in the source
    pub source_name: String,
    /// Owning namespace (`Acme.Billing.Dtos`)
    pub namespace: String,
    /// Members in declaration order
    pub members: Vec<ShapeMember>,
    /// Emitted member declarations, one per member (`pub Total: f64,`)
    pub properties: Vec<String>,
    /// Distinct resolved member types
    pub reference_types: BTreeSet<TypeRef>,
    /// Paths this shape needs `use`d
    pub imports: BTreeSet<String>,
}

/// One emitted field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeMember {
    /// Rust field name
    pub name: String,
    /// Member name as it appeared in the source
    pub source_name: String,
    /// Resolved source type; nullable wrappers from form (a) are already removed
    pub source_type: TypeRef,
    /// Rust type text used in the declaration
    pub rust_type: String,
}

impl GeneratedShape {
    /// `use` lines for every referenced path, one per line.
    pub fn usings(&self) -> String {
        self.imports
            .iter()
            .map(|path| format!("use {path};\n"))
            .collect()
    }

    pub fn member(&self, source_name: &str) -> Option<&ShapeMember> {
        self.members.iter().find(|m| m.source_name == source_name)
    }
}

/// An explicit (name, type) pair for [`ShapeExtractor::from_properties`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyModel {
    pub name: String,
    pub ty: TypeRef,
}

impl PropertyModel {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Sanitize a source type name into a single Rust identifier.
///
/// `.` becomes `_` and `/` is removed; any other character that cannot appear
/// in an identifier becomes `_`. Keywords become raw identifiers (`r#type`),
/// and names that cannot be raw (`Self`, `crate`, `_`) get a `_` suffix.
/// Returns an empty string when nothing usable remains.
pub fn clean_type_name(name: &str) -> String {
    let cleaned: String = name
        .replace('.', "_")
        .replace('/', "")
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        return cleaned;
    }
    if cleaned.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("_{cleaned}")
    } else {
        sanitize_rust_identifier(&cleaned)
    }
}

fn sanitize_rust_identifier(name: &str) -> String {
    const KEYWORDS: &[&str] = &[
        "as", "break", "const", "continue", "else", "enum", "extern", "false", "fn", "for", "if",
        "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
        "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while", "async",
        "await", "dyn", "abstract", "become", "box", "do", "final", "macro", "override", "priv",
        "typeof", "unsized", "virtual", "yield", "try", "gen",
    ];
    // Cannot be raw identifiers.
    const RESERVED: &[&str] = &["self", "Self", "super", "crate", "_"];
    if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else if RESERVED.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

fn sanitize_field_name(name: &str) -> String {
    let mut s: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if s.is_empty() {
        s = "_".to_string();
    }
    if s.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        s.insert(0, '_');
    }
    sanitize_rust_identifier(&s)
}

/// Rust type for a language-neutral primitive alias (matched on the lowercased bare name).
pub fn primitive_rust_type(name: &str) -> Option<&'static str> {
    let ty = match name.to_ascii_lowercase().as_str() {
        "bool" | "boolean" => "bool",
        "byte" | "u8" => "u8",
        "sbyte" | "i8" => "i8",
        "short" | "int16" | "i16" => "i16",
        "ushort" | "uint16" | "u16" => "u16",
        "int" | "int32" | "integer" | "i32" => "i32",
        "uint" | "uint32" | "u32" => "u32",
        "long" | "int64" | "i64" => "i64",
        "ulong" | "uint64" | "u64" => "u64",
        "float" | "single" | "f32" => "f32",
        "double" | "f64" | "decimal" => "f64",
        "char" => "char",
        "string" | "str" => "String",
        "datetime" | "datetimeoffset" => "std::time::SystemTime",
        "timespan" => "std::time::Duration",
        PLACEHOLDER_TYPE => "()",
        _ => return None,
    };
    Some(ty)
}

/// Runtime type of an example value; `null` yields the placeholder type.
pub fn value_type(value: &Value) -> TypeRef {
    match value {
        Value::Null | Value::Object(_) => TypeRef::named(PLACEHOLDER_TYPE),
        Value::Bool(_) => TypeRef::named("bool"),
        Value::Number(n) if n.is_i64() => TypeRef::named("long"),
        Value::Number(n) if n.is_u64() => TypeRef::named("ulong"),
        Value::Number(_) => TypeRef::named("double"),
        Value::String(_) => TypeRef::named("string"),
        Value::Array(items) => {
            let item = items
                .iter()
                .find(|v| !v.is_null())
                .map(value_type)
                .unwrap_or_else(|| TypeRef::named(PLACEHOLDER_TYPE));
            TypeRef::Array(Box::new(item))
        }
    }
}

/// Short names handed out for imported paths within one source unit.
#[derive(Debug, Default)]
struct ImportScope {
    by_segment: BTreeMap<String, String>,
}

impl ImportScope {
    /// Short name for `path`, or `None` when the segment is already taken by another path.
    fn claim(&mut self, path: &str) -> Option<String> {
        let segment = path.rsplit("::").next().unwrap_or(path).to_string();
        match self.by_segment.get(&segment) {
            Some(existing) if existing == path => Some(segment),
            Some(_) => None,
            None => {
                self.by_segment.insert(segment.clone(), path.to_string());
                Some(segment)
            }
        }
    }
}

/// Derives [`GeneratedShape`]s and resolves declared types to Rust types.
///
/// Resolution order for a named type: the configured `type_map` (full name,
/// then bare name, case-insensitive), the primitive aliases, then table types
/// of the same assembly. One extractor corresponds to one emitted source unit,
/// so import short names never collide inside that unit.
#[derive(Debug, Default)]
pub struct ShapeExtractor {
    type_map: BTreeMap<String, String>,
    siblings: BTreeMap<String, String>,
    scope: ImportScope,
}

impl ShapeExtractor {
    pub fn new(type_map: &BTreeMap<String, String>) -> Self {
        Self {
            type_map: type_map
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
                .collect(),
            ..Self::default()
        }
    }

    /// Extractor that also resolves references to the assembly's table types.
    pub fn for_assembly(assembly: &DaoAssembly, type_map: &BTreeMap<String, String>) -> Self {
        let mut extractor = Self::new(type_map);
        for table in assembly.table_types() {
            let dto = clean_type_name(&table.name);
            extractor.scope.claim(&format!("crate::{dto}"));
            extractor.siblings.insert(table.full_name(), dto.clone());
            extractor.siblings.entry(table.name.clone()).or_insert(dto);
        }
        extractor
    }

    /// Form (a): derive a shape from a DAO type's declared members.
    ///
    /// Nullable wrappers are removed: a `decimal?` member is emitted as the
    /// Rust type for `decimal`.
    pub fn from_type(&mut self, source: &DaoType, namespace: &str) -> Result<GeneratedShape> {
        if source.members.is_empty() {
            return Err(GeneratorError::InvalidInput(format!(
                "type `{}` has no members",
                source.full_name()
            )));
        }
        let mut builder = ShapeBuilder::new(&source.name, namespace)?;
        for member in &source.members {
            let declared = member
                .declared_type()
                .ok_or_else(|| GeneratorError::MissingReference {
                    member: format!("{}.{}", source.full_name(), member.name),
                    type_name: member.ty.clone(),
                })?;
            let resolved = declared.underlying().clone();
            self.push_member(&mut builder, &member.name, resolved)?;
        }
        builder.finish()
    }

    /// Form (b): derive a shape from explicit (name, type) pairs, used as given.
    pub fn from_properties(
        &mut self,
        namespace: &str,
        type_name: &str,
        properties: &[PropertyModel],
    ) -> Result<GeneratedShape> {
        if properties.is_empty() {
            return Err(GeneratorError::InvalidInput(format!(
                "no properties supplied for `{type_name}`"
            )));
        }
        let mut builder = ShapeBuilder::new(type_name, namespace)?;
        for property in properties {
            self.push_member(&mut builder, &property.name, property.ty.clone())?;
        }
        builder.finish()
    }

    /// Form (c): derive a shape from keys and example values.
    ///
    /// Keys become member names through their `Display` text. A `null` value
    /// falls back to the placeholder type; anything else uses its runtime type.
    pub fn from_values<K, I>(
        &mut self,
        namespace: &str,
        type_name: &str,
        values: I,
    ) -> Result<GeneratedShape>
    where
        K: fmt::Display,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut builder = ShapeBuilder::new(type_name, namespace)?;
        for (key, value) in values {
            self.push_member(&mut builder, &key.to_string(), value_type(&value))?;
        }
        if builder.members.is_empty() {
            return Err(GeneratorError::InvalidInput(format!(
                "no values supplied for `{type_name}`"
            )));
        }
        builder.finish()
    }

    fn push_member(&mut self, builder: &mut ShapeBuilder, name: &str, ty: TypeRef) -> Result<()> {
        let mut imports = BTreeSet::new();
        let rust_type =
            self.resolve(&ty, &mut imports)
                .ok_or_else(|| GeneratorError::MissingReference {
                    member: format!("{}.{}", builder.source_name, name),
                    type_name: ty.to_string(),
                })?;
        builder.push(name, ty, rust_type, imports)
    }

    /// Rust type text for `ty`, recording any `use` paths it needs.
    pub fn resolve(&mut self, ty: &TypeRef, imports: &mut BTreeSet<String>) -> Option<String> {
        match ty {
            TypeRef::Nullable(inner) => Some(format!("Option<{}>", self.resolve(inner, imports)?)),
            TypeRef::Array(inner) => Some(format!("Vec<{}>", self.resolve(inner, imports)?)),
            TypeRef::Named { namespace, name } => {
                let full = if namespace.is_empty() {
                    name.clone()
                } else {
                    format!("{namespace}.{name}")
                };
                if let Some(mapped) = self
                    .type_map
                    .get(&full.to_ascii_lowercase())
                    .or_else(|| self.type_map.get(&name.to_ascii_lowercase()))
                    .cloned()
                {
                    return Some(self.use_path(&mapped, imports));
                }
                if let Some(primitive) = primitive_rust_type(name) {
                    return Some(self.use_path(primitive, imports));
                }
                self.siblings
                    .get(&full)
                    .or_else(|| self.siblings.get(name))
                    .cloned()
            }
        }
    }

    fn use_path(&mut self, path: &str, imports: &mut BTreeSet<String>) -> String {
        if !path.contains("::") || path.contains('<') {
            return path.to_string();
        }
        match self.scope.claim(path) {
            Some(short) => {
                imports.insert(path.to_string());
                short
            }
            None => path.to_string(),
        }
    }
}

struct ShapeBuilder {
    type_name: String,
    source_name: String,
    namespace: String,
    members: Vec<ShapeMember>,
    seen: BTreeSet<String>,
    reference_types: BTreeSet<TypeRef>,
    imports: BTreeSet<String>,
}

impl ShapeBuilder {
    fn new(source_name: &str, namespace: &str) -> Result<Self> {
        let type_name = clean_type_name(source_name);
        if type_name.is_empty() {
            return Err(GeneratorError::InvalidInput(format!(
                "type name `{source_name}` is empty after sanitizing"
            )));
        }
        Ok(Self {
            type_name,
            source_name: source_name.to_string(),
            namespace: namespace.to_string(),
            members: Vec::new(),
            seen: BTreeSet::new(),
            reference_types: BTreeSet::new(),
            imports: BTreeSet::new(),
        })
    }

    fn push(
        &mut self,
        source_name: &str,
        source_type: TypeRef,
        rust_type: String,
        imports: BTreeSet<String>,
    ) -> Result<()> {
        let name = sanitize_field_name(source_name);
        if !self.seen.insert(name.clone()) {
            return Err(GeneratorError::InvalidInput(format!(
                "duplicate member `{source_name}` in `{}`",
                self.source_name
            )));
        }
        self.reference_types.insert(source_type.clone());
        self.imports.extend(imports);
        self.members.push(ShapeMember {
            name,
            source_name: source_name.to_string(),
            source_type,
            rust_type,
        });
        Ok(())
    }

    fn finish(self) -> Result<GeneratedShape> {
        let properties = self
            .members
            .iter()
            .map(|m| format!("pub {}: {},", m.name, m.rust_type))
            .collect();
        Ok(GeneratedShape {
            type_name: self.type_name,
            source_name: self.source_name,
            namespace: self.namespace,
            members: self.members,
            properties,
            reference_types: self.reference_types,
            imports: self.imports,
        })
    }
}
