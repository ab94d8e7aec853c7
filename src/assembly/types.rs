use serde::{Deserialize, Serialize};
use std::fmt;

/// A declared member type as written in an assembly description.
///
/// Parsed from text: `T?`, `Nullable<T>` and `Option<T>` are nullable
/// wrappers; `T[]`, `Vec<T>` and `List<T>` are arrays. A dotted or `::`
/// separated prefix is the namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeRef {
    /// A plain named type, optionally qualified by a namespace
    Named {
        /// Dotted namespace (`System`, `Acme.Billing`); empty when unqualified
        namespace: String,
        /// Bare type name (`Int32`, `Customer`)
        name: String,
    },
    /// A nullable wrapper over the inner type
    Nullable(Box<TypeRef>),
    /// A homogeneous sequence of the inner type
    Array(Box<TypeRef>),
}

const NULLABLE_WRAPPERS: &[&str] = &["Nullable", "Option"];
const ARRAY_WRAPPERS: &[&str] = &["Vec", "List", "IList", "IEnumerable", "Array"];

impl TypeRef {
    /// Unqualified named type.
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named {
            namespace: String::new(),
            name: name.into(),
        }
    }

    /// Named type inside `namespace`.
    pub fn qualified(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        TypeRef::Named {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Wrap `self` in a nullable marker.
    pub fn nullable(self) -> Self {
        TypeRef::Nullable(Box::new(self))
    }

    /// Parse declared type text. Returns `None` when the text does not name a type.
    pub fn parse(text: &str) -> Option<TypeRef> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Some(inner) = text.strip_suffix('?') {
            return TypeRef::parse(inner).map(TypeRef::nullable);
        }
        if let Some(inner) = text.strip_suffix("[]") {
            return TypeRef::parse(inner).map(|t| TypeRef::Array(Box::new(t)));
        }
        if let Some(open) = text.find('<') {
            let inner = text[open + 1..].strip_suffix('>')?;
            let (_, wrapper) = split_qualified(&text[..open]);
            if NULLABLE_WRAPPERS.contains(&wrapper) {
                return TypeRef::parse(inner).map(TypeRef::nullable);
            }
            if ARRAY_WRAPPERS.contains(&wrapper) {
                return TypeRef::parse(inner).map(|t| TypeRef::Array(Box::new(t)));
            }
            return None;
        }
        let (namespace, name) = split_qualified(text);
        if !is_type_identifier(name) || !namespace.split('.').all(is_namespace_segment) {
            return None;
        }
        Some(TypeRef::Named {
            namespace,
            name: name.to_string(),
        })
    }

    /// The type with every nullable layer removed.
    pub fn underlying(&self) -> &TypeRef {
        match self {
            TypeRef::Nullable(inner) => inner.underlying(),
            other => other,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeRef::Nullable(_))
    }
}

fn split_qualified(text: &str) -> (String, &str) {
    if let Some(idx) = text.rfind("::") {
        return (text[..idx].replace("::", "."), &text[idx + 2..]);
    }
    match text.rfind('.') {
        Some(idx) => (text[..idx].to_string(), &text[idx + 1..]),
        None => (String::new(), text),
    }
}

// `/` and `+` show up in nested type names; they are stripped at render time.
fn is_type_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '/' | '+'))
}

fn is_namespace_segment(segment: &str) -> bool {
    segment.is_empty() || segment.chars().all(|c| c.is_alphanumeric() || c == '_')
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named { namespace, name } if namespace.is_empty() => write!(f, "{name}"),
            TypeRef::Named { namespace, name } => write!(f, "{namespace}.{name}"),
            TypeRef::Nullable(inner) => write!(f, "{inner}?"),
            TypeRef::Array(inner) => write!(f, "{inner}[]"),
        }
    }
}

/// One member of a DAO type: a name plus declared type text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoMember {
    pub name: String,
    /// Declared type text, e.g. `int`, `System.Decimal?`, `Option<String>`
    #[serde(rename = "type")]
    pub ty: String,
    /// Marks the member optional even when `ty` carries no nullable marker
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
}

impl DaoMember {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            nullable: false,
        }
    }

    /// Parsed declared type, with the `nullable` flag applied as an outer wrapper.
    pub fn declared_type(&self) -> Option<TypeRef> {
        let ty = TypeRef::parse(&self.ty)?;
        if self.nullable && !ty.is_nullable() {
            Some(ty.nullable())
        } else {
            Some(ty)
        }
    }
}

/// A DAO type from an assembly description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoType {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    /// Whether this type carries table metadata
    #[serde(default)]
    pub table: bool,
    /// Database table name, when it differs from the type name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    /// Connection name the table is bound to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
    #[serde(default)]
    pub members: Vec<DaoMember>,
}

impl DaoType {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            table: false,
            table_name: None,
            connection: None,
            members: Vec::new(),
        }
    }

    /// Builder-style: flag this type as a table definition.
    pub fn as_table(mut self) -> Self {
        self.table = true;
        self
    }

    pub fn with_connection(mut self, connection: impl Into<String>) -> Self {
        self.connection = Some(connection.into());
        self
    }

    pub fn with_member(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.members.push(DaoMember::new(name, ty));
        self
    }

    pub fn is_table(&self) -> bool {
        self.table
    }

    /// `namespace.Name`, or just `Name` for types outside any namespace.
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    pub fn table_name(&self) -> &str {
        self.table_name.as_deref().unwrap_or(&self.name)
    }
}

/// A loaded collection of DAO types, the stand-in for a compiled DAO assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoAssembly {
    #[serde(default)]
    pub name: String,
    /// Connection used when a table type names none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_connection: Option<String>,
    #[serde(default)]
    pub types: Vec<DaoType>,
}

impl DaoAssembly {
    pub fn new(name: impl Into<String>, types: Vec<DaoType>) -> Self {
        Self {
            name: name.into(),
            default_connection: None,
            types,
        }
    }

    /// Table-flagged types in declaration order.
    pub fn table_types(&self) -> impl Iterator<Item = &DaoType> {
        self.types.iter().filter(|t| t.is_table())
    }

    pub fn first_table(&self) -> Option<&DaoType> {
        self.table_types().next()
    }

    /// Connection name of the first table type, falling back to the assembly default.
    pub fn connection_name(&self) -> Option<&str> {
        self.first_table()
            .and_then(|t| t.connection.as_deref())
            .or(self.default_connection.as_deref())
    }

    /// Look up a table type by bare or fully qualified name.
    pub fn find_table(&self, name: &str) -> Option<&DaoType> {
        self.table_types()
            .find(|t| t.name == name || t.full_name() == name)
    }
}
