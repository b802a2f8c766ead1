//! Generated type descriptions and their SDL rendering
//!
//! The compiler emits descriptions only; a downstream sink registers them with
//! whatever schema engine consumes them.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt::Write as _;

/// Read-time resolver attached to a field
///
/// The stored value is not what a reader sees: image local-file references,
/// link target ids and slice node ids are expanded from the node store when
/// the field is read (see [`crate::resolve`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolver {
    Image,
    Link,
    Slices,
}

impl Resolver {
    pub fn as_str(self) -> &'static str {
        match self {
            Resolver::Image => "image",
            Resolver::Link => "link",
            Resolver::Slices => "slices",
        }
    }
}

/// Type of one field of a generated object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldType {
    /// Scalar, composite or list-marker (`[X]`) type name
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolver: Option<Resolver>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation_reason: Option<String>,
}

impl FieldType {
    pub fn named(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            resolver: None,
            description: None,
            deprecation_reason: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }
}

/// List-marker type name: `[X]`
pub fn list_of(type_name: &str) -> String {
    format!("[{}]", type_name)
}

/// A generated object type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectTypeDef {
    pub name: String,
    pub fields: IndexMap<String, FieldType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
}

/// A generated union type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnionTypeDef {
    pub name: String,
    pub types: Vec<String>,
}

/// One generated composite type description
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDef {
    Object(ObjectTypeDef),
    Union(UnionTypeDef),
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            TypeDef::Object(def) => &def.name,
            TypeDef::Union(def) => &def.name,
        }
    }

    /// Whether this type declares `interface`
    pub fn implements(&self, interface: &str) -> bool {
        match self {
            TypeDef::Object(def) => def.interfaces.iter().any(|i| i == interface),
            TypeDef::Union(_) => false,
        }
    }

    /// GraphQL SDL for this definition
    ///
    /// SDL has no notion of our resolvers, so resolver-backed fields carry a
    /// `# resolver: <kind>` comment line for the registering sink.
    pub fn to_sdl(&self) -> String {
        let mut out = String::new();
        match self {
            TypeDef::Object(def) => {
                out.push_str("type ");
                out.push_str(&def.name);
                if !def.interfaces.is_empty() {
                    out.push_str(" implements ");
                    out.push_str(&def.interfaces.join(" & "));
                }
                out.push_str(" {\n");
                for (field_name, field) in &def.fields {
                    if let Some(resolver) = field.resolver {
                        let _ = writeln!(out, "  # resolver: {}", resolver.as_str());
                    }
                    if let Some(description) = &field.description {
                        let _ = writeln!(out, "  {}", sdl_string(description));
                    }
                    let _ = write!(out, "  {}: {}", field_name, field.type_name);
                    if let Some(reason) = &field.deprecation_reason {
                        let _ = write!(out, " @deprecated(reason: {})", sdl_string(reason));
                    }
                    out.push('\n');
                }
                out.push('}');
            }
            TypeDef::Union(def) => {
                let _ = write!(out, "union {} = {}", def.name, def.types.join(" | "));
            }
        }
        out
    }
}

/// Render several definitions separated by blank lines
pub fn render_sdl(defs: &[TypeDef]) -> String {
    defs.iter()
        .map(TypeDef::to_sdl)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn sdl_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
