//! Content-type schema model and the schema-to-type-path compiler
//!
//! Raw schemas arrive as JSON in the content API's vocabulary. They are parsed
//! once into [`FieldSchema`], a closed set of known field kinds plus an explicit
//! [`FieldSchema::Unrecognized`] variant, so every later stage dispatches by
//! pattern match instead of by string.
//!
//! Field maps keep the schema author's key order (`IndexMap`, and
//! `serde_json`'s `preserve_order`), which keeps the compiled type-path index
//! diff-stable.

pub mod classifier;
pub mod compiler;
pub mod naming;
pub mod standard;
pub mod typedef;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::digest;
use crate::{Error, Result};

pub use classifier::{classify, Classification};
pub use compiler::{compile_schemas, CompiledSchemas};
pub use typedef::{FieldType, ObjectTypeDef, Resolver, TypeDef, UnionTypeDef};

/// Ordered map of field id to field schema
pub type FieldMap = IndexMap<String, FieldSchema>;

/// Key under which a content type declares its UID field
pub const UID_FIELD: &str = "uid";

/// One field's schema, classified by kind
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSchema {
    Uid,
    Color,
    Select,
    Text,
    StructuredText,
    Number,
    Date,
    Timestamp,
    GeoPoint,
    Embed,
    Image,
    Link,
    /// Repeatable set of nested fields
    Group { fields: FieldMap },
    /// One slice variant: non-repeating "primary" fields and repeating "items"
    Slice { primary: FieldMap, items: FieldMap },
    /// Slice zone: ordered named slice choices
    Slices { choices: FieldMap },
    /// A kind this compiler does not know; dropped during classification
    Unrecognized { kind: String },
}

impl FieldSchema {
    /// Parse a raw field definition
    ///
    /// `origin` names the field for error messages. Structural problems (no
    /// `type`, a group without `config.fields`, ...) are configuration errors;
    /// an unknown `type` string is not, it becomes `Unrecognized`.
    pub fn from_value(origin: &str, value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::Schema(format!("{}: field definition is not an object", origin)))?;

        let kind = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Schema(format!("{}: field definition has no `type`", origin)))?;

        let field = match kind {
            "UID" => FieldSchema::Uid,
            "Color" => FieldSchema::Color,
            "Select" => FieldSchema::Select,
            "Text" => FieldSchema::Text,
            "StructuredText" => FieldSchema::StructuredText,
            "Number" => FieldSchema::Number,
            "Date" => FieldSchema::Date,
            "Timestamp" => FieldSchema::Timestamp,
            "GeoPoint" => FieldSchema::GeoPoint,
            "Embed" => FieldSchema::Embed,
            "Image" => FieldSchema::Image,
            "Link" => FieldSchema::Link,
            "Group" => {
                let fields = config_object(origin, obj, "fields")?;
                FieldSchema::Group {
                    fields: parse_field_map(origin, fields)?,
                }
            }
            "Slice" => FieldSchema::Slice {
                primary: optional_field_map(origin, obj, "non-repeat")?,
                items: optional_field_map(origin, obj, "repeat")?,
            },
            "Slices" => {
                let choices = config_object(origin, obj, "choices")?;
                FieldSchema::Slices {
                    choices: parse_field_map(origin, choices)?,
                }
            }
            other => FieldSchema::Unrecognized {
                kind: other.to_string(),
            },
        };

        Ok(field)
    }

    /// The content API's name for this kind
    pub fn kind_name(&self) -> &str {
        match self {
            FieldSchema::Uid => "UID",
            FieldSchema::Color => "Color",
            FieldSchema::Select => "Select",
            FieldSchema::Text => "Text",
            FieldSchema::StructuredText => "StructuredText",
            FieldSchema::Number => "Number",
            FieldSchema::Date => "Date",
            FieldSchema::Timestamp => "Timestamp",
            FieldSchema::GeoPoint => "GeoPoint",
            FieldSchema::Embed => "Embed",
            FieldSchema::Image => "Image",
            FieldSchema::Link => "Link",
            FieldSchema::Group { .. } => "Group",
            FieldSchema::Slice { .. } => "Slice",
            FieldSchema::Slices { .. } => "Slices",
            FieldSchema::Unrecognized { kind } => kind,
        }
    }
}

fn config_object<'a>(origin: &str, obj: &'a Map<String, Value>, key: &str) -> Result<&'a Map<String, Value>> {
    obj.get("config")
        .and_then(|config| config.get(key))
        .and_then(Value::as_object)
        .ok_or_else(|| Error::Schema(format!("{}: missing `config.{}`", origin, key)))
}

fn optional_field_map(origin: &str, obj: &Map<String, Value>, key: &str) -> Result<FieldMap> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(FieldMap::new()),
        Some(Value::Object(fields)) => parse_field_map(origin, fields),
        Some(_) => Err(Error::Schema(format!("{}: `{}` is not an object", origin, key))),
    }
}

fn parse_field_map(origin: &str, fields: &Map<String, Value>) -> Result<FieldMap> {
    fields
        .iter()
        .map(|(id, value)| {
            let field = FieldSchema::from_value(&format!("{}/{}", origin, id), value)?;
            Ok((id.clone(), field))
        })
        .collect()
}

/// Schema of one content type
///
/// The raw JSON groups fields into editor tabs; tabs are merged in order into
/// a single field map.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentTypeSchema {
    pub id: String,
    pub fields: FieldMap,
    raw: Value,
}

impl ContentTypeSchema {
    pub fn from_value(id: impl Into<String>, raw: Value) -> Result<Self> {
        let id = id.into();
        let tabs = raw
            .as_object()
            .ok_or_else(|| Error::Schema(format!("{}: content type schema is not an object", id)))?;

        let mut fields = FieldMap::new();
        for (tab, tab_fields) in tabs {
            let tab_fields = tab_fields.as_object().ok_or_else(|| {
                Error::Schema(format!("{}: tab `{}` is not an object", id, tab))
            })?;
            for (field_id, value) in parse_field_map(&id, tab_fields)? {
                fields.insert(field_id, value);
            }
        }

        Ok(Self { id, fields, raw })
    }

    /// The UID field, if this content type declares one
    pub fn uid_field(&self) -> Option<&FieldSchema> {
        self.fields.get(UID_FIELD)
    }

    /// Every field except the UID field, in schema order
    pub fn data_fields(&self) -> impl Iterator<Item = (&String, &FieldSchema)> {
        self.fields.iter().filter(|(id, _)| id.as_str() != UID_FIELD)
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

/// All content-type schemas of one repository, keyed by content-type id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaSet {
    types: IndexMap<String, ContentTypeSchema>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `{ "<contentTypeId>": <schema>, ... }`
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(Error::Schema("schema set is not an object".to_string()));
        };
        let mut set = Self::new();
        for (id, raw) in map {
            set.insert(ContentTypeSchema::from_value(id, raw)?);
        }
        Ok(set)
    }

    pub fn insert(&mut self, schema: ContentTypeSchema) {
        self.types.insert(schema.id.clone(), schema);
    }

    pub fn get(&self, id: &str) -> Option<&ContentTypeSchema> {
        self.types.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentTypeSchema> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Raw JSON of the whole set
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.types
                .iter()
                .map(|(id, schema)| (id.clone(), schema.raw.clone()))
                .collect(),
        )
    }

    /// Digest of the raw schema set, independent of incidental key order
    ///
    /// This is the cache key naming the persisted type-path index.
    pub fn digest(&self) -> String {
        digest::schemas_digest(&self.to_value())
    }
}
