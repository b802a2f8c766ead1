//! Normalized nodes and deterministic node identity
//!
//! A node id is a UUIDv5 derived from a fixed namespace and a caller-supplied
//! semantic key. Identical keys give identical ids in every context without
//! coordination, which is what lets a preview produce ids that line up with
//! build-time ids for the same underlying document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Seed namespace all node ids are derived under
const NAMESPACE_SEED: Uuid = Uuid::from_u128(0x638f7a53_c567_4eca_8fc1_b23efb1cfb2b);

/// Name hashed under the seed to produce the id namespace
const NAMESPACE_NAME: &str = "prismic-source";

/// Deterministic node identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parse a node id from its hyphenated string form
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(NodeId)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Value::String(id.to_string())
    }
}

fn namespace() -> Uuid {
    Uuid::new_v5(&NAMESPACE_SEED, NAMESPACE_NAME.as_bytes())
}

/// Derive a node id from a semantic key
///
/// Keys used by the normalizer:
/// - root documents: `"<contentTypeId> <documentId>"`
/// - slice entries: `"<docType> <docId> <fieldId> <index>"`
/// - local files: `"File <url>"`
pub fn create_node_id(key: &str) -> NodeId {
    NodeId(Uuid::new_v5(&namespace(), key.as_bytes()))
}

/// Node id for a root document
pub fn document_node_id(doc_type: &str, doc_id: &str) -> NodeId {
    create_node_id(&format!("{} {}", doc_type, doc_id))
}

/// Node id for one entry of a slice zone
pub fn slice_node_id(doc_type: &str, doc_id: &str, field_id: &str, index: usize) -> NodeId {
    create_node_id(&format!("{} {} {} {}", doc_type, doc_id, field_id, index))
}

/// Bookkeeping attached to every node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInternal {
    /// Generated type name, e.g. `PrismicPage`
    #[serde(rename = "type")]
    pub node_type: String,
    /// Digest over the pre-normalization source value
    pub content_digest: String,
}

/// One normalized, independently addressable unit of content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub internal: NodeInternal,
}

impl Node {
    /// Build a node; `id` and `internal` keys in `fields` are dropped since
    /// they are owned by the node itself
    pub fn new(
        id: NodeId,
        mut fields: Map<String, Value>,
        node_type: impl Into<String>,
        content_digest: impl Into<String>,
    ) -> Self {
        fields.shift_remove("id");
        fields.shift_remove("internal");
        Self {
            id,
            fields,
            internal: NodeInternal {
                node_type: node_type.into(),
                content_digest: content_digest.into(),
            },
        }
    }

    pub fn node_type(&self) -> &str {
        &self.internal.node_type
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// JSON form: `{id, ...fields, internal: {type, contentDigest}}`
    pub fn to_value(&self) -> Value {
        let mut map = Map::with_capacity(self.fields.len() + 2);
        map.insert("id".to_string(), self.id.into());
        for (k, v) in &self.fields {
            map.insert(k.clone(), v.clone());
        }
        map.insert(
            "internal".to_string(),
            serde_json::json!({
                "type": self.internal.node_type,
                "contentDigest": self.internal.content_digest,
            }),
        );
        Value::Object(map)
    }
}
