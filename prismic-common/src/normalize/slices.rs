//! Slice zones
//!
//! Every slice instance becomes its own node. The field itself stores the
//! ordered list of slice node ids; the slices resolver expands them at read
//! time.

use futures::future::join_all;
use serde_json::{Map, Value};
use tracing::warn;

use super::{child_path, normalize_object, NormalizationContext};
use crate::api::RawDocument;
use crate::digest::content_digest;
use crate::node::{slice_node_id, Node, NodeId};
use crate::schema::naming::pascal_case;

pub async fn normalize_slice_zone(
    field_id: &str,
    value: &Value,
    path: &[String],
    doc: &RawDocument,
    ctx: &NormalizationContext,
) -> Value {
    let Some(entries) = value.as_array() else {
        warn!(field = %field_id, doc_id = %doc.id, "Slice zone value is not an array; passing through");
        return value.clone();
    };

    let ids = join_all(
        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| normalize_slice(field_id, index, entry, path, doc, ctx)),
    )
    .await;

    Value::Array(ids.into_iter().flatten().map(Value::from).collect())
}

/// Node type of a slice node: `Prismic<DocType><ZoneId><SliceType>`
pub fn slice_node_type(doc_type: &str, field_id: &str, slice_type: &str) -> String {
    pascal_case(&format!("Prismic {} {} {}", doc_type, field_id, slice_type))
}

async fn normalize_slice(
    field_id: &str,
    index: usize,
    entry: &Value,
    path: &[String],
    doc: &RawDocument,
    ctx: &NormalizationContext,
) -> Option<NodeId> {
    let Some(slice) = entry.as_object() else {
        warn!(field = %field_id, index, doc_id = %doc.id, "Slice entry is not an object; skipping");
        return None;
    };
    let Some(slice_type) = slice.get("slice_type").and_then(Value::as_str) else {
        warn!(field = %field_id, index, doc_id = %doc.id, "Slice entry has no slice_type; skipping");
        return None;
    };

    let slice_path = child_path(path, slice_type);
    let primary_path = child_path(&slice_path, "primary");
    let items_path = child_path(&slice_path, "items");

    let primary = async {
        match slice.get("primary") {
            Some(Value::Object(fields)) => Value::Object(normalize_object(fields, &primary_path, doc, ctx).await),
            Some(other) => other.clone(),
            None => Value::Object(Map::new()),
        }
    };
    let items = async {
        match slice.get("items") {
            Some(Value::Array(items)) => {
                let items_path = &items_path;
                let normalized = join_all(items.iter().map(|item| async move {
                    match item {
                        Value::Object(fields) => Value::Object(normalize_object(fields, items_path, doc, ctx).await),
                        other => other.clone(),
                    }
                }))
                .await;
                Value::Array(normalized)
            }
            Some(other) => other.clone(),
            None => Value::Array(Vec::new()),
        }
    };
    let (primary, items) = futures::join!(primary, items);

    let mut fields: Map<String, Value> = slice.clone();
    fields.insert("primary".to_string(), primary);
    fields.insert("items".to_string(), items);

    let id = slice_node_id(&doc.doc_type, &doc.id, field_id, index);
    let digest = match content_digest(entry) {
        Ok(digest) => digest,
        Err(e) => {
            warn!(field = %field_id, index, doc_id = %doc.id, error = %e, "Failed to digest slice; skipping");
            return None;
        }
    };

    let node = Node::new(id, fields, slice_node_type(&doc.doc_type, field_id, slice_type), digest);
    if let Err(e) = ctx.store.insert(node) {
        warn!(field = %field_id, index, doc_id = %doc.id, error = %e, "Slice node not stored");
    }
    Some(id)
}
