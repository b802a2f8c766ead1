//! Read-time resolvers
//!
//! Normalized values store references (node ids), never the referenced nodes.
//! These functions expand references against a node store when a field is
//! read. [`materialize_node`] applies them across a whole node so a caller
//! without a query engine (the preview context) gets a self-contained value.

use serde_json::{Map, Value};

use crate::node::{Node, NodeId};
use crate::normalize::image::LOCAL_FILE_KEY;
use crate::store::NodeStore;
use crate::type_paths::{PathKind, TypePathIndex};

/// Key carrying the concrete type of a resolved union member
pub const TYPENAME_KEY: &str = "__typename";

fn lookup(store: &NodeStore, reference: &Value) -> Option<Value> {
    let id = reference.as_str().and_then(NodeId::parse)?;
    store.get(&id).map(|node| typed(&node))
}

fn typed(node: &Node) -> Value {
    let mut value = node.to_value();
    if let Value::Object(map) = &mut value {
        map.insert(TYPENAME_KEY.to_string(), Value::String(node.node_type().to_string()));
    }
    value
}

/// Replace `localFile` references of the base view and every named view with
/// the file nodes; unknown references become `null`
pub fn resolve_image(value: &Value, store: &NodeStore) -> Value {
    let Some(image) = value.as_object() else {
        return value.clone();
    };

    let resolve_view = |view: &Map<String, Value>| {
        let mut view = view.clone();
        if let Some(reference) = view.get(LOCAL_FILE_KEY) {
            let file = lookup(store, reference).unwrap_or(Value::Null);
            view.insert(LOCAL_FILE_KEY.to_string(), file);
        }
        view
    };

    let mut resolved = resolve_view(image);
    for (key, value) in image {
        if let Value::Object(view) = value {
            if view.contains_key(LOCAL_FILE_KEY) {
                resolved.insert(key.clone(), Value::Object(resolve_view(view)));
            }
        }
    }
    Value::Object(resolved)
}

/// Replace the `document` reference with the linked document node, or `null`
/// when the target was never stored
pub fn resolve_link(value: &Value, store: &NodeStore) -> Value {
    let Some(link) = value.as_object() else {
        return value.clone();
    };
    let mut resolved = link.clone();
    let document = link
        .get("document")
        .and_then(|reference| lookup(store, reference))
        .unwrap_or(Value::Null);
    resolved.insert("document".to_string(), document);
    Value::Object(resolved)
}

/// Expand slice node ids into slice nodes, in order
///
/// Ids without a stored node are skipped.
pub fn resolve_slices(value: &Value, store: &NodeStore) -> Vec<Value> {
    value
        .as_array()
        .map(|ids| ids.iter().filter_map(|id| lookup(store, id)).collect())
        .unwrap_or_default()
}

/// Node value with every reference below `data` expanded
///
/// Linked documents are attached as stored, without expanding their own
/// references, so mutually linking documents cannot recurse.
pub fn materialize_node(node: &Node, index: &TypePathIndex, store: &NodeStore) -> Value {
    let mut value = typed(node);
    let doc_type = node.get("type").and_then(Value::as_str);

    if let (Some(doc_type), Some(Value::Object(data)), Value::Object(map)) =
        (doc_type, node.get("data"), &mut value)
    {
        let depth = vec![doc_type.to_string(), "data".to_string()];
        map.insert("data".to_string(), Value::Object(materialize_object(data, &depth, index, store)));
    }
    value
}

fn materialize_object(
    object: &Map<String, Value>,
    depth: &[String],
    index: &TypePathIndex,
    store: &NodeStore,
) -> Map<String, Value> {
    object
        .iter()
        .map(|(field_id, value)| {
            let mut path = depth.to_vec();
            path.push(field_id.clone());
            (field_id.clone(), materialize_field(value, &path, index, store))
        })
        .collect()
}

fn materialize_field(value: &Value, path: &[String], index: &TypePathIndex, store: &NodeStore) -> Value {
    match index.kind(path) {
        Some(PathKind::Image) => resolve_image(value, store),
        Some(PathKind::Link) => resolve_link(value, store),
        Some(PathKind::Group) => match value {
            Value::Array(entries) => Value::Array(
                entries
                    .iter()
                    .map(|entry| match entry {
                        Value::Object(fields) => Value::Object(materialize_object(fields, path, index, store)),
                        other => other.clone(),
                    })
                    .collect(),
            ),
            other => other.clone(),
        },
        Some(PathKind::SliceZone) => Value::Array(
            resolve_slices(value, store)
                .into_iter()
                .map(|slice| materialize_slice(slice, path, index, store))
                .collect(),
        ),
        _ => value.clone(),
    }
}

fn materialize_slice(mut slice: Value, zone_path: &[String], index: &TypePathIndex, store: &NodeStore) -> Value {
    let Some(slice_type) = slice.get("slice_type").and_then(Value::as_str).map(str::to_string) else {
        return slice;
    };
    let mut slice_path = zone_path.to_vec();
    slice_path.push(slice_type);

    if let Some(Value::Object(primary)) = slice.get("primary") {
        let mut primary_path = slice_path.clone();
        primary_path.push("primary".to_string());
        let primary = materialize_object(primary, &primary_path, index, store);
        slice["primary"] = Value::Object(primary);
    }
    if let Some(Value::Array(items)) = slice.get("items") {
        let mut items_path = slice_path;
        items_path.push("items".to_string());
        let items: Vec<Value> = items
            .iter()
            .map(|item| match item {
                Value::Object(fields) => Value::Object(materialize_object(fields, &items_path, index, store)),
                other => other.clone(),
            })
            .collect();
        slice["items"] = Value::Array(items);
    }
    slice
}
