//! Image fields
//!
//! An image value holds the base view (`dimensions`, `alt`, `copyright`,
//! `url`) and any number of named alternate views as sibling objects. Each
//! view gets a `localFile` reference: the id of a materialized file node, or
//! `null` when materialization is disabled, declined or failed.

use futures::future::join_all;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{FieldContext, NormalizationContext};
use crate::api::RawDocument;
use crate::node::NodeId;

/// Keys making up the base view
pub const BASE_VIEW_KEYS: &[&str] = &["dimensions", "alt", "copyright", "url"];

/// Key holding a view's local file reference
pub const LOCAL_FILE_KEY: &str = "localFile";

pub async fn normalize_image_field(
    field_id: &str,
    value: &Value,
    doc: &RawDocument,
    ctx: &NormalizationContext,
) -> Value {
    let Some(image) = value.as_object() else {
        warn!(field = %field_id, doc_id = %doc.id, "Image value is not an object; passing through");
        return value.clone();
    };

    let base: Map<String, Value> = image
        .iter()
        .filter(|(key, _)| BASE_VIEW_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let views: Vec<&Map<String, Value>> = image
        .iter()
        .filter(|(key, _)| !BASE_VIEW_KEYS.contains(&key.as_str()) && key.as_str() != LOCAL_FILE_KEY)
        .filter_map(|(_, value)| value.as_object())
        .collect();

    let base_file = local_file(field_id, &base, doc, ctx);
    let view_files = join_all(views.iter().map(|view| local_file(field_id, view, doc, ctx)));
    let (base_file, view_files) = futures::join!(base_file, view_files);

    let mut normalized = base;
    normalized.insert(LOCAL_FILE_KEY.to_string(), file_ref(base_file));

    // Same iteration order as `views`, so files line up with object views
    let mut view_files = view_files.into_iter();
    for (key, value) in image {
        if BASE_VIEW_KEYS.contains(&key.as_str()) || key == LOCAL_FILE_KEY {
            continue;
        }
        let value = match value {
            Value::Object(view) => {
                let mut view = view.clone();
                view.insert(LOCAL_FILE_KEY.to_string(), file_ref(view_files.next().flatten()));
                Value::Object(view)
            }
            other => other.clone(),
        };
        normalized.insert(key.clone(), value);
    }

    Value::Object(normalized)
}

fn file_ref(file: Option<NodeId>) -> Value {
    file.map(Value::from).unwrap_or(Value::Null)
}

/// Materialize one view; failures and declines yield `None`
async fn local_file(
    field_id: &str,
    view: &Map<String, Value>,
    doc: &RawDocument,
    ctx: &NormalizationContext,
) -> Option<NodeId> {
    let media = ctx.media.as_ref()?;
    let url = view.get("url").and_then(Value::as_str)?;

    let field = FieldContext { document: doc, field: field_id };
    if !ctx.hooks.should_fetch_media.should_fetch(&field, &Value::Object(view.clone())) {
        debug!(field = %field_id, url = %url, "Media predicate declined image");
        return None;
    }

    match media.materialize(url, doc.node_id()).await {
        Ok(file) => {
            let id = file.id;
            ctx.store.insert_if_absent(file);
            Some(id)
        }
        Err(e) => {
            warn!(field = %field_id, url = %url, doc_id = %doc.id, error = %e, "Failed to materialize image");
            None
        }
    }
}
