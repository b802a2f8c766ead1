//! Link fields
//!
//! The stored value keeps every raw key and adds `url`, `document` (the
//! target's node id, or `null` for web and media links) and `raw`. Document
//! targets are normalized lazily, at most once per run: the target id is
//! claimed in the store before fetching, and an already claimed id means the
//! target is handled elsewhere.

use serde_json::Value;
use tracing::{debug, warn};

use super::{normalize_document, FieldContext, NormalizationContext};
use crate::api::RawDocument;
use crate::node::{document_node_id, NodeId};
use crate::rich_text::link_url;

pub async fn normalize_link_field(
    field_id: &str,
    value: &Value,
    doc: &RawDocument,
    ctx: &NormalizationContext,
) -> Value {
    let Some(link) = value.as_object() else {
        warn!(field = %field_id, doc_id = %doc.id, "Link value is not an object; passing through");
        return value.clone();
    };

    let field = FieldContext { document: doc, field: field_id };
    let url = link_url(value, |target| ctx.hooks.document_url(&field, target));

    let target = document_target(value);
    if let Some((target_id, target_doc_id)) = &target {
        follow_link(*target_id, target_doc_id, ctx).await;
    }

    let mut normalized = link.clone();
    normalized.insert("url".to_string(), url.map(Value::String).unwrap_or(Value::Null));
    normalized.insert(
        "document".to_string(),
        target.map(|(id, _)| Value::from(id)).unwrap_or(Value::Null),
    );
    normalized.insert("raw".to_string(), value.clone());
    Value::Object(normalized)
}

/// Node id and content API id of a live document link target
fn document_target(link: &Value) -> Option<(NodeId, String)> {
    if link.get("link_type").and_then(Value::as_str) != Some("Document") {
        return None;
    }
    if link.get("isBroken").and_then(Value::as_bool) == Some(true) {
        return None;
    }
    let id = link.get("id").and_then(Value::as_str)?;
    let doc_type = link.get("type").and_then(Value::as_str)?;
    Some((document_node_id(doc_type, id), id.to_string()))
}

/// Ensure the target document is normalized into the store
///
/// Never fails: a fetch or normalization error marks the target failed and
/// leaves the link without an attached document.
async fn follow_link(target: NodeId, doc_id: &str, ctx: &NormalizationContext) {
    let Some(documents) = &ctx.documents else {
        return;
    };
    if !ctx.store.reserve(target) {
        debug!(doc_id = %doc_id, "Link target already claimed; skipping fetch");
        return;
    }

    match documents.get_by_id(doc_id).await {
        Ok(Some(linked)) => {
            let linked_id = linked.node_id();
            if linked_id != target {
                warn!(
                    doc_id = %doc_id,
                    doc_type = %linked.doc_type,
                    "Linked document type differs from the link; target left unattached"
                );
                ctx.store.mark_failed(target);
                if !ctx.store.reserve(linked_id) {
                    return;
                }
            }
            if let Err(e) = Box::pin(normalize_document(&linked, ctx)).await {
                warn!(doc_id = %doc_id, error = %e, "Failed to normalize linked document");
                ctx.store.mark_failed(target);
            }
        }
        Ok(None) => {
            warn!(doc_id = %doc_id, "Linked document not found");
            ctx.store.mark_failed(target);
        }
        Err(e) => {
            warn!(doc_id = %doc_id, error = %e, "Failed to fetch linked document");
            ctx.store.mark_failed(target);
        }
    }
}
