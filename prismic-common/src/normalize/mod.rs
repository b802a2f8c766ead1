//! Document normalizer
//!
//! Walks one raw document field by field. The type-path index, not the
//! schema, decides how each value is treated, so the build and preview
//! contexts reach identical results from the same index. Sibling fields are
//! normalized concurrently and reassembled in their original key order.
//!
//! Failures below the document level never abort the document: media falls
//! back to a `null` local file, an unreachable link target is left without
//! an attached document, malformed values pass through unchanged.

pub mod hooks;
pub mod image;
pub mod link;
pub mod slices;
pub mod source;
pub mod structured_text;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::RawDocument;
use crate::digest::content_digest;
use crate::node::{Node, NodeId};
use crate::schema::naming::{composite_type_name, TypeRole};
use crate::store::NodeStore;
use crate::type_paths::{PathKind, TypePathIndex};
use crate::Result;

pub use hooks::{FieldContext, Hooks, HtmlSerializer, LinkResolver, ShouldFetchMedia};
pub use source::{DocumentSource, InMemoryDocuments, MediaMaterializer};

/// Collaborators for normalizing documents
///
/// Cheap to clone; the index and store are shared, never copied.
#[derive(Clone)]
pub struct NormalizationContext {
    pub type_paths: Arc<TypePathIndex>,
    pub store: Arc<NodeStore>,
    pub hooks: Hooks,
    /// Source for lazily following document links; `None` disables following
    pub documents: Option<Arc<dyn DocumentSource>>,
    /// Media materializer; `None` leaves every `localFile` as `null`
    pub media: Option<Arc<dyn MediaMaterializer>>,
}

impl NormalizationContext {
    pub fn new(type_paths: Arc<TypePathIndex>, store: Arc<NodeStore>) -> Self {
        Self {
            type_paths,
            store,
            hooks: Hooks::default(),
            documents: None,
            media: None,
        }
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_documents(mut self, documents: Arc<dyn DocumentSource>) -> Self {
        self.documents = Some(documents);
        self
    }

    pub fn with_media(mut self, media: Arc<dyn MediaMaterializer>) -> Self {
        self.media = Some(media);
        self
    }
}

/// Normalize one document and emit its nodes
///
/// Slice nodes and linked documents are emitted before the root node. The
/// root id is claimed up front so links leading back to this document do not
/// recurse. Returns the root node id.
pub async fn normalize_document(doc: &RawDocument, ctx: &NormalizationContext) -> Result<NodeId> {
    let id = doc.node_id();
    ctx.store.reserve(id);

    match build_root(id, doc, ctx).await.and_then(|node| ctx.store.insert(node)) {
        Ok(_) => Ok(id),
        Err(e) => {
            ctx.store.mark_failed(id);
            Err(e)
        }
    }
}

async fn build_root(id: NodeId, doc: &RawDocument, ctx: &NormalizationContext) -> Result<Node> {
    debug!(doc_type = %doc.doc_type, doc_id = %doc.id, "Normalizing document");

    let depth = vec![doc.doc_type.clone(), "data".to_string()];
    let data = match &doc.data {
        Value::Object(fields) => Value::Object(normalize_object(fields, &depth, doc, ctx).await),
        other => {
            warn!(doc_id = %doc.id, "Document data is not an object; passing through");
            other.clone()
        }
    };

    let Value::Object(mut fields) = serde_json::to_value(doc)? else {
        return Err(crate::Error::Internal(format!("document {} did not serialize to an object", doc.id)));
    };
    fields.insert("prismicId".to_string(), Value::String(doc.id.clone()));
    fields.insert("data".to_string(), data);
    fields.insert("dataString".to_string(), Value::String(serde_json::to_string(&doc.data)?));
    fields.insert("dataRaw".to_string(), doc.data.clone());

    let node_type = composite_type_name::<&str>(&doc.doc_type, &[], TypeRole::Document);
    Ok(Node::new(id, fields, node_type, content_digest(doc)?))
}

fn child_path(depth: &[String], segment: &str) -> Vec<String> {
    let mut path = Vec::with_capacity(depth.len() + 1);
    path.extend_from_slice(depth);
    path.push(segment.to_string());
    path
}

/// Normalize every field of `object` located under `depth`
pub async fn normalize_object(
    object: &Map<String, Value>,
    depth: &[String],
    doc: &RawDocument,
    ctx: &NormalizationContext,
) -> Map<String, Value> {
    let values = join_all(
        object
            .iter()
            .map(|(field_id, value)| normalize_field(field_id, value, depth, doc, ctx)),
    )
    .await;

    object.keys().cloned().zip(values).collect()
}

/// Normalize one field value according to the kind recorded at its path
pub fn normalize_field<'a>(
    field_id: &'a str,
    value: &'a Value,
    depth: &'a [String],
    doc: &'a RawDocument,
    ctx: &'a NormalizationContext,
) -> BoxFuture<'a, Value> {
    async move {
        if value.is_null() {
            return Value::Null;
        }

        let path = child_path(depth, field_id);
        match ctx.type_paths.kind(&path) {
            Some(PathKind::StructuredText) => structured_text::normalize_structured_text(field_id, value, doc, ctx),
            Some(PathKind::Image) => image::normalize_image_field(field_id, value, doc, ctx).await,
            Some(PathKind::Link) => link::normalize_link_field(field_id, value, doc, ctx).await,
            Some(PathKind::Group) => normalize_group(value, &path, doc, ctx).await,
            Some(PathKind::SliceZone) => slices::normalize_slice_zone(field_id, value, &path, doc, ctx).await,
            Some(PathKind::Other(_)) | None => value.clone(),
        }
    }
    .boxed()
}

async fn normalize_group(value: &Value, path: &[String], doc: &RawDocument, ctx: &NormalizationContext) -> Value {
    let Some(entries) = value.as_array() else {
        warn!(path = %path.join("/"), doc_id = %doc.id, "Group value is not an array; passing through");
        return value.clone();
    };

    let normalized = join_all(entries.iter().map(|entry| async move {
        match entry {
            Value::Object(fields) => Value::Object(normalize_object(fields, path, doc, ctx).await),
            other => other.clone(),
        }
    }))
    .await;

    Value::Array(normalized)
}
