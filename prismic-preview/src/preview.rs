//! Single-document preview normalization

use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

use prismic_common::api::RawDocument;
use prismic_common::normalize::{DocumentSource, FieldContext, Hooks};
use prismic_common::resolve::materialize_node;
use prismic_common::schema::naming::camel_case;
use prismic_common::{normalize_document, Error, NodeStore, NormalizationContext, Result, TypePathIndex};

use crate::session::{PathResolver, PreviewSession};
use crate::type_paths::session_type_paths;

/// Preview output: `{ path, previewData: { <camelCase(node type)>: <root node> } }`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    pub path: Option<String>,
    pub preview_data: Map<String, Value>,
}

impl PreviewResult {
    /// The single `previewData` entry
    pub fn root(&self) -> Option<(&String, &Value)> {
        self.preview_data.iter().next()
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({"path": self.path, "previewData": self.preview_data})
    }
}

/// Fetch the previewed document with the preview ref and normalize it
pub async fn normalize_preview(session: &PreviewSession) -> Result<PreviewResult> {
    let client = Arc::new(session.client()?);
    let document = client
        .get_by_id(&session.document_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("preview document {}", session.document_id)))?;

    let index = session_type_paths(session).await?;

    preview_document(
        &document,
        Arc::new(index),
        client,
        session.hooks.clone(),
        session.path_resolver.as_deref(),
    )
    .await
}

/// Normalize `document` into a fresh node store and materialize its root
///
/// Linked documents are fetched from `documents`; nothing is downloaded.
pub async fn preview_document(
    document: &RawDocument,
    type_paths: Arc<TypePathIndex>,
    documents: Arc<dyn DocumentSource>,
    hooks: Hooks,
    path_resolver: Option<&dyn PathResolver>,
) -> Result<PreviewResult> {
    let path = match path_resolver {
        Some(resolver) => resolver.resolve(document),
        None => {
            let ctx = FieldContext { document, field: "" };
            hooks.link_resolver.resolve(&ctx, &document.to_value())
        }
    };

    let store = Arc::new(NodeStore::new());
    let ctx = NormalizationContext::new(type_paths.clone(), store.clone())
        .with_hooks(hooks)
        .with_documents(documents);

    let root_id = normalize_document(document, &ctx).await?;
    let root = store
        .get(&root_id)
        .ok_or_else(|| Error::Internal(format!("root node {} missing after normalization", root_id)))?;

    info!(
        doc_type = %document.doc_type,
        doc_id = %document.id,
        nodes = store.len(),
        "Normalized preview"
    );

    let mut preview_data = Map::new();
    preview_data.insert(
        camel_case(root.node_type()),
        materialize_node(&root, &type_paths, &store),
    );
    Ok(PreviewResult { path, preview_data })
}
