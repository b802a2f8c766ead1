//! External collaborators the normalizer suspends on

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::RawDocument;
use crate::node::{Node, NodeId};
use crate::Result;

/// Fetches a single document by its content API id
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// `Ok(None)` when the document does not exist
    async fn get_by_id(&self, id: &str) -> Result<Option<RawDocument>>;
}

/// Turns a remote asset into a local file node
///
/// The returned node's id becomes the image view's `localFile` reference.
#[async_trait]
pub trait MediaMaterializer: Send + Sync {
    async fn materialize(&self, url: &str, parent: NodeId) -> Result<Node>;
}

/// Documents already fetched in bulk, with an optional network fallback
///
/// Lets link-following in the build context reuse the paged result set
/// instead of refetching each target.
pub struct InMemoryDocuments {
    documents: HashMap<String, RawDocument>,
    fallback: Option<Arc<dyn DocumentSource>>,
}

impl InMemoryDocuments {
    pub fn new(documents: impl IntoIterator<Item = RawDocument>) -> Self {
        Self {
            documents: documents.into_iter().map(|doc| (doc.id.clone(), doc)).collect(),
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn DocumentSource>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentSource for InMemoryDocuments {
    async fn get_by_id(&self, id: &str) -> Result<Option<RawDocument>> {
        if let Some(doc) = self.documents.get(id) {
            return Ok(Some(doc.clone()));
        }
        match &self.fallback {
            Some(fallback) => fallback.get_by_id(id).await,
            None => Ok(None),
        }
    }
}
