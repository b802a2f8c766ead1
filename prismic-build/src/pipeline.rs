//! Build pipeline
//!
//! Phases, in order:
//! 1. Validate options, load and compile schemas, register types with the sink
//! 2. Page through every document (any page failure aborts the run)
//! 3. Claim every root id, then normalize documents with a bounded worker pool
//! 4. Persist the type-path index and the emitted nodes
//!
//! A document whose normalization fails is logged and skipped; the rest of
//! the run continues.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use prismic_common::api::PrismicClient;
use prismic_common::config::{Context, SourceOptions};
use prismic_common::normalize::{Hooks, InMemoryDocuments};
use prismic_common::{compile_schemas, normalize_document, Error, Node, NodeStore, NormalizationContext, Result};

use crate::media::RemoteFileMaterializer;
use crate::schemas::load_schemas;
use crate::sink::{register_types, SchemaSink, SdlFileSink};
use crate::writer::{self, NODES_FILE_NAME, SCHEMA_FILE_NAME};

/// Outcome of one build run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub schemas_digest: String,
    /// Documents returned by the content API
    pub documents: usize,
    /// Documents whose normalization failed
    pub failed: usize,
    /// Nodes emitted, including slice and file nodes
    pub nodes: usize,
    pub type_paths_file: PathBuf,
    pub nodes_file: PathBuf,
}

/// Configurable build run
pub struct BuildPipeline {
    options: SourceOptions,
    hooks: Hooks,
    sink: Option<Arc<dyn SchemaSink>>,
    events: Option<mpsc::UnboundedSender<Arc<Node>>>,
}

impl BuildPipeline {
    pub fn new(options: SourceOptions) -> Self {
        Self {
            options,
            hooks: Hooks::default(),
            sink: None,
            events: None,
        }
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Replace the default `schema.graphql` sink
    pub fn with_sink(mut self, sink: Arc<dyn SchemaSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Receive every node as soon as it is created
    pub fn with_events(mut self, events: mpsc::UnboundedSender<Arc<Node>>) -> Self {
        self.events = Some(events);
        self
    }

    pub async fn run(self) -> Result<RunSummary> {
        let started_at = Utc::now();
        let options = self.options;
        options.validate(Context::Build)?;

        let schemas_dir = options
            .schemas_dir
            .as_deref()
            .ok_or_else(|| Error::Config("schemas_dir is required".to_string()))?;

        // Phase 1: schemas and types
        let phase = Instant::now();
        let schemas = load_schemas(schemas_dir).await?;
        let compiled = compile_schemas(&schemas)?;
        let schemas_digest = schemas.digest();

        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(SdlFileSink::new(options.output_dir.join(SCHEMA_FILE_NAME))));
        register_types(sink.as_ref(), &compiled).await?;

        info!(
            content_types = schemas.len(),
            types = compiled.type_defs.len(),
            type_paths = compiled.type_paths.len(),
            elapsed_ms = phase.elapsed().as_millis() as u64,
            "Registered types"
        );

        // Phase 2: documents
        let phase = Instant::now();
        let client = Arc::new(PrismicClient::from_options(&options)?);
        let documents = client.query_all().await?;
        let total = documents.len();

        info!(
            documents = total,
            elapsed_ms = phase.elapsed().as_millis() as u64,
            "Fetched documents"
        );

        // Phase 3: normalization
        let phase = Instant::now();
        let store = Arc::new(match self.events {
            Some(events) => NodeStore::with_events(events),
            None => NodeStore::new(),
        });

        // Link targets that are part of this run are normalized by their own
        // worker, never by a link follower
        for doc in &documents {
            store.reserve(doc.node_id());
        }

        let source = InMemoryDocuments::new(documents.iter().cloned()).with_fallback(client.clone());
        let mut ctx = NormalizationContext::new(Arc::new(compiled.index()), store.clone())
            .with_hooks(self.hooks)
            .with_documents(Arc::new(source));

        if options.normalize_images {
            let media = RemoteFileMaterializer::new(&options.cache_dir, options.concurrent_file_requests)?;
            debug!(cache_dir = %media.cache_dir().display(), "Media download enabled");
            ctx = ctx.with_media(Arc::new(media));
        }

        let processed = AtomicUsize::new(0);
        let results: Vec<bool> = stream::iter(documents.iter())
            .map(|doc| {
                let ctx = &ctx;
                let processed = &processed;

                async move {
                    let succeeded = match normalize_document(doc, ctx).await {
                        Ok(id) => {
                            debug!(doc_type = %doc.doc_type, doc_id = %doc.id, node_id = %id, "Document normalized");
                            true
                        }
                        Err(e) => {
                            error!(
                                doc_type = %doc.doc_type,
                                doc_id = %doc.id,
                                error = %e,
                                "Document normalization failed"
                            );
                            false
                        }
                    };

                    let current = processed.fetch_add(1, Ordering::Relaxed) + 1;
                    if current % 100 == 0 || current == total {
                        info!(progress = format!("{}/{}", current, total), "Normalization progress");
                    }

                    succeeded
                }
            })
            .buffer_unordered(options.concurrent_file_requests)
            .collect()
            .await;

        let failed = results.iter().filter(|succeeded| !**succeeded).count();
        info!(
            documents = total,
            failed,
            nodes = store.len(),
            elapsed_ms = phase.elapsed().as_millis() as u64,
            "Normalized documents"
        );

        // Phase 4: artifacts
        let phase = Instant::now();
        let type_paths_file = writer::write_type_paths(
            &options.output_dir,
            &options.type_paths_prefix(),
            &schemas_digest,
            &ctx.type_paths,
        )
        .await?;

        let nodes = store.nodes();
        let nodes_file = options.output_dir.join(NODES_FILE_NAME);
        writer::write_nodes(&nodes_file, &nodes).await?;

        info!(
            type_paths_file = %type_paths_file.display(),
            nodes_file = %nodes_file.display(),
            elapsed_ms = phase.elapsed().as_millis() as u64,
            "Wrote artifacts"
        );

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            schemas_digest,
            documents: total,
            failed,
            nodes: nodes.len(),
            type_paths_file,
            nodes_file,
        };

        info!(
            duration_ms = (summary.finished_at - summary.started_at).num_milliseconds(),
            "Build complete"
        );
        Ok(summary)
    }
}

/// Run a build with default hooks and the `schema.graphql` sink
pub async fn source_nodes(options: &SourceOptions) -> Result<RunSummary> {
    BuildPipeline::new(options.clone()).run().await
}
