//! # Prismic Source Build Context
//!
//! Offline build with the full schema set on disk:
//! - Schema loading and compilation, type registration through a sink
//! - Paged fetch of every document and bounded-concurrency normalization
//! - Remote media download into a local cache
//! - The persisted type-path index and node output files

pub mod media;
pub mod pipeline;
pub mod schemas;
pub mod sink;
pub mod writer;

pub use media::RemoteFileMaterializer;
pub use pipeline::{source_nodes, BuildPipeline, RunSummary};
pub use schemas::load_schemas;
pub use sink::{register_types, MemorySink, SchemaSink, SdlFileSink};
