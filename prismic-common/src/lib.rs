//! # Prismic Source Common Library
//!
//! Shared code for the build and preview contexts including:
//! - Content-type schema model and the schema-to-type-path compiler
//! - The persisted type-path index
//! - Deterministic node identity and the node store
//! - The recursive document normalizer and rich-text serializer
//! - Read-time resolvers for image, link and slice-zone fields
//! - Content API client and configuration loading
//!
//! Both contexts must reach identical structural decisions, so everything that
//! influences a node id, a node shape or a type path lives here.

pub mod api;
pub mod config;
pub mod digest;
pub mod error;
pub mod node;
pub mod normalize;
pub mod resolve;
pub mod rich_text;
pub mod schema;
pub mod store;
pub mod type_paths;

pub use error::{Error, Result};
pub use node::{create_node_id, Node, NodeId};
pub use normalize::{normalize_document, NormalizationContext};
pub use schema::{compile_schemas, CompiledSchemas, FieldSchema, SchemaSet};
pub use store::NodeStore;
pub use type_paths::{TypePathEntry, TypePathIndex};
