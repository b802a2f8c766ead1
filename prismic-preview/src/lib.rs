//! # Prismic Source Preview Context
//!
//! Normalizes a single unpublished document without the schema set, using
//! only the type-path index persisted by the build context. Node ids and
//! node shapes match the build output for the same document; images are not
//! downloaded, so every `localFile` is `null`.
//!
//! Everything a preview needs is carried by an explicit [`PreviewSession`].

pub mod merge;
pub mod preview;
pub mod session;
pub mod type_paths;

pub use merge::merge_preview_data;
pub use preview::{normalize_preview, preview_document, PreviewResult};
pub use session::{PathResolver, PreviewSession, TypePathsLocation};
pub use type_paths::{fetch_type_paths, session_type_paths};
