//! Content API access
//!
//! Only the build and preview entry points talk to the network; the
//! normalizer sees the API through [`crate::normalize::DocumentSource`].

pub mod client;
pub mod types;

pub use client::{ApiError, ClientOptions, PrismicClient, PAGE_SIZE};
pub use types::{ApiRef, ApiRoot, QueryPage, RawDocument};
