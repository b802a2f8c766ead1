//! Preview session
//!
//! Constructed once per preview invocation from the preview URL the content
//! editor opened, and passed explicitly to every preview operation.

use reqwest::Url;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use prismic_common::api::{PrismicClient, RawDocument};
use prismic_common::config::{Context, SourceOptions};
use prismic_common::normalize::Hooks;
use prismic_common::type_paths::type_paths_filename;
use prismic_common::{Error, Result};

/// Query parameter carrying the preview ref
pub const TOKEN_PARAM: &str = "token";

/// Query parameter carrying the previewed document's id
pub const DOCUMENT_ID_PARAM: &str = "documentId";

/// Where the build context published the type-path index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypePathsLocation {
    /// Site root; the index is served at `<root>/<file name>`
    Http(String),
    /// Local directory holding the index file
    Directory(PathBuf),
}

/// Maps the previewed document to the site path that displays it
pub trait PathResolver: Send + Sync {
    fn resolve(&self, document: &RawDocument) -> Option<String>;
}

impl<F> PathResolver for F
where
    F: Fn(&RawDocument) -> Option<String> + Send + Sync,
{
    fn resolve(&self, document: &RawDocument) -> Option<String> {
        self(document)
    }
}

/// Everything one preview needs
#[derive(Clone)]
pub struct PreviewSession {
    pub token: String,
    pub document_id: String,
    pub options: SourceOptions,
    /// Digest of the schema set the build compiled; names the index file
    pub schemas_digest: String,
    pub type_paths_location: TypePathsLocation,
    pub hooks: Hooks,
    pub path_resolver: Option<Arc<dyn PathResolver>>,
}

impl fmt::Debug for PreviewSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewSession")
            .field("document_id", &self.document_id)
            .field("schemas_digest", &self.schemas_digest)
            .field("type_paths_location", &self.type_paths_location)
            .field("path_resolver", &self.path_resolver.is_some())
            .finish_non_exhaustive()
    }
}

impl PreviewSession {
    /// Build a session from a preview URL (absolute, or just a path and query)
    pub fn from_url(
        preview_url: &str,
        options: SourceOptions,
        schemas_digest: impl Into<String>,
        type_paths_location: TypePathsLocation,
    ) -> Result<Self> {
        options.validate(Context::Preview)?;
        let (token, document_id) = preview_params(preview_url)?;

        Ok(Self {
            token,
            document_id,
            options,
            schemas_digest: schemas_digest.into(),
            type_paths_location,
            hooks: Hooks::default(),
            path_resolver: None,
        })
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_path_resolver(mut self, resolver: impl PathResolver + 'static) -> Self {
        self.path_resolver = Some(Arc::new(resolver));
        self
    }

    /// File name of the type-path index this session reads
    pub fn type_paths_filename(&self) -> String {
        type_paths_filename(&self.options.type_paths_prefix(), &self.schemas_digest)
    }

    /// Content API client querying the preview ref
    pub fn client(&self) -> Result<PrismicClient> {
        Ok(PrismicClient::from_options(&self.options)?.with_ref(self.token.clone()))
    }
}

fn preview_params(preview_url: &str) -> Result<(String, String)> {
    let url = match Url::parse(preview_url) {
        Ok(url) => url,
        Err(_) => Url::parse("http://localhost/")
            .and_then(|base| base.join(preview_url))
            .map_err(|e| Error::InvalidInput(format!("Invalid preview URL: {}", e)))?,
    };

    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, value)| key == name && !value.is_empty())
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| Error::InvalidInput(format!("Preview URL is missing `{}`", name)))
    };

    Ok((param(TOKEN_PARAM)?, param(DOCUMENT_ID_PARAM)?))
}
