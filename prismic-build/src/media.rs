//! Remote media download
//!
//! Images are downloaded once per URL into the cache directory, named by the
//! SHA-256 of the URL so repeated builds reuse earlier downloads. Each
//! materialized asset becomes a `File` node whose id derives from the URL.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{OnceCell, Semaphore};
use tracing::{debug, info};

use prismic_common::digest::sha256_hex;
use prismic_common::normalize::MediaMaterializer;
use prismic_common::{create_node_id, Error, Node, NodeId, Result};

/// Node type of materialized assets
pub const FILE_NODE_TYPE: &str = "File";

const DEFAULT_EXTENSION: &str = "bin";
const DOWNLOAD_TIMEOUT_SECS: u64 = 60;

/// Downloads remote assets into a local cache directory
pub struct RemoteFileMaterializer {
    http_client: reqwest::Client,
    cache_dir: PathBuf,
    permits: Semaphore,
    downloads: Mutex<HashMap<String, Arc<OnceCell<PathBuf>>>>,
}

impl RemoteFileMaterializer {
    /// `max_concurrent` bounds simultaneous downloads
    pub fn new(cache_dir: impl Into<PathBuf>, max_concurrent: usize) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Fetch(e.to_string()))?;

        Ok(Self {
            http_client,
            cache_dir: cache_dir.into(),
            permits: Semaphore::new(max_concurrent.max(1)),
            downloads: Mutex::new(HashMap::new()),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Cache location for `url`
    pub fn cache_path(&self, url: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{}", sha256_hex(url.as_bytes()), file_extension(url)))
    }

    fn download_cell(&self, url: &str) -> Arc<OnceCell<PathBuf>> {
        let mut downloads = self.downloads.lock().unwrap_or_else(|e| e.into_inner());
        downloads.entry(url.to_string()).or_default().clone()
    }

    /// Local path of `url`, downloading it unless already cached
    pub async fn fetch(&self, url: &str) -> Result<PathBuf> {
        let cell = self.download_cell(url);
        cell.get_or_try_init(|| self.download(url)).await.cloned()
    }

    async fn download(&self, url: &str) -> Result<PathBuf> {
        let path = self.cache_path(url);
        if tokio::fs::try_exists(&path).await? {
            debug!(url = %url, path = %path.display(), "Reusing cached file");
            return Ok(path);
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("{}: HTTP {}", url, status.as_u16())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Fetch(format!("{}: {}", url, e)))?;

        crate::writer::write_file(&path, &bytes).await?;
        info!(url = %url, bytes = bytes.len(), "Downloaded file");
        Ok(path)
    }
}

#[async_trait]
impl MediaMaterializer for RemoteFileMaterializer {
    async fn materialize(&self, url: &str, parent: NodeId) -> Result<Node> {
        let path = self.fetch(url).await?;
        let bytes = tokio::fs::read(&path).await?;
        let absolute = tokio::fs::canonicalize(&path).await.unwrap_or_else(|_| path.clone());

        let mut fields = Map::new();
        fields.insert("url".to_string(), Value::String(url.to_string()));
        fields.insert(
            "absolutePath".to_string(),
            Value::String(absolute.to_string_lossy().into_owned()),
        );
        fields.insert("extension".to_string(), Value::String(file_extension(url)));
        fields.insert("size".to_string(), Value::from(bytes.len()));
        fields.insert("parent".to_string(), parent.into());

        Ok(Node::new(
            create_node_id(&format!("File {}", url)),
            fields,
            FILE_NODE_TYPE,
            sha256_hex(&bytes),
        ))
    }
}

/// Lower-cased extension of the URL's last path segment
fn file_extension(url: &str) -> String {
    let path = reqwest::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.split(['?', '#']).next().unwrap_or_default().to_string());

    path.rsplit('/')
        .next()
        .and_then(|segment| segment.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
