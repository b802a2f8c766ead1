//! Type-path index retrieval
//!
//! The preview context never sees the schema set. It reads the index the
//! build context persisted, addressed by the schema digest.

use std::time::Duration;
use tracing::{debug, info};

use prismic_common::{Error, Result, TypePathIndex};

use crate::session::{PreviewSession, TypePathsLocation};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Load the index named `file_name` from `location`
pub async fn fetch_type_paths(location: &TypePathsLocation, file_name: &str) -> Result<TypePathIndex> {
    let bytes = match location {
        TypePathsLocation::Http(root) => {
            let url = format!("{}/{}", root.trim_end_matches('/'), file_name);
            debug!(url = %url, "Fetching type paths");
            fetch_bytes(&url).await?
        }
        TypePathsLocation::Directory(dir) => {
            let path = dir.join(file_name);
            debug!(path = %path.display(), "Reading type paths");
            tokio::fs::read(&path).await.map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::NotFound(format!("type paths file {}", path.display())),
                _ => Error::Io(e),
            })?
        }
    };

    let index = TypePathIndex::from_slice(&bytes)?;
    info!(entries = index.len(), file = %file_name, "Loaded type paths");
    Ok(index)
}

/// The index a session reads
pub async fn session_type_paths(session: &PreviewSession) -> Result<TypePathIndex> {
    fetch_type_paths(&session.type_paths_location, &session.type_paths_filename()).await
}

async fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| Error::Fetch(e.to_string()))?;

    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| Error::Fetch(format!("{}: {}", url, e)))?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(Error::NotFound(format!("type paths at {}", url)));
    }
    if !status.is_success() {
        return Err(Error::Fetch(format!("{}: HTTP {}", url, status.as_u16())));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Fetch(format!("{}: {}", url, e)))?;
    Ok(bytes.to_vec())
}
