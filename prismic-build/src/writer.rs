//! Build artifacts on disk
//!
//! Every file is written to a temporary sibling and renamed into place, so a
//! preview reading the type-path index never sees a partial file.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use prismic_common::type_paths::type_paths_filename;
use prismic_common::{Node, Result, TypePathIndex};

/// Default name of the node output file
pub const NODES_FILE_NAME: &str = "nodes.json";

/// Default name of the SDL output file
pub const SCHEMA_FILE_NAME: &str = "schema.graphql";

/// Write `bytes` to `path`, creating parent directories
pub async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;

    debug!(path = %path.display(), bytes = bytes.len(), "Wrote file");
    Ok(())
}

/// Serialize `value` as pretty JSON into `path`
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    write_file(path, &json).await
}

/// Persist the type-path index as `<dir>/<prefix><digest>.json`
pub async fn write_type_paths(
    dir: &Path,
    prefix: &str,
    schemas_digest: &str,
    index: &TypePathIndex,
) -> Result<PathBuf> {
    let path = dir.join(type_paths_filename(prefix, schemas_digest));
    write_file(&path, index.to_json()?.as_bytes()).await?;
    Ok(path)
}

/// Persist nodes as a JSON array in store insertion order
pub async fn write_nodes(path: &Path, nodes: &[Arc<Node>]) -> Result<()> {
    let values: Vec<serde_json::Value> = nodes.iter().map(|node| node.to_value()).collect();
    write_json(path, &values).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use prismic_common::create_node_id;
    use prismic_common::type_paths::TypePathEntry;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_type_paths_file_is_named_by_digest() {
        let dir = tempfile::tempdir().unwrap();
        let index = TypePathIndex::new(vec![TypePathEntry::new(
            vec!["page".to_string(), "data".to_string(), "title".to_string()],
            "String",
        )]);

        let path = write_type_paths(dir.path(), "typepaths-", "abc123", &index).await.unwrap();
        assert_eq!(path, dir.path().join("typepaths-abc123.json"));

        let parsed = TypePathIndex::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(parsed.entries(), index.entries());
        assert!(!dir.path().join("typepaths-abc123.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_nodes_written_as_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join(NODES_FILE_NAME);
        let Value::Object(fields) = json!({"title": "Hi"}) else { unreachable!() };
        let node = Arc::new(Node::new(create_node_id("page x1"), fields, "PrismicPage", "d"));

        write_nodes(&path, &[node.clone()]).await.unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written[0]["id"], json!(node.id.to_string()));
        assert_eq!(written[0]["internal"]["type"], json!("PrismicPage"));
    }
}
