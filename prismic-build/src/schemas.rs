//! Schema loading from disk
//!
//! One `<contentTypeId>.json` file per content type. Files are read in name
//! order so the compiled output does not depend on directory iteration order.

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use prismic_common::schema::ContentTypeSchema;
use prismic_common::{Error, Result, SchemaSet};

/// Load every schema file in `dir`
pub async fn load_schemas(dir: &Path) -> Result<SchemaSet> {
    let mut files = schema_files(dir).await?;
    if files.is_empty() {
        return Err(Error::Config(format!("No schema files found in {}", dir.display())));
    }
    files.sort();

    let mut schemas = SchemaSet::new();
    for path in files {
        let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        let content = tokio::fs::read_to_string(&path).await?;
        let raw: Value = serde_json::from_str(&content)
            .map_err(|e| Error::Schema(format!("{}: {}", path.display(), e)))?;

        debug!(content_type = %id, path = %path.display(), "Loaded schema");
        schemas.insert(ContentTypeSchema::from_value(id, raw)?);
    }

    info!(count = schemas.len(), dir = %dir.display(), "Loaded schemas");
    Ok(schemas)
}

async fn schema_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| Error::Config(format!("Cannot read schemas_dir {}: {}", dir.display(), e)))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loads_json_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page.json"), r#"{"Main": {"title": {"type": "Text"}}}"#).unwrap();
        std::fs::write(dir.path().join("article.json"), r#"{"Main": {"body": {"type": "StructuredText"}}}"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let schemas = load_schemas(dir.path()).await.unwrap();
        let ids: Vec<&str> = schemas.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["article", "page"]);
    }

    #[tokio::test]
    async fn test_empty_dir_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_schemas(dir.path()).await, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_invalid_json_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();

        let Err(Error::Schema(msg)) = load_schemas(dir.path()).await else {
            panic!("expected schema error");
        };
        assert!(msg.contains("broken.json"));
    }
}
