//! Type registration sinks
//!
//! A sink receives the standard type definitions first, then the generated
//! composites and the document union. Registration is name-keyed downstream,
//! so the same schema set must always register the same names.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

use prismic_common::schema::standard::STANDARD_TYPES_SDL;
use prismic_common::schema::TypeDef;
use prismic_common::{CompiledSchemas, Result};

/// Accepts type definitions for registration
#[async_trait]
pub trait SchemaSink: Send + Sync {
    /// `standard_sdl` must be registered before any of `type_defs`
    async fn register(&self, standard_sdl: &str, type_defs: &[TypeDef]) -> Result<()>;
}

/// Register a compiled schema set with a sink
pub async fn register_types(sink: &dyn SchemaSink, compiled: &CompiledSchemas) -> Result<()> {
    sink.register(STANDARD_TYPES_SDL, &compiled.all_type_defs()).await
}

/// Writes every definition as SDL into one file
pub struct SdlFileSink {
    path: PathBuf,
}

impl SdlFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SchemaSink for SdlFileSink {
    async fn register(&self, standard_sdl: &str, type_defs: &[TypeDef]) -> Result<()> {
        let generated = prismic_common::schema::typedef::render_sdl(type_defs);
        let sdl = format!("{}\n\n{}", standard_sdl.trim_end(), generated);
        crate::writer::write_file(&self.path, sdl.as_bytes()).await?;

        info!(path = %self.path.display(), types = type_defs.len(), "Wrote schema definitions");
        Ok(())
    }
}

/// Keeps registered definitions in memory
#[derive(Default)]
pub struct MemorySink {
    registered: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered SDL chunks in registration order
    pub fn registered(&self) -> Vec<String> {
        self.registered.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SchemaSink for MemorySink {
    async fn register(&self, standard_sdl: &str, type_defs: &[TypeDef]) -> Result<()> {
        let mut registered = self.registered.lock().unwrap_or_else(|e| e.into_inner());
        registered.push(standard_sdl.to_string());
        registered.extend(type_defs.iter().map(TypeDef::to_sdl));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prismic_common::{compile_schemas, SchemaSet};
    use serde_json::json;

    fn compiled() -> CompiledSchemas {
        let schemas = SchemaSet::from_value(json!({"page": {"Main": {"title": {"type": "Text"}}}})).unwrap();
        compile_schemas(&schemas).unwrap()
    }

    #[tokio::test]
    async fn test_standard_types_register_first() {
        let sink = MemorySink::new();
        register_types(&sink, &compiled()).await.unwrap();

        let registered = sink.registered();
        assert_eq!(registered[0], STANDARD_TYPES_SDL);
        assert!(registered.last().unwrap().contains("union PrismicAllDocumentTypes"));
    }

    #[tokio::test]
    async fn test_sdl_file_sink_writes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("schema.graphql");
        register_types(&SdlFileSink::new(&path), &compiled()).await.unwrap();

        let sdl = std::fs::read_to_string(&path).unwrap();
        assert!(sdl.starts_with(STANDARD_TYPES_SDL.trim_end()));
        assert!(sdl.contains("type PrismicPage implements PrismicDocument & Node"));
        assert!(sdl.contains("type PrismicPageDataType"));
    }
}
