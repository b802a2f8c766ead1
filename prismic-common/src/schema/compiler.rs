//! Schema-to-type-path compiler
//!
//! Walks every content type of a schema set through the field classifier and
//! produces the generated type descriptions, the ordered type-path entries and
//! the document union that link fields resolve to.

use indexmap::IndexMap;
use tracing::{debug, info};

use super::classifier::{classify, Classification};
use super::naming::{composite_type_name, TypeRole};
use super::standard::{ALL_DOCUMENT_TYPES, DATE_TYPE, DOCUMENT_INTERFACE, NODE_INTERFACE};
use super::typedef::{render_sdl, FieldType, ObjectTypeDef, TypeDef, UnionTypeDef};
use super::{ContentTypeSchema, SchemaSet, UID_FIELD};
use crate::type_paths::{TypePathEntry, TypePathIndex};
use crate::{Error, Result};

/// Output of one compilation
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSchemas {
    /// Generated composites in walk order
    pub type_defs: Vec<TypeDef>,
    /// Type-path entries in walk order
    pub type_paths: Vec<TypePathEntry>,
    /// Union of every generated document type
    pub document_union: UnionTypeDef,
}

impl CompiledSchemas {
    /// Lookup-ready index over [`Self::type_paths`]
    pub fn index(&self) -> TypePathIndex {
        TypePathIndex::new(self.type_paths.clone())
    }

    /// Generated definitions followed by the document union
    pub fn all_type_defs(&self) -> Vec<TypeDef> {
        let mut defs = self.type_defs.clone();
        defs.push(TypeDef::Union(self.document_union.clone()));
        defs
    }

    /// SDL for every generated definition, standard types excluded
    pub fn to_sdl(&self) -> String {
        render_sdl(&self.all_type_defs())
    }
}

/// Compile a schema set
///
/// Fails with [`Error::Schema`] when two distinct paths generate the same
/// composite name, or a generated name shadows a standard type. Unrecognized
/// field kinds are not errors; they are dropped with a warning.
pub fn compile_schemas(schemas: &SchemaSet) -> Result<CompiledSchemas> {
    let mut ctx = Classification::new();
    for schema in schemas.iter() {
        compile_content_type(schema, &mut ctx);
    }

    if !ctx.collisions().is_empty() {
        return Err(Error::Schema(ctx.collisions().join(", ")));
    }

    let dropped = ctx.dropped().len();
    let (type_defs, type_paths) = ctx.into_parts();
    let document_union = document_union(&type_defs);

    info!(
        content_types = schemas.len(),
        type_defs = type_defs.len(),
        type_paths = type_paths.len(),
        dropped_fields = dropped,
        "Compiled schemas"
    );

    Ok(CompiledSchemas {
        type_defs,
        type_paths,
        document_union,
    })
}

fn compile_content_type(schema: &ContentTypeSchema, ctx: &mut Classification) {
    ctx.begin_content_type(&schema.id);
    debug!(content_type = %schema.id, fields = schema.fields.len(), "Compiling content type");

    let root = vec![schema.id.clone()];
    let uid = schema
        .uid_field()
        .and_then(|field| classify(UID_FIELD, field, &root, ctx));

    let data_path = vec![schema.id.clone(), "data".to_string()];
    let data_fields: IndexMap<String, FieldType> = schema
        .data_fields()
        .filter_map(|(id, field)| classify(id, field, &data_path, ctx).map(|t| (id.clone(), t)))
        .collect();

    let data_name = composite_type_name::<&str>(&schema.id, &[], TypeRole::Data);
    ctx.enqueue_def(
        TypeDef::Object(ObjectTypeDef {
            name: data_name.clone(),
            fields: data_fields,
            interfaces: Vec::new(),
        }),
        &data_path,
    );
    ctx.enqueue_path(data_path, data_name.clone());

    let doc_name = composite_type_name::<&str>(&schema.id, &[], TypeRole::Document);
    ctx.enqueue_def(
        TypeDef::Object(ObjectTypeDef {
            name: doc_name.clone(),
            fields: document_fields(data_name, uid),
            interfaces: vec![DOCUMENT_INTERFACE.to_string(), NODE_INTERFACE.to_string()],
        }),
        &root,
    );
    ctx.enqueue_path(root, doc_name);
}

fn document_fields(data_name: String, uid: Option<FieldType>) -> IndexMap<String, FieldType> {
    let mut fields = IndexMap::new();
    fields.insert(
        "data".to_string(),
        FieldType::named(data_name).with_description("The document's data fields."),
    );
    fields.insert(
        "dataRaw".to_string(),
        FieldType::named("JSON!").with_description(
            "The document's data object without transformations exactly as it comes from the content API.",
        ),
    );
    fields.insert(
        "dataString".to_string(),
        FieldType::named("String!")
            .with_description("The document's data object without transformations. The object is stringified via `JSON.stringify` to eliminate the need to declare subfields.")
            .deprecated("Use `dataRaw` instead which returns JSON."),
    );
    fields.insert(
        "first_publication_date".to_string(),
        FieldType::named(format!("{}!", DATE_TYPE))
            .with_description("The document's initial publication date."),
    );
    fields.insert(
        "href".to_string(),
        FieldType::named("String!").with_description("The document's content API URL."),
    );
    fields.insert(
        "id".to_string(),
        FieldType::named("ID!").with_description("Globally unique identifier. Note that this differs from the `prismicId` field."),
    );
    fields.insert(
        "lang".to_string(),
        FieldType::named("String!").with_description("The document's language."),
    );
    fields.insert(
        "last_publication_date".to_string(),
        FieldType::named(format!("{}!", DATE_TYPE))
            .with_description("The document's most recent publication date"),
    );
    fields.insert(
        "tags".to_string(),
        FieldType::named("[String!]!").with_description("The document's list of tags."),
    );
    fields.insert(
        "type".to_string(),
        FieldType::named("String!").with_description("The document's content type ID."),
    );
    fields.insert(
        "prismicId".to_string(),
        FieldType::named("ID!").with_description("The document's ID in the content API."),
    );
    if let Some(uid) = uid {
        fields.insert(UID_FIELD.to_string(), uid);
    }
    fields
}

/// Union of every definition that declares the document interface
///
/// Membership is read from declared interfaces, never from names.
pub fn document_union(type_defs: &[TypeDef]) -> UnionTypeDef {
    UnionTypeDef {
        name: ALL_DOCUMENT_TYPES.to_string(),
        types: type_defs
            .iter()
            .filter(|def| def.implements(DOCUMENT_INTERFACE))
            .map(|def| def.name().to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_paths::PathKind;
    use serde_json::json;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    fn page_schemas() -> SchemaSet {
        SchemaSet::from_value(json!({
            "page": {
                "Main": {
                    "uid": {"type": "UID"},
                    "title": {"type": "Text"},
                    "body": {"type": "StructuredText"},
                    "hero": {"type": "Image"}
                }
            },
            "article": {
                "Main": {
                    "related": {"type": "Link"},
                    "sections": {"type": "Slices", "config": {"choices": {
                        "quote": {"type": "Slice", "non-repeat": {"text": {"type": "StructuredText"}}}
                    }}}
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_page_scenario_type_paths() {
        let compiled = compile_schemas(&page_schemas()).unwrap();
        let index = compiled.index();

        assert_eq!(index.type_name(&path(&["page", "data", "title"])), Some("String"));
        assert_eq!(index.kind(&path(&["page", "data", "body"])), Some(PathKind::StructuredText));
        assert_eq!(index.kind(&path(&["page", "data", "hero"])), Some(PathKind::Image));
        assert_eq!(index.type_name(&path(&["page", "uid"])), Some("String"));
        assert_eq!(index.type_name(&path(&["page", "data", "uid"])), None);
        assert_eq!(index.type_name(&path(&["page", "data"])), Some("PrismicPageDataType"));
        assert_eq!(index.type_name(&path(&["page"])), Some("PrismicPage"));
        assert_eq!(
            index.kind(&path(&["article", "data", "sections"])),
            Some(PathKind::SliceZone)
        );
    }

    #[test]
    fn test_compile_is_deterministic() {
        let a = compile_schemas(&page_schemas()).unwrap();
        let b = compile_schemas(&page_schemas()).unwrap();
        assert_eq!(a.index().to_json().unwrap(), b.index().to_json().unwrap());
        assert_eq!(a.to_sdl(), b.to_sdl());
    }

    #[test]
    fn test_document_composite() {
        let compiled = compile_schemas(&page_schemas()).unwrap();
        let page = compiled
            .type_defs
            .iter()
            .find(|d| d.name() == "PrismicPage")
            .unwrap();
        let TypeDef::Object(page) = page else { panic!("expected object") };

        assert_eq!(page.interfaces, vec!["PrismicDocument", "Node"]);
        assert_eq!(page.fields["data"].type_name, "PrismicPageDataType");
        assert_eq!(page.fields["tags"].type_name, "[String!]!");
        assert!(page.fields["dataString"].deprecation_reason.is_some());
        assert!(page.fields["uid"].description.is_some());

        let article = compiled
            .type_defs
            .iter()
            .find(|d| d.name() == "PrismicArticle")
            .unwrap();
        let TypeDef::Object(article) = article else { panic!("expected object") };
        assert!(!article.fields.contains_key("uid"));
    }

    #[test]
    fn test_document_union_follows_interface() {
        let compiled = compile_schemas(&page_schemas()).unwrap();
        assert_eq!(compiled.document_union.name, "PrismicAllDocumentTypes");
        assert_eq!(compiled.document_union.types, vec!["PrismicPage", "PrismicArticle"]);

        // Slices implement Node but are not documents
        assert!(compiled
            .type_defs
            .iter()
            .any(|d| d.name() == "PrismicArticleSectionsQuote" && d.implements("Node")));
        assert!(!compiled
            .document_union
            .types
            .contains(&"PrismicArticleSectionsQuote".to_string()));
    }

    #[test]
    fn test_unrecognized_field_does_not_fail_compilation() {
        let schemas = SchemaSet::from_value(json!({
            "page": {"Main": {"title": {"type": "Text"}, "odd": {"type": "Hologram"}}}
        }))
        .unwrap();
        let compiled = compile_schemas(&schemas).unwrap();
        let index = compiled.index();
        assert_eq!(index.type_name(&path(&["page", "data", "odd"])), None);
        assert_eq!(index.type_name(&path(&["page", "data", "title"])), Some("String"));
    }

    #[test]
    fn test_colliding_content_types_are_rejected() {
        let schemas = SchemaSet::from_value(json!({
            "blog_post": {"Main": {"title": {"type": "Text"}}},
            "blogPost": {"Main": {"title": {"type": "Text"}}}
        }))
        .unwrap();
        let err = compile_schemas(&schemas).unwrap_err();
        let Error::Schema(msg) = err else { panic!("expected schema error") };
        assert!(msg.contains("PrismicBlogPost"));
        assert!(msg.contains("blog_post"));
        assert!(msg.contains("blogPost"));
    }

    #[test]
    fn test_standard_name_shadowing_is_rejected() {
        let schemas = SchemaSet::from_value(json!({
            "image_type": {"Main": {"title": {"type": "Text"}}}
        }))
        .unwrap();
        let err = compile_schemas(&schemas).unwrap_err();
        assert!(matches!(err, Error::Schema(msg) if msg.contains("PrismicImageType")));
    }

    #[test]
    fn test_sdl_contains_generated_types() {
        let sdl = compile_schemas(&page_schemas()).unwrap().to_sdl();
        assert!(sdl.contains("type PrismicPage implements PrismicDocument & Node {"));
        assert!(sdl.contains("union PrismicArticleSectionsSlicesType = PrismicArticleSectionsQuote"));
        assert!(sdl.contains("union PrismicAllDocumentTypes = PrismicPage | PrismicArticle"));
        assert!(sdl.contains("# resolver: slices"));
    }
}
