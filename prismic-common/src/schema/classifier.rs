//! Field classifier
//!
//! Maps one field schema to the type a reader sees and records, as a side
//! effect, the type-path entry for the field's position plus any composite
//! type the field needs. Composite kinds (groups, slices, slice zones) recurse
//! into their nested fields one path level deeper.

use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::warn;

use super::naming::{composite_type_name, relative_segments, TypeRole};
use super::standard::{
    DATE_TYPE, EMBED_TYPE, FLOAT_TYPE, GEO_POINT_TYPE, IMAGE_TYPE, LINK_TYPE, NODE_INTERFACE,
    RESERVED_TYPE_NAMES, STRING_TYPE, STRUCTURED_TEXT_TYPE,
};
use super::typedef::{list_of, FieldType, ObjectTypeDef, Resolver, TypeDef, UnionTypeDef};
use super::{FieldMap, FieldSchema};
use crate::type_paths::TypePathEntry;

const UID_DESCRIPTION: &str =
    "The document's unique identifier. Unique among all instances of the document's type.";

/// Accumulator threaded through one compilation
///
/// Collects generated type definitions and type-path entries in walk order,
/// remembers which path produced each composite name, and records name
/// collisions and dropped fields for the compiler to act on.
#[derive(Debug, Default)]
pub struct Classification {
    owner: String,
    type_defs: Vec<TypeDef>,
    type_paths: Vec<TypePathEntry>,
    origins: HashMap<String, String>,
    collisions: Vec<String>,
    dropped: Vec<String>,
}

impl Classification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content type subsequent classifications belong to
    pub fn begin_content_type(&mut self, content_type_id: &str) {
        self.owner = content_type_id.to_string();
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn type_defs(&self) -> &[TypeDef] {
        &self.type_defs
    }

    pub fn type_paths(&self) -> &[TypePathEntry] {
        &self.type_paths
    }

    /// Composite name collisions found so far
    pub fn collisions(&self) -> &[String] {
        &self.collisions
    }

    /// Slash-joined paths of fields dropped as unrecognized
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }

    pub(crate) fn enqueue_path(&mut self, path: Vec<String>, type_name: impl Into<String>) {
        self.type_paths.push(TypePathEntry::new(path, type_name));
    }

    /// Register a generated composite produced at `origin`
    pub(crate) fn enqueue_def(&mut self, def: TypeDef, origin: &[String]) {
        let origin = origin.join("/");
        let name = def.name().to_string();

        if RESERVED_TYPE_NAMES.contains(&name.as_str()) {
            self.collisions.push(format!(
                "composite type name `{}` generated at `{}` shadows a standard type",
                name, origin
            ));
        } else if let Some(previous) = self.origins.get(&name) {
            self.collisions.push(format!(
                "composite type name `{}` generated by both `{}` and `{}`",
                name, previous, origin
            ));
        } else {
            self.origins.insert(name, origin);
        }

        self.type_defs.push(def);
    }

    pub(crate) fn into_parts(self) -> (Vec<TypeDef>, Vec<TypePathEntry>) {
        (self.type_defs, self.type_paths)
    }
}

fn child_path(depth: &[String], segment: &str) -> Vec<String> {
    let mut path = Vec::with_capacity(depth.len() + 1);
    path.extend_from_slice(depth);
    path.push(segment.to_string());
    path
}

/// Classify one field located under `depth`
///
/// Returns `None` when the field is dropped (unrecognized kind); the field
/// then has neither a type-path entry nor a place in its parent composite.
pub fn classify(
    field_id: &str,
    field: &FieldSchema,
    depth: &[String],
    ctx: &mut Classification,
) -> Option<FieldType> {
    let path = child_path(depth, field_id);

    let field_type = match field {
        FieldSchema::Uid => {
            ctx.enqueue_path(path, STRING_TYPE);
            FieldType::named(STRING_TYPE).with_description(UID_DESCRIPTION)
        }
        FieldSchema::Color | FieldSchema::Select | FieldSchema::Text => scalar(ctx, path, STRING_TYPE),
        FieldSchema::StructuredText => scalar(ctx, path, STRUCTURED_TEXT_TYPE),
        FieldSchema::Number => scalar(ctx, path, FLOAT_TYPE),
        FieldSchema::Date | FieldSchema::Timestamp => scalar(ctx, path, DATE_TYPE),
        FieldSchema::GeoPoint => scalar(ctx, path, GEO_POINT_TYPE),
        FieldSchema::Embed => scalar(ctx, path, EMBED_TYPE),
        FieldSchema::Image => scalar(ctx, path, IMAGE_TYPE).with_resolver(Resolver::Image),
        FieldSchema::Link => scalar(ctx, path, LINK_TYPE).with_resolver(Resolver::Link),
        FieldSchema::Group { fields } => classify_group(fields, path, ctx),
        FieldSchema::Slice { primary, items } => classify_slice(primary, items, path, ctx),
        FieldSchema::Slices { choices } => classify_slice_zone(choices, path, ctx),
        FieldSchema::Unrecognized { kind } => {
            let origin = path.join("/");
            warn!(path = %origin, kind = %kind, "Unprocessed field kind; dropping field");
            ctx.dropped.push(origin);
            return None;
        }
    };

    Some(field_type)
}

fn scalar(ctx: &mut Classification, path: Vec<String>, type_name: &str) -> FieldType {
    ctx.enqueue_path(path, type_name);
    FieldType::named(type_name)
}

/// Classify every field of `fields` under `depth`, skipping dropped ones
pub fn classify_fields(
    fields: &FieldMap,
    depth: &[String],
    ctx: &mut Classification,
) -> IndexMap<String, FieldType> {
    fields
        .iter()
        .filter_map(|(id, field)| classify(id, field, depth, ctx).map(|t| (id.clone(), t)))
        .collect()
}

fn classify_group(fields: &FieldMap, path: Vec<String>, ctx: &mut Classification) -> FieldType {
    let name = composite_type_name(ctx.owner(), relative_segments(&path), TypeRole::Group);
    let subfields = classify_fields(fields, &path, ctx);

    ctx.enqueue_def(
        TypeDef::Object(ObjectTypeDef {
            name: name.clone(),
            fields: subfields,
            interfaces: Vec::new(),
        }),
        &path,
    );

    let list = list_of(&name);
    ctx.enqueue_path(path, list.clone());
    FieldType::named(list)
}

fn classify_slice(
    primary: &FieldMap,
    items: &FieldMap,
    path: Vec<String>,
    ctx: &mut Classification,
) -> FieldType {
    let segments = relative_segments(&path).to_vec();

    let mut slice_fields = IndexMap::new();
    slice_fields.insert("id".to_string(), FieldType::named(STRING_TYPE));
    slice_fields.insert("slice_type".to_string(), FieldType::named(STRING_TYPE));

    if !primary.is_empty() {
        let primary_path = child_path(&path, "primary");
        let name = composite_type_name(ctx.owner(), &segments, TypeRole::SlicePrimary);
        let fields = classify_fields(primary, &primary_path, ctx);
        ctx.enqueue_def(
            TypeDef::Object(ObjectTypeDef {
                name: name.clone(),
                fields,
                interfaces: Vec::new(),
            }),
            &primary_path,
        );
        ctx.enqueue_path(primary_path, name.clone());
        slice_fields.insert("primary".to_string(), FieldType::named(name));
    }

    if !items.is_empty() {
        let items_path = child_path(&path, "items");
        let name = composite_type_name(ctx.owner(), &segments, TypeRole::SliceItem);
        let fields = classify_fields(items, &items_path, ctx);
        ctx.enqueue_def(
            TypeDef::Object(ObjectTypeDef {
                name: name.clone(),
                fields,
                interfaces: Vec::new(),
            }),
            &items_path,
        );
        let list = list_of(&name);
        ctx.enqueue_path(items_path, list.clone());
        slice_fields.insert("items".to_string(), FieldType::named(list));
    }

    let name = composite_type_name(ctx.owner(), &segments, TypeRole::Slice);
    ctx.enqueue_def(
        TypeDef::Object(ObjectTypeDef {
            name: name.clone(),
            fields: slice_fields,
            interfaces: vec![NODE_INTERFACE.to_string()],
        }),
        &path,
    );
    ctx.enqueue_path(path, name.clone());
    FieldType::named(name)
}

fn classify_slice_zone(choices: &FieldMap, path: Vec<String>, ctx: &mut Classification) -> FieldType {
    let mut members = Vec::with_capacity(choices.len());
    for (choice_id, choice) in choices {
        if !matches!(choice, FieldSchema::Slice { .. }) {
            warn!(
                path = %path.join("/"),
                choice = %choice_id,
                kind = %choice.kind_name(),
                "Slice zone choice is not a slice; dropping choice"
            );
            ctx.dropped.push(child_path(&path, choice_id).join("/"));
            continue;
        }
        if let Some(field_type) = classify(choice_id, choice, &path, ctx) {
            members.push(field_type.type_name);
        }
    }

    let name = composite_type_name(ctx.owner(), relative_segments(&path), TypeRole::SliceZone);
    ctx.enqueue_def(
        TypeDef::Union(UnionTypeDef {
            name: name.clone(),
            types: members,
        }),
        &path,
    );

    let list = list_of(&name);
    ctx.enqueue_path(path, list.clone());
    FieldType::named(list).with_resolver(Resolver::Slices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn depth(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    fn ctx_for(owner: &str) -> Classification {
        let mut ctx = Classification::new();
        ctx.begin_content_type(owner);
        ctx
    }

    #[test]
    fn test_scalar_kinds() {
        let mut ctx = ctx_for("page");
        let data = depth(&["page", "data"]);
        let cases = [
            (FieldSchema::Text, "String"),
            (FieldSchema::Color, "String"),
            (FieldSchema::Select, "String"),
            (FieldSchema::StructuredText, "PrismicStructuredTextType"),
            (FieldSchema::Number, "Float"),
            (FieldSchema::Date, "Date"),
            (FieldSchema::Timestamp, "Date"),
            (FieldSchema::GeoPoint, "PrismicGeoPointType"),
            (FieldSchema::Embed, "PrismicEmbedType"),
        ];
        for (field, expected) in cases {
            let t = classify("f", &field, &data, &mut ctx).unwrap();
            assert_eq!(t.type_name, expected);
            assert_eq!(t.resolver, None);
        }
        assert_eq!(ctx.type_paths().len(), 9);
        assert!(ctx.type_defs().is_empty());
    }

    #[test]
    fn test_image_and_link_carry_resolvers() {
        let mut ctx = ctx_for("page");
        let data = depth(&["page", "data"]);
        let image = classify("hero", &FieldSchema::Image, &data, &mut ctx).unwrap();
        let link = classify("cta", &FieldSchema::Link, &data, &mut ctx).unwrap();
        assert_eq!(image.resolver, Some(Resolver::Image));
        assert_eq!(link.resolver, Some(Resolver::Link));
        assert_eq!(
            ctx.type_paths(),
            &[
                TypePathEntry::new(depth(&["page", "data", "hero"]), "PrismicImageType"),
                TypePathEntry::new(depth(&["page", "data", "cta"]), "PrismicLinkType"),
            ]
        );
    }

    #[test]
    fn test_group_generates_list_composite() {
        let mut ctx = ctx_for("page");
        let field = FieldSchema::from_value(
            "page/links",
            &json!({"type": "Group", "config": {"fields": {
                "label": {"type": "Text"},
                "target": {"type": "Link"}
            }}}),
        )
        .unwrap();

        let t = classify("links", &field, &depth(&["page", "data"]), &mut ctx).unwrap();
        assert_eq!(t.type_name, "[PrismicPageLinksGroupType]");

        let paths: Vec<(String, &str)> = ctx
            .type_paths()
            .iter()
            .map(|e| (e.path.join("/"), e.type_name.as_str()))
            .collect();
        assert_eq!(
            paths,
            vec![
                ("page/data/links/label".to_string(), "String"),
                ("page/data/links/target".to_string(), "PrismicLinkType"),
                ("page/data/links".to_string(), "[PrismicPageLinksGroupType]"),
            ]
        );

        let TypeDef::Object(def) = &ctx.type_defs()[0] else { panic!("expected object") };
        assert_eq!(def.name, "PrismicPageLinksGroupType");
        assert_eq!(def.fields.keys().collect::<Vec<_>>(), vec!["label", "target"]);
    }

    #[test]
    fn test_slice_zone() {
        let mut ctx = ctx_for("page");
        let field = FieldSchema::from_value(
            "page/body",
            &json!({"type": "Slices", "config": {"choices": {
                "hero": {
                    "type": "Slice",
                    "non-repeat": {"heading": {"type": "StructuredText"}},
                    "repeat": {"photo": {"type": "Image"}}
                },
                "divider": {"type": "Slice"}
            }}}),
        )
        .unwrap();

        let t = classify("body", &field, &depth(&["page", "data"]), &mut ctx).unwrap();
        assert_eq!(t.type_name, "[PrismicPageBodySlicesType]");
        assert_eq!(t.resolver, Some(Resolver::Slices));

        let names: Vec<&str> = ctx.type_defs().iter().map(TypeDef::name).collect();
        assert_eq!(
            names,
            vec![
                "PrismicPageBodyHeroPrimaryType",
                "PrismicPageBodyHeroItemType",
                "PrismicPageBodyHero",
                "PrismicPageBodyDivider",
                "PrismicPageBodySlicesType",
            ]
        );

        let TypeDef::Union(zone) = ctx.type_defs().last().unwrap() else { panic!("expected union") };
        assert_eq!(zone.types, vec!["PrismicPageBodyHero", "PrismicPageBodyDivider"]);

        let TypeDef::Object(hero) = &ctx.type_defs()[2] else { panic!("expected object") };
        assert!(hero.interfaces.contains(&"Node".to_string()));
        assert_eq!(hero.fields["primary"].type_name, "PrismicPageBodyHeroPrimaryType");
        assert_eq!(hero.fields["items"].type_name, "[PrismicPageBodyHeroItemType]");

        let TypeDef::Object(divider) = &ctx.type_defs()[3] else { panic!("expected object") };
        assert!(!divider.fields.contains_key("primary"));
        assert!(!divider.fields.contains_key("items"));

        let paths: Vec<String> = ctx.type_paths().iter().map(|e| e.path.join("/")).collect();
        assert!(paths.contains(&"page/data/body/hero/primary/heading".to_string()));
        assert!(paths.contains(&"page/data/body/hero/items/photo".to_string()));
        assert!(paths.contains(&"page/data/body/hero/primary".to_string()));
        assert!(paths.contains(&"page/data/body/hero/items".to_string()));
        assert_eq!(paths.last().unwrap(), "page/data/body");
    }

    #[test]
    fn test_unrecognized_kind_is_dropped() {
        let mut ctx = ctx_for("page");
        let field = FieldSchema::Unrecognized { kind: "IntegrationFields".to_string() };
        assert!(classify("mystery", &field, &depth(&["page", "data"]), &mut ctx).is_none());
        assert!(ctx.type_paths().is_empty());
        assert_eq!(ctx.dropped(), &["page/data/mystery".to_string()]);
    }

    #[test]
    fn test_unrecognized_nested_field_omitted_from_group() {
        let mut ctx = ctx_for("page");
        let field = FieldSchema::from_value(
            "page/g",
            &json!({"type": "Group", "config": {"fields": {
                "ok": {"type": "Number"},
                "bad": {"type": "Nope"}
            }}}),
        )
        .unwrap();
        classify("g", &field, &depth(&["page", "data"]), &mut ctx).unwrap();
        let TypeDef::Object(def) = &ctx.type_defs()[0] else { panic!("expected object") };
        assert_eq!(def.fields.keys().collect::<Vec<_>>(), vec!["ok"]);
    }

    #[test]
    fn test_name_collision_is_recorded() {
        let mut ctx = ctx_for("blog_post");
        let group = FieldSchema::Group { fields: FieldMap::new() };
        classify("items", &group, &depth(&["blog_post", "data"]), &mut ctx);
        ctx.begin_content_type("blogPost");
        classify("items", &group, &depth(&["blogPost", "data"]), &mut ctx);
        assert_eq!(ctx.collisions().len(), 1);
        assert!(ctx.collisions()[0].contains("PrismicBlogPostItemsGroupType"));
    }
}
