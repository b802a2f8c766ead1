//! Rich-text fields: `{html, text, raw}`

use serde_json::{json, Value};

use super::{FieldContext, NormalizationContext};
use crate::api::RawDocument;
use crate::rich_text::{as_html, as_text};

/// `raw` is the untouched input so consumers can re-render with other hooks
pub fn normalize_structured_text(
    field_id: &str,
    value: &Value,
    doc: &RawDocument,
    ctx: &NormalizationContext,
) -> Value {
    let field = FieldContext { document: doc, field: field_id };
    let html = as_html(
        value,
        |link| ctx.hooks.document_url(&field, link),
        |element, children| ctx.hooks.serialize_html(&field, element, children),
    );

    json!({
        "html": html,
        "text": as_text(value),
        "raw": value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Hooks;
    use crate::rich_text::Element;
    use crate::store::NodeStore;
    use crate::type_paths::TypePathIndex;
    use std::sync::Arc;

    #[test]
    fn test_hooks_see_the_field_context() {
        let doc: RawDocument =
            serde_json::from_value(json!({"id": "x1", "type": "page", "data": {}})).unwrap();
        let hooks = Hooks::default()
            .with_link_resolver(|ctx: &FieldContext<'_>, link: &Value| {
                Some(format!("/{}/{}", ctx.document.id, link["uid"].as_str().unwrap_or("")))
            })
            .with_html_serializer(|ctx: &FieldContext<'_>, element: &Element<'_>, children: &str| {
                (element.kind == "paragraph").then(|| format!("<p data-field=\"{}\">{}</p>", ctx.field, children))
            });
        let ctx = NormalizationContext::new(Arc::new(TypePathIndex::default()), Arc::new(NodeStore::new()))
            .with_hooks(hooks);

        let value = json!([{
            "type": "paragraph",
            "text": "go home",
            "spans": [{"type": "hyperlink", "start": 3, "end": 7, "data": {"link_type": "Document", "id": "h", "uid": "home"}}]
        }]);
        let normalized = normalize_structured_text("body", &value, &doc, &ctx);

        assert_eq!(normalized["html"], json!("<p data-field=\"body\">go <a href=\"/x1/home\">home</a></p>"));
        assert_eq!(normalized["text"], json!("go home"));
        assert_eq!(normalized["raw"], value);
    }
}
