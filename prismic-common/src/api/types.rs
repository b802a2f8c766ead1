//! Content API payloads

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::node::{document_node_id, NodeId};

/// One document as returned by the content API
///
/// Only the keys the normalizer reads are typed; everything else (`uid`,
/// `href`, `tags`, publication dates, `lang`, alternate languages, ...) is
/// carried in `rest` untouched so the root node can reproduce the document
/// verbatim, including explicit nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default)]
    pub data: Value,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl RawDocument {
    /// Deterministic id of this document's root node
    pub fn node_id(&self) -> NodeId {
        document_node_id(&self.doc_type, &self.id)
    }

    pub fn uid(&self) -> Option<&str> {
        self.rest.get("uid").and_then(Value::as_str)
    }

    pub fn lang(&self) -> Option<&str> {
        self.rest.get("lang").and_then(Value::as_str)
    }

    pub fn href(&self) -> Option<&str> {
        self.rest.get("href").and_then(Value::as_str)
    }

    pub fn tags(&self) -> Vec<&str> {
        self.rest
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// API root response; only the refs are used
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRoot {
    #[serde(default)]
    pub refs: Vec<ApiRef>,
}

impl ApiRoot {
    /// The master (published content) ref
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRef {
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub is_master_ref: bool,
}

/// One page of a document search
#[derive(Debug, Clone, Deserialize)]
pub struct QueryPage {
    pub page: u32,
    pub results_per_page: u32,
    pub results_size: u32,
    pub total_results_size: u32,
    pub total_pages: u32,
    #[serde(default)]
    pub next_page: Option<String>,
    pub results: Vec<RawDocument>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_document_keeps_unknown_keys() {
        let raw = json!({
            "id": "x1",
            "uid": "home",
            "type": "page",
            "href": "https://repo.cdn.prismic.io/api/v2/documents/search?ref=r&q=x",
            "tags": ["a", "b"],
            "lang": "en-us",
            "first_publication_date": "2024-01-01T00:00:00+0000",
            "alternate_languages": [],
            "data": {"title": "Hi"}
        });
        let doc: RawDocument = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(doc.doc_type, "page");
        assert_eq!(doc.lang(), Some("en-us"));
        assert_eq!(doc.tags(), vec!["a", "b"]);
        assert_eq!(doc.to_value(), raw);
        assert_eq!(doc.node_id(), document_node_id("page", "x1"));
    }

    #[test]
    fn test_null_uid_is_kept() {
        let raw = json!({"id": "x1", "uid": null, "type": "article", "data": {}});
        let doc: RawDocument = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(doc.uid(), None);
        assert_eq!(doc.to_value(), raw);

        let bare = json!({"id": "x2", "type": "article", "data": {}});
        let doc: RawDocument = serde_json::from_value(bare.clone()).unwrap();
        assert_eq!(doc.to_value(), bare);
    }

    #[test]
    fn test_master_ref() {
        let root: ApiRoot = serde_json::from_value(json!({
            "refs": [
                {"id": "preview", "ref": "p1", "isMasterRef": false},
                {"id": "master", "ref": "m1", "label": "Master", "isMasterRef": true}
            ]
        }))
        .unwrap();
        assert_eq!(root.master_ref(), Some("m1"));
    }
}
