//! The type-path index
//!
//! An ordered list of `(path, type name)` records produced by the schema
//! compiler. It is the only contract between the build context, which has the
//! full schemas, and the preview context, which only has this artifact. The
//! persisted form is a JSON array of `{"path": [..], "type": ".."}` records,
//! named from the digest of the schema set it was compiled from.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::schema::standard::{IMAGE_TYPE, LINK_TYPE, STRUCTURED_TEXT_TYPE};
use crate::Result;

/// One `(path, type name)` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypePathEntry {
    pub path: Vec<String>,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl TypePathEntry {
    pub fn new(path: Vec<String>, type_name: impl Into<String>) -> Self {
        Self {
            path,
            type_name: type_name.into(),
        }
    }
}

/// How the normalizer must treat the value found at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind<'a> {
    StructuredText,
    Image,
    Link,
    /// List of group objects (`[...GroupType]`)
    Group,
    /// List of slice instances (`[...SlicesType]`)
    SliceZone,
    /// Anything else is passed through unchanged
    Other(&'a str),
}

impl<'a> PathKind<'a> {
    /// Recover the handling kind from a recorded type name
    pub fn from_type_name(type_name: &'a str) -> Self {
        match type_name {
            STRUCTURED_TEXT_TYPE => PathKind::StructuredText,
            IMAGE_TYPE => PathKind::Image,
            LINK_TYPE => PathKind::Link,
            t if is_list_ending_with(t, "GroupType") => PathKind::Group,
            t if is_list_ending_with(t, "SlicesType") => PathKind::SliceZone,
            t => PathKind::Other(t),
        }
    }
}

fn is_list_ending_with(type_name: &str, suffix: &str) -> bool {
    type_name
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .is_some_and(|inner| inner.ends_with(suffix))
}

/// Immutable, lookup-ready type-path index
#[derive(Debug, Clone, Default)]
pub struct TypePathIndex {
    entries: Vec<TypePathEntry>,
    by_path: HashMap<Vec<String>, usize>,
}

impl TypePathIndex {
    /// Build from entries in walk order; the first record for a path wins
    pub fn new(entries: Vec<TypePathEntry>) -> Self {
        let mut by_path = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            by_path.entry(entry.path.clone()).or_insert(i);
        }
        Self { entries, by_path }
    }

    pub fn entries(&self) -> &[TypePathEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Type name recorded for `path`
    pub fn type_name(&self, path: &[String]) -> Option<&str> {
        self.by_path
            .get(path)
            .map(|&i| self.entries[i].type_name.as_str())
    }

    /// Handling kind for `path`; unknown paths are `None`
    pub fn kind(&self, path: &[String]) -> Option<PathKind<'_>> {
        self.type_name(path).map(PathKind::from_type_name)
    }

    /// Persisted JSON form
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    /// Parse the persisted JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<TypePathEntry> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let entries: Vec<TypePathEntry> = serde_json::from_slice(bytes)?;
        Ok(Self::new(entries))
    }
}

/// File name of the persisted index for a schema digest
pub fn type_paths_filename(prefix: &str, schemas_digest: &str) -> String {
    format!("{}{}.json", prefix, schemas_digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_kind_from_type_name() {
        assert_eq!(PathKind::from_type_name("PrismicStructuredTextType"), PathKind::StructuredText);
        assert_eq!(PathKind::from_type_name("PrismicImageType"), PathKind::Image);
        assert_eq!(PathKind::from_type_name("PrismicLinkType"), PathKind::Link);
        assert_eq!(PathKind::from_type_name("[PrismicPageLinksGroupType]"), PathKind::Group);
        assert_eq!(PathKind::from_type_name("[PrismicPageBodySlicesType]"), PathKind::SliceZone);
        assert_eq!(PathKind::from_type_name("PrismicPageLinksGroupType"), PathKind::Other("PrismicPageLinksGroupType"));
        assert_eq!(PathKind::from_type_name("[PrismicPageBodyHeroItemType]"), PathKind::Other("[PrismicPageBodyHeroItemType]"));
        assert_eq!(PathKind::from_type_name("String"), PathKind::Other("String"));
    }

    #[test]
    fn test_lookup_first_entry_wins() {
        let index = TypePathIndex::new(vec![
            TypePathEntry::new(path(&["page", "data", "title"]), "String"),
            TypePathEntry::new(path(&["page", "data", "title"]), "Float"),
        ]);
        assert_eq!(index.type_name(&path(&["page", "data", "title"])), Some("String"));
        assert_eq!(index.kind(&path(&["page", "data", "missing"])), None);
    }

    #[test]
    fn test_json_shape() {
        let index = TypePathIndex::new(vec![TypePathEntry::new(path(&["page", "data", "hero"]), "PrismicImageType")]);
        assert_eq!(
            index.to_json().unwrap(),
            r#"[{"path":["page","data","hero"],"type":"PrismicImageType"}]"#
        );
        let parsed = TypePathIndex::from_json(&index.to_json().unwrap()).unwrap();
        assert_eq!(parsed.entries(), index.entries());
        assert_eq!(parsed.kind(&path(&["page", "data", "hero"])), Some(PathKind::Image));
    }

    #[test]
    fn test_filename() {
        assert_eq!(
            type_paths_filename("prismic-typepaths---repo-", "abc"),
            "prismic-typepaths---repo-abc.json"
        );
    }
}
