//! Deterministic composite type naming
//!
//! Schema registration downstream is keyed by name, so the same composite
//! shape must get the same name on every rebuild. Names are a pure function of
//! `(owner content type, path segments, role)`.

/// Prefix shared by every generated name
pub const NAME_PREFIX: &str = "Prismic";

/// What a generated composite represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeRole {
    /// Top-level document type, e.g. `PrismicPage`
    Document,
    /// The document's `data` object
    Data,
    /// A repeatable group
    Group,
    /// A slice variant's non-repeating fields
    SlicePrimary,
    /// A slice variant's repeating fields
    SliceItem,
    /// A slice variant container
    Slice,
    /// A slice zone union
    SliceZone,
}

impl TypeRole {
    fn suffix(self) -> &'static str {
        match self {
            TypeRole::Document | TypeRole::Slice => "",
            TypeRole::Data => "Data Type",
            TypeRole::Group => "Group Type",
            TypeRole::SlicePrimary => "Primary Type",
            TypeRole::SliceItem => "Item Type",
            TypeRole::SliceZone => "Slices Type",
        }
    }
}

/// Name for the composite owned by `owner` at `segments` playing `role`
///
/// ```
/// use prismic_common::schema::naming::{composite_type_name, TypeRole};
///
/// assert_eq!(composite_type_name("blog_post", &["body"], TypeRole::SliceZone), "PrismicBlogPostBodySlicesType");
/// assert_eq!(composite_type_name::<&str>("page", &[], TypeRole::Document), "PrismicPage");
/// ```
pub fn composite_type_name<S: AsRef<str>>(owner: &str, segments: &[S], role: TypeRole) -> String {
    let mut words = vec![NAME_PREFIX, owner];
    words.extend(segments.iter().map(AsRef::as_ref));
    words.push(role.suffix());
    pascal_case(&words.join(" "))
}

/// Segments of a path relative to its content type
///
/// Drops the leading content-type id and the `data` segment that follows it,
/// so a field at `[page, data, gallery]` is named from `[gallery]`.
pub fn relative_segments(path: &[String]) -> &[String] {
    let rest = path.get(1..).unwrap_or(&[]);
    match rest.first() {
        Some(first) if first == "data" => &rest[1..],
        _ => rest,
    }
}

/// PascalCase conversion
///
/// Splits on every run of non-alphanumeric characters (including `_`) and
/// before every uppercase letter, lowercases each word and capitalizes its
/// first character.
pub fn pascal_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;
    for ch in input.chars() {
        if !ch.is_ascii_alphanumeric() {
            at_word_start = true;
            continue;
        }
        if ch.is_ascii_uppercase() || at_word_start {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch.to_ascii_lowercase());
        }
        at_word_start = false;
    }
    out
}

/// camelCase conversion; `PrismicBlogPost` becomes `prismicBlogPost`
pub fn camel_case(input: &str) -> String {
    let pascal = pascal_case(input);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
