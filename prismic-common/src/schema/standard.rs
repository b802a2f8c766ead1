//! Fixed, schema-independent type definitions
//!
//! Terminal field kinds (rich text, geo point, embed, image, link) reuse these
//! global definitions instead of generating a composite per field.

/// SDL for every standard type, registered before any generated type
pub const STANDARD_TYPES_SDL: &str = include_str!("standard_types.graphql");

pub const STRING_TYPE: &str = "String";
pub const FLOAT_TYPE: &str = "Float";
pub const DATE_TYPE: &str = "Date";

pub const STRUCTURED_TEXT_TYPE: &str = "PrismicStructuredTextType";
pub const GEO_POINT_TYPE: &str = "PrismicGeoPointType";
pub const EMBED_TYPE: &str = "PrismicEmbedType";
pub const IMAGE_DIMENSIONS_TYPE: &str = "PrismicImageDimensionsType";
pub const IMAGE_TYPE: &str = "PrismicImageType";
pub const LINK_TYPES_ENUM: &str = "PrismicLinkTypes";
pub const LINK_TYPE: &str = "PrismicLinkType";

/// Interface every generated document type implements
pub const DOCUMENT_INTERFACE: &str = "PrismicDocument";

/// Interface of independently queryable node types (documents and slices)
pub const NODE_INTERFACE: &str = "Node";

/// Union of every document type; the resolution target of link fields
pub const ALL_DOCUMENT_TYPES: &str = "PrismicAllDocumentTypes";

/// Every name defined by [`STANDARD_TYPES_SDL`] plus the derived document union
pub const RESERVED_TYPE_NAMES: &[&str] = &[
    STRUCTURED_TEXT_TYPE,
    GEO_POINT_TYPE,
    EMBED_TYPE,
    IMAGE_DIMENSIONS_TYPE,
    IMAGE_TYPE,
    LINK_TYPES_ENUM,
    LINK_TYPE,
    DOCUMENT_INTERFACE,
    ALL_DOCUMENT_TYPES,
];
