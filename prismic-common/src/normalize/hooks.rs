//! Caller-supplied customization hooks
//!
//! Plain closures implement every hook trait, so callers can write
//! `Hooks::default().with_link_resolver(|ctx: &FieldContext<'_>, link: &Value| ...)`.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::api::RawDocument;
use crate::rich_text::Element;

/// Where a hook is being invoked
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    /// The raw document being normalized
    pub document: &'a RawDocument,
    /// Id of the field holding the value
    pub field: &'a str,
}

/// Maps a document link to a URL
pub trait LinkResolver: Send + Sync {
    fn resolve(&self, ctx: &FieldContext<'_>, link: &Value) -> Option<String>;
}

impl<F> LinkResolver for F
where
    F: Fn(&FieldContext<'_>, &Value) -> Option<String> + Send + Sync,
{
    fn resolve(&self, ctx: &FieldContext<'_>, link: &Value) -> Option<String> {
        self(ctx, link)
    }
}

/// Overrides the HTML emitted for a rich-text element
pub trait HtmlSerializer: Send + Sync {
    fn serialize(&self, ctx: &FieldContext<'_>, element: &Element<'_>, children: &str) -> Option<String>;
}

impl<F> HtmlSerializer for F
where
    F: Fn(&FieldContext<'_>, &Element<'_>, &str) -> Option<String> + Send + Sync,
{
    fn serialize(&self, ctx: &FieldContext<'_>, element: &Element<'_>, children: &str) -> Option<String> {
        self(ctx, element, children)
    }
}

/// Decides whether an image view is downloaded
pub trait ShouldFetchMedia: Send + Sync {
    fn should_fetch(&self, ctx: &FieldContext<'_>, image: &Value) -> bool;
}

impl<F> ShouldFetchMedia for F
where
    F: Fn(&FieldContext<'_>, &Value) -> bool + Send + Sync,
{
    fn should_fetch(&self, ctx: &FieldContext<'_>, image: &Value) -> bool {
        self(ctx, image)
    }
}

fn no_url(_: &FieldContext<'_>, _: &Value) -> Option<String> {
    None
}

fn always(_: &FieldContext<'_>, _: &Value) -> bool {
    true
}

fn never(_: &FieldContext<'_>, _: &Value) -> bool {
    false
}

/// Hook bundle shared by every normalization of a run
#[derive(Clone)]
pub struct Hooks {
    pub link_resolver: Arc<dyn LinkResolver>,
    pub html_serializer: Option<Arc<dyn HtmlSerializer>>,
    pub should_fetch_media: Arc<dyn ShouldFetchMedia>,
}

impl Default for Hooks {
    /// No document URLs, built-in markup, every image fetched
    fn default() -> Self {
        Self {
            link_resolver: Arc::new(no_url),
            html_serializer: None,
            should_fetch_media: Arc::new(always),
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("html_serializer", &self.html_serializer.is_some())
            .finish_non_exhaustive()
    }
}

impl Hooks {
    pub fn with_link_resolver(mut self, resolver: impl LinkResolver + 'static) -> Self {
        self.link_resolver = Arc::new(resolver);
        self
    }

    pub fn with_html_serializer(mut self, serializer: impl HtmlSerializer + 'static) -> Self {
        self.html_serializer = Some(Arc::new(serializer));
        self
    }

    pub fn with_should_fetch_media(mut self, predicate: impl ShouldFetchMedia + 'static) -> Self {
        self.should_fetch_media = Arc::new(predicate);
        self
    }

    /// Static form of the media predicate used by configuration
    pub fn fetch_media(self, enabled: bool) -> Self {
        if enabled {
            self.with_should_fetch_media(always)
        } else {
            self.with_should_fetch_media(never)
        }
    }

    pub(crate) fn document_url(&self, ctx: &FieldContext<'_>, link: &Value) -> Option<String> {
        self.link_resolver.resolve(ctx, link)
    }

    pub(crate) fn serialize_html(
        &self,
        ctx: &FieldContext<'_>,
        element: &Element<'_>,
        children: &str,
    ) -> Option<String> {
        self.html_serializer
            .as_ref()
            .and_then(|serializer| serializer.serialize(ctx, element, children))
    }
}
