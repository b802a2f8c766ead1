//! Rich-text rendering
//!
//! Turns the content API's block/span representation into HTML and plain
//! text. Span offsets count Unicode scalar values. Every element passes
//! through a caller-supplied serializer first; the built-in markup is only
//! used when the serializer declines.

use serde_json::Value;

const NULL: Value = Value::Null;

/// One element offered to an HTML serializer hook
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    /// Block type (`paragraph`, `heading2`, `image`, ...), span type
    /// (`strong`, `hyperlink`, ...) or `group-list-item` /
    /// `group-o-list-item` for a run of list items
    pub kind: &'a str,
    /// Raw block or span value (`null` for list groups)
    pub node: &'a Value,
    /// Covered text for spans and text blocks
    pub text: Option<&'a str>,
}

/// Plain-text rendering: block texts joined with a single space
pub fn as_text(blocks: &Value) -> String {
    let Some(blocks) = blocks.as_array() else {
        return String::new();
    };
    blocks
        .iter()
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// URL of a link value
///
/// Document links are resolved through `resolve_document`; web and media
/// links use their raw `url`.
pub fn link_url<F>(link: &Value, resolve_document: F) -> Option<String>
where
    F: Fn(&Value) -> Option<String>,
{
    match link.get("link_type").and_then(Value::as_str) {
        Some("Document") => resolve_document(link),
        _ => link.get("url").and_then(Value::as_str).map(str::to_string),
    }
}

/// HTML rendering
///
/// `resolve_document` maps document links to URLs (see [`link_url`]);
/// `serialize` may return markup for any element, receiving the element's
/// already-rendered children.
pub fn as_html<L, S>(blocks: &Value, resolve_document: L, serialize: S) -> String
where
    L: Fn(&Value) -> Option<String>,
    S: Fn(&Element<'_>, &str) -> Option<String>,
{
    let Some(blocks) = blocks.as_array() else {
        return String::new();
    };
    let renderer = Renderer {
        resolve_document: &resolve_document,
        serialize: &serialize,
    };

    let mut out = String::new();
    let mut i = 0;
    while i < blocks.len() {
        let kind = block_kind(&blocks[i]);
        if let Some(group_kind) = list_group_kind(kind) {
            let run = blocks[i..]
                .iter()
                .take_while(|b| block_kind(b) == kind)
                .count();
            let children: String = blocks[i..i + run]
                .iter()
                .map(|b| renderer.block(b))
                .collect();
            let element = Element { kind: group_kind, node: &NULL, text: None };
            out.push_str(&renderer.element(&element, &children));
            i += run;
        } else {
            out.push_str(&renderer.block(&blocks[i]));
            i += 1;
        }
    }
    out
}

fn block_kind(block: &Value) -> &str {
    block.get("type").and_then(Value::as_str).unwrap_or("")
}

fn list_group_kind(kind: &str) -> Option<&'static str> {
    match kind {
        "list-item" => Some("group-list-item"),
        "o-list-item" => Some("group-o-list-item"),
        _ => None,
    }
}

struct Renderer<'r> {
    resolve_document: &'r dyn Fn(&Value) -> Option<String>,
    serialize: &'r dyn Fn(&Element<'_>, &str) -> Option<String>,
}

#[derive(Debug, Clone)]
struct Span<'a> {
    start: usize,
    end: usize,
    node: &'a Value,
}

impl Renderer<'_> {
    fn element(&self, element: &Element<'_>, children: &str) -> String {
        (self.serialize)(element, children).unwrap_or_else(|| self.default_markup(element, children))
    }

    fn block(&self, block: &Value) -> String {
        let text = block.get("text").and_then(Value::as_str).unwrap_or("");
        let chars: Vec<char> = text.chars().collect();

        let mut spans: Vec<Span<'_>> = block
            .get("spans")
            .and_then(Value::as_array)
            .map(|spans| spans.iter().filter_map(|s| parse_span(s, chars.len())).collect())
            .unwrap_or_default();
        sort_spans(&mut spans);

        let children = self.spans(&chars, 0, chars.len(), spans);
        let element = Element {
            kind: block_kind(block),
            node: block,
            text: Some(text),
        };
        self.element(&element, &children)
    }

    /// Render `chars[start..end]`, nesting `spans` (sorted, within range)
    ///
    /// A span that runs past the end of its enclosing span is split: the part
    /// inside is nested, the remainder is rendered as a sibling after it.
    fn spans(&self, chars: &[char], start: usize, end: usize, spans: Vec<Span<'_>>) -> String {
        let mut out = String::new();
        let mut cursor = start;
        let mut pending = spans;

        while !pending.is_empty() {
            let span = pending.remove(0);
            let span_start = span.start.max(cursor);
            let span_end = span.end.min(end);
            if span_start >= span_end {
                continue;
            }

            let mut nested = Vec::new();
            let mut siblings = Vec::new();
            for s in pending.drain(..) {
                if s.start >= span_end {
                    siblings.push(s);
                    continue;
                }
                if s.end > span_end {
                    siblings.push(Span { start: span_end, end: s.end, node: s.node });
                }
                nested.push(Span {
                    start: s.start.max(span_start),
                    end: s.end.min(span_end),
                    node: s.node,
                });
            }
            sort_spans(&mut nested);
            sort_spans(&mut siblings);
            pending = siblings;

            out.push_str(&escape_text(&collect(chars, cursor, span_start)));
            let inner = self.spans(chars, span_start, span_end, nested);

            let covered = collect(chars, span_start, span_end);
            let element = Element {
                kind: span.node.get("type").and_then(Value::as_str).unwrap_or(""),
                node: span.node,
                text: Some(covered.as_str()),
            };
            out.push_str(&self.element(&element, &inner));

            cursor = span_end;
        }

        out.push_str(&escape_text(&collect(chars, cursor, end)));
        out
    }

    fn default_markup(&self, element: &Element<'_>, children: &str) -> String {
        let node = element.node;
        let class = node
            .get("label")
            .and_then(Value::as_str)
            .map(|label| format!(" class=\"{}\"", escape_attr(label)))
            .unwrap_or_default();

        match element.kind {
            "heading1" | "heading2" | "heading3" | "heading4" | "heading5" | "heading6" => {
                let level = &element.kind["heading".len()..];
                format!("<h{level}{class}>{children}</h{level}>")
            }
            "paragraph" => format!("<p{class}>{children}</p>"),
            "preformatted" => format!("<pre{class}>{children}</pre>"),
            "list-item" | "o-list-item" => format!("<li{class}>{children}</li>"),
            "group-list-item" => format!("<ul>{children}</ul>"),
            "group-o-list-item" => format!("<ol>{children}</ol>"),
            "image" => self.image(node),
            "embed" => embed(node),
            "strong" => format!("<strong>{children}</strong>"),
            "em" => format!("<em>{children}</em>"),
            "label" => {
                let label = node
                    .pointer("/data/label")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                format!("<span class=\"{}\">{children}</span>", escape_attr(label))
            }
            "hyperlink" => {
                let data = node.get("data").unwrap_or(&NULL);
                match link_url(data, self.resolve_document) {
                    Some(url) => format!("<a {}>{children}</a>", link_attrs(&url, data)),
                    None => children.to_string(),
                }
            }
            _ => children.to_string(),
        }
    }

    fn image(&self, node: &Value) -> String {
        let attr = |key: &str| escape_attr(node.get(key).and_then(Value::as_str).unwrap_or(""));
        let mut img = format!("<img src=\"{}\" alt=\"{}\"", attr("url"), attr("alt"));
        if let Some(copyright) = node.get("copyright").and_then(Value::as_str) {
            img.push_str(&format!(" copyright=\"{}\"", escape_attr(copyright)));
        }
        img.push_str(" />");

        let link = node
            .get("linkTo")
            .and_then(|link| link_url(link, self.resolve_document).map(|url| (url, link)));
        match link {
            Some((url, link)) => format!("<p class=\"block-img\"><a {}>{img}</a></p>", link_attrs(&url, link)),
            None => format!("<p class=\"block-img\">{img}</p>"),
        }
    }
}

fn embed(node: &Value) -> String {
    let oembed = node.get("oembed").unwrap_or(&NULL);
    let attr = |key: &str| escape_attr(oembed.get(key).and_then(Value::as_str).unwrap_or(""));
    let html = oembed.get("html").and_then(Value::as_str).unwrap_or("");
    format!(
        "<div data-oembed=\"{}\" data-oembed-type=\"{}\" data-oembed-provider=\"{}\">{}</div>",
        attr("embed_url"),
        attr("type"),
        attr("provider_name"),
        html
    )
}

fn link_attrs(url: &str, link: &Value) -> String {
    match link.get("target").and_then(Value::as_str) {
        Some(target) => format!(
            "href=\"{}\" target=\"{}\" rel=\"noopener\"",
            escape_attr(url),
            escape_attr(target)
        ),
        None => format!("href=\"{}\"", escape_attr(url)),
    }
}

fn parse_span(span: &Value, len: usize) -> Option<Span<'_>> {
    let start = usize::try_from(span.get("start")?.as_u64()?).ok()?;
    let end = usize::try_from(span.get("end")?.as_u64()?).ok()?;
    (start < end && start < len).then(|| Span {
        start,
        end: end.min(len),
        node: span,
    })
}

/// Outer spans first: by start, longest first on ties
fn sort_spans(spans: &mut [Span<'_>]) {
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
}

fn collect(chars: &[char], start: usize, end: usize) -> String {
    if start >= end {
        return String::new();
    }
    chars[start..end].iter().collect()
}

/// Escape text content; newlines become `<br />`
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\n' => out.push_str("<br />"),
            c => out.push(c),
        }
    }
    out
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace("<br />", "&#10;")
}
