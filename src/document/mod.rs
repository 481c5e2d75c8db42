//! Markdown to HTML rendering.
//!
//! This module handles:
//! - Rendering markdown with comrak
//! - Highlighting fenced code blocks
//! - Turning `mermaid` fences into diagram placeholders
//!
//! A placeholder is an empty container carrying the diagram source in an
//! attribute:
//!
//! ```html
//! <div class="mermaid-block" data-source="graph TD; A--&gt;B;"></div>
//! ```
//!
//! The source is escaped with [`escape_source`] and recovered byte-for-byte
//! with [`unescape_source`] by the diagram pass.

mod render;

pub use render::render_markdown;

/// Info string that marks a fenced block as a diagram.
pub const DIAGRAM_MARKER: &str = "mermaid";

/// Class carried by every diagram placeholder element.
pub const PLACEHOLDER_CLASS: &str = "mermaid-block";

/// Attribute holding the escaped diagram source.
pub const SOURCE_ATTR: &str = "data-source";

/// Escape diagram source for an attribute value.
///
/// `&` goes first so the entities introduced for `<`, `>` and `"` are not
/// escaped a second time.
pub fn escape_source(source: &str) -> String {
    source
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Escape text for HTML element content or attribute values.
pub(crate) fn escape_html(text: &str) -> String {
    escape_source(text)
}

/// Reverse [`escape_source`].
///
/// `&amp;` goes last so text such as `&amp;lt;` comes back as `&lt;`
/// rather than `<`.
pub fn unescape_source(escaped: &str) -> String {
    escaped
        .replace("&quot;", "\"")
        .replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&amp;", "&")
}

/// Build the placeholder element for one diagram.
pub fn placeholder_html(source: &str) -> String {
    format!(
        "<div class=\"{PLACEHOLDER_CLASS}\" {SOURCE_ATTR}=\"{}\"></div>\n",
        escape_source(source)
    )
}
