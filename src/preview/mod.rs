//! The displayed preview.
//!
//! [`PreviewSurface`] holds rendered HTML split into static segments and
//! diagram slots. Slots start out as the empty placeholders produced by the
//! render pipeline; the diagram pass fills them in place.

mod diagrams;
mod page;

pub use diagrams::{DiagramPass, DiagramScheduler, ERROR_MARKER, LazyEngine, PassStatus};
pub use page::render_page;

use crate::document::{PLACEHOLDER_CLASS, SOURCE_ATTR, unescape_source};

/// One diagram placeholder inside the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramSlot {
    escaped_source: String,
    inner_html: String,
}

impl DiagramSlot {
    /// The source as carried in the placeholder attribute.
    pub fn escaped_source(&self) -> &str {
        &self.escaped_source
    }

    /// The original diagram source.
    pub fn source(&self) -> String {
        unescape_source(&self.escaped_source)
    }

    pub fn inner_html(&self) -> &str {
        &self.inner_html
    }

    pub fn set_inner_html(&mut self, html: impl Into<String>) {
        self.inner_html = html.into();
    }

    pub fn clear(&mut self) {
        self.inner_html.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Html(String),
    Diagram(DiagramSlot),
}

#[derive(Debug, Clone, Default)]
pub struct PreviewSurface {
    segments: Vec<Segment>,
    generation: u64,
}

impl PreviewSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in freshly rendered HTML. Bumps the generation so passes started
    /// against the old content can tell they are stale.
    pub fn replace_html(&mut self, html: &str) {
        self.segments = split_placeholders(html);
        self.generation += 1;
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn slots(&self) -> impl Iterator<Item = &DiagramSlot> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Diagram(slot) => Some(slot),
            Segment::Html(_) => None,
        })
    }

    pub fn slots_mut(&mut self) -> impl Iterator<Item = &mut DiagramSlot> {
        self.segments.iter_mut().filter_map(|s| match s {
            Segment::Diagram(slot) => Some(slot),
            Segment::Html(_) => None,
        })
    }

    pub fn slot_count(&self) -> usize {
        self.slots().count()
    }

    pub fn slot(&self, index: usize) -> Option<&DiagramSlot> {
        self.slots().nth(index)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut DiagramSlot> {
        self.slots_mut().nth(index)
    }

    /// Empty every diagram slot.
    pub fn clear_diagrams(&mut self) {
        for slot in self.slots_mut() {
            slot.clear();
        }
    }

    /// Reassemble the surface as HTML.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Html(text) => html.push_str(text),
                Segment::Diagram(slot) => {
                    html.push_str(&placeholder_open(&slot.escaped_source));
                    html.push_str(&slot.inner_html);
                    html.push_str("</div>");
                }
            }
        }
        html
    }
}

fn placeholder_prefix() -> String {
    format!("<div class=\"{PLACEHOLDER_CLASS}\" {SOURCE_ATTR}=\"")
}

fn placeholder_open(escaped_source: &str) -> String {
    format!("{}{escaped_source}\">", placeholder_prefix())
}

/// Split rendered HTML into static text and diagram slots.
///
/// The render pipeline escapes all user-supplied markup, so the placeholder
/// prefix can only appear where the pipeline emitted one.
fn split_placeholders(html: &str) -> Vec<Segment> {
    const CLOSE: &str = "\"></div>";
    let prefix = placeholder_prefix();
    let mut segments = Vec::new();
    let mut rest = html;

    while let Some(start) = rest.find(&prefix) {
        let after_prefix = &rest[start + prefix.len()..];
        let Some(end) = after_prefix.find(CLOSE) else {
            break;
        };
        if start > 0 {
            segments.push(Segment::Html(rest[..start].to_string()));
        }
        segments.push(Segment::Diagram(DiagramSlot {
            escaped_source: after_prefix[..end].to_string(),
            inner_html: String::new(),
        }));
        rest = &after_prefix[end + CLOSE.len()..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Html(rest.to_string()));
    }
    segments
}
