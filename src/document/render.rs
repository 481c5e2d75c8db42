//! Markdown rendering with comrak.

use comrak::nodes::{AstNode, NodeCodeBlock, NodeHtmlBlock, NodeValue};
use comrak::{Arena, Options, format_html, parse_document};

use super::{DIAGRAM_MARKER, escape_html, placeholder_html};

/// Render markdown to HTML.
///
/// Pure and deterministic: the same text always yields the same HTML. Empty
/// input short-circuits to an empty string without touching the parser.
///
/// # Example
///
/// ```
/// use tabmark::document::render_markdown;
///
/// let html = render_markdown("# Hello");
/// assert!(html.contains("<h1>Hello</h1>"));
/// assert!(render_markdown("").is_empty());
/// ```
pub fn render_markdown(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let _scope = crate::perf::scope("document.render_markdown");

    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.parse.smart = true;
    // Raw HTML from the source is escaped while walking the tree, so the only
    // markup passed through verbatim is what we generate ourselves.
    options.render.unsafe_ = true;

    render_with(text, &options)
}

fn render_with(text: &str, options: &Options) -> String {
    let arena = Arena::new();
    let root = parse_document(&arena, text, options);
    rewrite_nodes(root, options);

    let mut html = Vec::new();
    if let Err(err) = format_html(root, options, &mut html) {
        tracing::warn!(%err, "markdown formatting failed");
    }
    String::from_utf8_lossy(&html).into_owned()
}

fn rewrite_nodes<'a>(root: &'a AstNode<'a>, options: &Options) {
    let mut diagrams = 0usize;
    for node in root.descendants() {
        let mut ast = node.data.borrow_mut();
        let replacement = match &mut ast.value {
            NodeValue::CodeBlock(block) => {
                if is_diagram(block) {
                    diagrams += 1;
                }
                Some(html_block(render_code_block(block)))
            }
            NodeValue::HtmlBlock(raw) => Some(html_block(render_with(
                &escape_block_starts(&raw.literal),
                options,
            ))),
            NodeValue::HtmlInline(raw) => Some(NodeValue::Text(raw.clone())),
            NodeValue::Link(link) | NodeValue::Image(link) => {
                if !is_safe_url(&link.url) {
                    link.url.clear();
                }
                None
            }
            _ => None,
        };
        if let Some(value) = replacement {
            ast.value = value;
        }
    }
    if diagrams > 0 {
        crate::perf::log_event("document.diagrams", format!("placeholders={diagrams}"));
    }
}

/// Backslash-escape a `<` that opens a line, so the text parses as
/// ordinary markdown (emphasis, smart quotes) instead of an HTML block.
fn escape_block_starts(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len() + 8);
    for line in literal.split_inclusive('\n') {
        let body = line.trim_start_matches(' ');
        let indent = line.len() - body.len();
        if indent <= 3 && body.starts_with('<') {
            escaped.push_str(&line[..indent]);
            escaped.push('\\');
            escaped.push_str(body);
        } else {
            escaped.push_str(line);
        }
    }
    escaped
}

fn html_block(literal: String) -> NodeValue {
    let mut block = NodeHtmlBlock::default();
    block.literal = literal;
    NodeValue::HtmlBlock(block)
}

fn is_diagram(block: &NodeCodeBlock) -> bool {
    block.fenced && block.info.trim() == DIAGRAM_MARKER
}

fn render_code_block(block: &NodeCodeBlock) -> String {
    if is_diagram(block) {
        return placeholder_html(&block.literal);
    }

    let language = block.info.split_whitespace().next().unwrap_or_default();
    let body = crate::highlight::highlight_html(language, &block.literal)
        .unwrap_or_else(|| escape_html(&block.literal));

    if language.is_empty() {
        format!("<pre><code>{body}</code></pre>\n")
    } else {
        format!(
            "<pre><code class=\"language-{}\">{body}</code></pre>\n",
            escape_html(language)
        )
    }
}

/// Reject script-capable URL schemes, allowing inline raster images.
fn is_safe_url(url: &str) -> bool {
    let url = url.trim().to_ascii_lowercase();
    if url.starts_with("data:") {
        return ["gif", "png", "jpeg", "webp"]
            .iter()
            .any(|kind| url.starts_with(&format!("data:image/{kind};")));
    }
    !["javascript:", "vbscript:", "file:"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
}
