//! Mermaid diagram rendering.
//!
//! Renders mermaid source text to inline SVG using `mermaid-rs-renderer`.
//! The engine is reached through the [`DiagramEngine`] trait so the diagram
//! pass can be driven with any backend; [`shared_engine`] hands out the
//! process-wide mermaid engine, created on first use.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex, OnceLock};

use mermaid_rs_renderer::config::LayoutConfig;
use mermaid_rs_renderer::layout::compute_layout;
use mermaid_rs_renderer::parser::parse_mermaid;
use mermaid_rs_renderer::render::render_svg;
use mermaid_rs_renderer::theme::Theme;
use regex::Regex;
use thiserror::Error;

/// Shared handle to a diagram engine.
pub type EngineHandle = Arc<Mutex<dyn DiagramEngine + Send>>;

/// Settings applied to the engine at the start of every diagram pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Render with dark-background colors.
    pub dark: bool,
    /// Strip script-capable markup from generated SVG.
    pub strict: bool,
}

impl EngineConfig {
    pub const fn for_brightness(dark: bool) -> Self {
        Self { dark, strict: true }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::for_brightness(false)
    }
}

#[derive(Debug, Error)]
pub enum DiagramError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("renderer panicked")]
    Panicked,
}

/// Something that turns diagram source into SVG markup.
pub trait DiagramEngine {
    /// Reconfigure the engine. Called once per diagram pass.
    fn initialize(&mut self, config: EngineConfig);

    /// Render `source` to an SVG fragment tagged with `id`.
    ///
    /// # Errors
    /// Returns an error if the source cannot be parsed or rendered.
    fn render(&mut self, id: &str, source: &str) -> Result<String, DiagramError>;
}

/// Next render id, `mermaid-1`, `mermaid-2`, ... Ids are never reused
/// within the process.
pub fn next_render_id() -> String {
    static RENDER_COUNT: AtomicU64 = AtomicU64::new(0);
    let n = RENDER_COUNT.fetch_add(1, Ordering::Relaxed) + 1;
    format!("mermaid-{n}")
}

/// The process-wide mermaid engine, created on first call.
pub fn shared_engine() -> EngineHandle {
    static ENGINE: OnceLock<Arc<Mutex<MermaidEngine>>> = OnceLock::new();
    let engine = ENGINE.get_or_init(|| {
        let _scope = crate::perf::scope("mermaid.engine.load");
        tracing::debug!("loading mermaid engine");
        Arc::new(Mutex::new(MermaidEngine::default()))
    });
    engine.clone()
}

/// [`DiagramEngine`] backed by `mermaid-rs-renderer`.
#[derive(Debug, Default)]
pub struct MermaidEngine {
    config: EngineConfig,
}

impl MermaidEngine {
    pub const fn config(&self) -> EngineConfig {
        self.config
    }
}

impl DiagramEngine for MermaidEngine {
    fn initialize(&mut self, config: EngineConfig) {
        self.config = config;
    }

    fn render(&mut self, id: &str, source: &str) -> Result<String, DiagramError> {
        let config = self.config;
        let source = source.to_string();
        // The layout code can panic on odd input; one bad diagram must not
        // take the rest of the page down with it.
        let svg = panic::catch_unwind(AssertUnwindSafe(move || render_to_svg(&source, config.dark)))
            .map_err(|_| DiagramError::Panicked)??;

        let svg = fix_svg_font_families(&svg);
        let svg = if config.strict { sanitize_svg(&svg) } else { svg };
        Ok(tag_svg_id(&svg, id))
    }
}

fn render_to_svg(source: &str, dark: bool) -> Result<String, DiagramError> {
    let parsed = parse_mermaid(source).map_err(|err| DiagramError::Parse(err.to_string()))?;
    let theme = if dark { dark_theme() } else { Theme::modern() };
    let layout_config = LayoutConfig::default();
    let layout = compute_layout(&parsed.graph, &theme, &layout_config);
    Ok(render_svg(&layout, &theme, &layout_config))
}

fn dark_theme() -> Theme {
    Theme {
        background: "#00000000".to_string(),
        primary_color: "#313244".to_string(),
        primary_text_color: "#cdd6f4".to_string(),
        primary_border_color: "#585b70".to_string(),
        line_color: "#7f849c".to_string(),
        secondary_color: "#45475a".to_string(),
        tertiary_color: "#313244".to_string(),
        text_color: "#cdd6f4".to_string(),
        ..Theme::modern()
    }
}

/// Put `id` on the root `<svg>` element so each render is addressable.
fn tag_svg_id(svg: &str, id: &str) -> String {
    match svg.find("<svg") {
        Some(pos) => {
            let insert_at = pos + "<svg".len();
            format!("{} id=\"{id}\"{}", &svg[..insert_at], &svg[insert_at..])
        }
        None => svg.to_string(),
    }
}

/// Remove script-capable markup from an SVG fragment.
///
/// Drops `<script>` and `<foreignObject>` elements, inline `on*` event
/// handlers, and `javascript:` references.
pub fn sanitize_svg(svg: &str) -> String {
    static ELEMENTS: LazyLock<Option<Regex>> = LazyLock::new(|| {
        Regex::new(
            r"(?is)<(script|foreignObject)\b[^>]*/>|<(script|foreignObject)\b.*?</(script|foreignObject)\s*>",
        )
        .ok()
    });
    static HANDLERS: LazyLock<Option<Regex>> = LazyLock::new(|| {
        Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#).ok()
    });
    static SCRIPT_URLS: LazyLock<Option<Regex>> = LazyLock::new(|| {
        Regex::new(r#"(?i)(href|xlink:href)\s*=\s*("\s*javascript:[^"]*"|'\s*javascript:[^']*')"#)
            .ok()
    });

    let mut out = svg.to_string();
    if let Some(re) = ELEMENTS.as_ref() {
        out = re.replace_all(&out, "").into_owned();
    }
    if let Some(re) = HANDLERS.as_ref() {
        out = re.replace_all(&out, "").into_owned();
    }
    if let Some(re) = SCRIPT_URLS.as_ref() {
        out = re.replace_all(&out, "${1}=\"#\"").into_owned();
    }
    out
}

/// Fix unescaped double quotes inside font-family attributes.
///
/// `mermaid-rs-renderer` emits font-family values like:
///   `font-family="Inter, ... "Segoe UI", sans-serif"`
/// The inner `"Segoe UI"` ends the attribute early once the SVG is inlined
/// into HTML. Inner double quotes are replaced with single quotes.
fn fix_svg_font_families(svg: &str) -> String {
    const MARKER: &str = "font-family=\"";
    let mut result = String::with_capacity(svg.len());
    let mut rest = svg;

    while let Some(pos) = rest.find(MARKER) {
        result.push_str(&rest[..pos + MARKER.len()]);
        rest = &rest[pos + MARKER.len()..];

        // The closing quote is a `"` followed by `>`, ` `, `/`, or end of input.
        let mut value = String::new();
        let mut end_offset = rest.len();
        let mut closed = false;
        for (i, ch) in rest.char_indices() {
            if ch == '"' {
                let after = rest.get(i + 1..i + 2).unwrap_or("");
                if after.is_empty()
                    || after.starts_with('>')
                    || after.starts_with(' ')
                    || after.starts_with('/')
                {
                    result.push_str(&value);
                    result.push('"');
                    end_offset = i + 1;
                    closed = true;
                    break;
                }
                value.push('\'');
            } else {
                value.push(ch);
            }
        }
        if !closed {
            result.push_str(&value);
        }
        rest = &rest[end_offset..];
    }
    result.push_str(rest);
    result
}
