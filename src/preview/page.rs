//! Full-page HTML for the current view mode.

use std::fmt::Write as _;

use crate::document::escape_html;
use crate::theme::{self, Brightness, DEFAULT_THEME, ThemeMeta};
use crate::workspace::{FolderState, ViewMode, Workspace, display_name};

const BASE_CSS: &str = "\
body { margin: 0; font-family: -apple-system, 'Segoe UI', Helvetica, Arial, sans-serif; \
background: var(--bg); color: var(--text); }
a { color: var(--accent); }
.tabs { display: flex; gap: 4px; list-style: none; margin: 0; padding: 6px 12px; \
border-bottom: 1px solid var(--accent); }
.tab { padding: 4px 10px; opacity: 0.7; }
.tab.active { opacity: 1; border-bottom: 2px solid var(--accent); }
main { max-width: 880px; margin: 0 auto; padding: 24px; }
pre { overflow-x: auto; padding: 12px; border-radius: 6px; }
.mermaid-block { margin: 16px 0; text-align: center; }
.cards { display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 12px; }
.card { border: 1px solid var(--accent); border-radius: 8px; padding: 12px; }
.card.active { outline: 2px solid var(--accent); }
.card kbd { font-size: 11px; padding: 0 4px; border: 1px solid var(--accent); border-radius: 3px; }
.swatch { display: inline-block; width: 14px; height: 14px; border-radius: 3px; margin-right: 4px; }
.meta { font-size: 12px; opacity: 0.7; }
.empty { text-align: center; opacity: 0.8; padding-top: 80px; }
";

/// Assemble the page for `workspace`, using `preview_html` as the document
/// body in preview mode.
pub fn render_page(workspace: &Workspace, preview_html: &str) -> String {
    let _scope = crate::perf::scope("preview.render_page");
    let meta = theme::find(workspace.theme().as_str()).or_else(|| theme::find(DEFAULT_THEME));
    let title = workspace.display_name().unwrap_or_else(|| "tabmark".to_string());

    let mut page = String::new();
    page.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(page, "<title>{}</title>", escape_html(&title));
    page.push_str("<style>\n");
    if let Some(meta) = meta {
        let _ = writeln!(
            page,
            ":root {{ --bg: {}; --text: {}; --accent: {}; }}",
            meta.palette.background, meta.palette.text, meta.palette.accent
        );
    }
    page.push_str(BASE_CSS);
    let brightness = meta.map_or(Brightness::Light, |m| m.brightness);
    page.push_str(&crate::highlight::stylesheet(brightness));
    page.push_str("</style>\n</head>\n");
    let _ = writeln!(
        page,
        "<body data-theme=\"{}\">",
        escape_html(workspace.theme().as_str())
    );

    push_tabs(&mut page, workspace);
    page.push_str("<main>\n");
    match workspace.view_mode() {
        ViewMode::Preview => push_preview(&mut page, workspace, preview_html),
        ViewMode::ThemeSelection => push_theme_gallery(&mut page, workspace),
        ViewMode::Folder => match workspace.folder() {
            Some(folder) => push_folder(&mut page, folder),
            None => push_empty_state(&mut page, workspace),
        },
    }
    page.push_str("</main>\n</body>\n</html>\n");
    page
}

fn push_tabs(page: &mut String, workspace: &Workspace) {
    if workspace.is_empty() {
        return;
    }
    page.push_str("<ul class=\"tabs\">\n");
    for (index, doc) in workspace.documents().iter().enumerate() {
        let class = if index == workspace.active_index() {
            "tab active"
        } else {
            "tab"
        };
        let _ = writeln!(
            page,
            "<li class=\"{class}\" title=\"{}\">{}</li>",
            escape_html(&doc.path.to_string_lossy()),
            escape_html(&display_name(&doc.path))
        );
    }
    page.push_str("</ul>\n");
}

fn push_preview(page: &mut String, workspace: &Workspace, preview_html: &str) {
    if workspace.is_empty() {
        push_empty_state(page, workspace);
        return;
    }
    page.push_str("<article class=\"markdown-body\">\n");
    page.push_str(preview_html);
    page.push_str("</article>\n");
}

fn push_empty_state(page: &mut String, workspace: &Workspace) {
    page.push_str("<section class=\"empty\">\n<h1>No document open</h1>\n");
    page.push_str("<p>Drop a Markdown file (.md, .markdown, .mdx) to open it.</p>\n");
    if !workspace.recent_paths().is_empty() {
        page.push_str("<h2>Recent</h2>\n<ul class=\"recent\">\n");
        for path in workspace.recent_paths() {
            let _ = writeln!(page, "<li>{}</li>", escape_html(&path.to_string_lossy()));
        }
        page.push_str("</ul>\n");
    }
    page.push_str("</section>\n");
}

fn push_theme_gallery(page: &mut String, workspace: &Workspace) {
    page.push_str("<h1>Themes</h1>\n");
    for (heading, group) in [
        ("Light", theme::light().collect::<Vec<_>>()),
        ("Dark", theme::dark().collect::<Vec<_>>()),
    ] {
        let _ = writeln!(page, "<h2>{heading}</h2>\n<div class=\"cards\">");
        for meta in group {
            push_theme_card(page, meta, meta.id == workspace.theme().as_str());
        }
        page.push_str("</div>\n");
    }
}

fn push_theme_card(page: &mut String, meta: &ThemeMeta, active: bool) {
    let class = if active { "card active" } else { "card" };
    let _ = writeln!(
        page,
        "<div class=\"{class}\" data-theme-id=\"{}\" style=\"background:{};color:{}\">",
        meta.id, meta.palette.background, meta.palette.text
    );
    let _ = writeln!(page, "<strong>{}</strong>", escape_html(meta.label));
    let _ = writeln!(
        page,
        "<div><span class=\"swatch\" style=\"background:{}\"></span>\
<span class=\"swatch\" style=\"background:{}\"></span></div>",
        meta.palette.text, meta.palette.accent
    );
    page.push_str("</div>\n");
}

fn push_folder(page: &mut String, folder: &FolderState) {
    let _ = writeln!(
        page,
        "<h1>{}</h1>\n<p class=\"meta\">{} files, {} words</p>",
        escape_html(&folder.path().to_string_lossy()),
        folder.files.len(),
        folder.total_words()
    );
    if folder.is_empty() {
        page.push_str("<p class=\"empty\">No Markdown files in this folder.</p>\n");
        return;
    }
    let visible = folder.visible();
    if !folder.query.is_empty() {
        let _ = writeln!(
            page,
            "<p class=\"meta\">Search &quot;{}&quot;: {} of {}</p>",
            escape_html(&folder.query),
            visible.len(),
            folder.files.len()
        );
    }
    page.push_str("<div class=\"cards\">\n");
    for (index, entry) in visible.iter().enumerate() {
        // Number keys open the first nine cards.
        let key = if index < 9 {
            format!("<kbd>{}</kbd> ", index + 1)
        } else {
            String::new()
        };
        let _ = writeln!(
            page,
            "<div class=\"card\" data-path=\"{}\">\n<strong>{key}{}</strong>\n\
<div class=\"meta\">{} · {} bytes · {} words · {}</div>\n<p>{}</p>\n</div>",
            escape_html(&entry.path.to_string_lossy()),
            escape_html(&entry.name),
            escape_html(&entry.relative_path),
            entry.size,
            entry.word_count,
            escape_html(&entry.modified),
            escape_html(&entry.preview)
        );
    }
    page.push_str("</div>\n");
}
