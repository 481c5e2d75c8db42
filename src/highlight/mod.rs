//! Syntax highlighting for fenced code blocks.
//!
//! Uses syntect with Sublime Text syntax definitions. Highlighted code is
//! emitted as class-based spans so the colors come from a stylesheet picked
//! per theme brightness rather than being baked into the rendered HTML.

use std::sync::OnceLock;

use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::theme::Brightness;

/// Class prefix for highlight spans, keeps them clear of page styles.
const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

/// Highlight `code` as `language`, returning the inner HTML of a `<code>` element.
///
/// Returns `None` when the language is unknown or highlighting fails; callers
/// fall back to plain escaped text.
pub fn highlight_html(language: &str, code: &str) -> Option<String> {
    let syntax_set = syntax_set();
    let syntax = find_syntax(syntax_set, language)?;

    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set, CLASS_STYLE);
    for line in LinesWithEndings::from(code) {
        if let Err(err) = generator.parse_html_for_line_which_includes_newline(line) {
            tracing::debug!(language, %err, "highlighting failed, using plain text");
            return None;
        }
    }
    Some(generator.finalize())
}

/// Whether `language` names a syntax we can highlight.
pub fn is_known_language(language: &str) -> bool {
    find_syntax(syntax_set(), language).is_some()
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, language: &str) -> Option<&'a SyntaxReference> {
    if language.is_empty() {
        return None;
    }
    syntax_set
        .find_syntax_by_token(language)
        .or_else(|| syntax_set.find_syntax_by_name(language))
}

/// CSS for the highlight classes, matched to the page brightness.
///
/// Returns an empty string if the stylesheet cannot be generated; code then
/// simply renders uncolored.
pub fn stylesheet(brightness: Brightness) -> String {
    let Some(theme) = theme_for(brightness) else {
        return String::new();
    };
    css_for_theme_with_class_style(theme, CLASS_STYLE).unwrap_or_else(|err| {
        tracing::warn!(%err, "failed to build highlight stylesheet");
        String::new()
    })
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.syntax_set.load_defaults");
        SyntaxSet::load_defaults_newlines()
    })
}

fn theme_set() -> &'static ThemeSet {
    static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();
    THEME_SET.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.theme.load_defaults");
        ThemeSet::load_defaults()
    })
}

fn theme_for(brightness: Brightness) -> Option<&'static Theme> {
    let preferred = match brightness {
        Brightness::Dark => ["base16-ocean.dark", "Solarized (dark)", "base16-eighties.dark"].as_slice(),
        Brightness::Light => ["InspiredGitHub", "Solarized (light)", "base16-ocean.light"].as_slice(),
    };
    let themes = &theme_set().themes;
    preferred
        .iter()
        .find_map(|name| themes.get(*name))
        .or_else(|| themes.values().next())
}
