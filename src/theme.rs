//! Static theme catalog.
//!
//! Themes are identified by a short string id. The catalog is read-only; the
//! only field consumed outside display code is the light/dark [`Brightness`],
//! which picks the diagram engine's contrast mode and the highlight stylesheet.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Theme selected when nothing else is configured.
pub const DEFAULT_THEME: &str = "github";

/// Identifier of a theme.
///
/// The workspace stores whatever id it is given; use [`find`] to check that an
/// id names a catalog entry before applying it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeId(String);

impl ThemeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ThemeId {
    fn default() -> Self {
        Self::new(DEFAULT_THEME)
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ThemeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Brightness {
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub background: &'static str,
    pub text: &'static str,
    pub accent: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThemeMeta {
    pub id: &'static str,
    pub label: &'static str,
    pub brightness: Brightness,
    pub palette: Palette,
}

impl ThemeMeta {
    pub const fn is_dark(&self) -> bool {
        matches!(self.brightness, Brightness::Dark)
    }

    pub fn theme_id(&self) -> ThemeId {
        ThemeId::new(self.id)
    }
}

const fn theme(
    id: &'static str,
    label: &'static str,
    brightness: Brightness,
    background: &'static str,
    text: &'static str,
    accent: &'static str,
) -> ThemeMeta {
    ThemeMeta {
        id,
        label,
        brightness,
        palette: Palette {
            background,
            text,
            accent,
        },
    }
}

static THEMES: [ThemeMeta; 10] = [
    // Light
    theme("github", "GitHub", Brightness::Light, "#ffffff", "#1f2328", "#0969da"),
    theme("solarized", "Solarized", Brightness::Light, "#fdf6e3", "#657b83", "#268bd2"),
    theme("arctic", "Arctic", Brightness::Light, "#f0f6fc", "#1c2d3f", "#1a73c7"),
    // Dark
    theme("github-dark", "GitHub Dark", Brightness::Dark, "#0d1117", "#e6edf3", "#58a6ff"),
    theme("dracula", "Dracula", Brightness::Dark, "#282a36", "#f8f8f2", "#bd93f9"),
    theme("nord", "Nord", Brightness::Dark, "#2e3440", "#eceff4", "#88c0d0"),
    theme("cobalt", "Cobalt", Brightness::Dark, "#002240", "#e1e1e1", "#ffc600"),
    theme("monokai", "Monokai", Brightness::Dark, "#272822", "#f8f8f2", "#f92672"),
    theme("terminal", "Terminal", Brightness::Dark, "#0a0a0a", "#33ff33", "#00ff00"),
    theme("sunset", "Sunset", Brightness::Dark, "#1a1118", "#e8d5c4", "#ff7b54"),
];

/// Every theme in catalog order (light themes first).
pub fn all() -> &'static [ThemeMeta] {
    &THEMES
}

pub fn light() -> impl Iterator<Item = &'static ThemeMeta> {
    THEMES.iter().filter(|t| t.brightness == Brightness::Light)
}

pub fn dark() -> impl Iterator<Item = &'static ThemeMeta> {
    THEMES.iter().filter(|t| t.brightness == Brightness::Dark)
}

/// Look up a theme by id. Unknown ids yield `None`.
pub fn find(id: &str) -> Option<&'static ThemeMeta> {
    THEMES.iter().find(|t| t.id == id)
}

/// Whether `id` belongs to the dark set. Unknown ids count as light.
pub fn is_dark(id: &ThemeId) -> bool {
    find(id.as_str()).is_some_and(ThemeMeta::is_dark)
}

/// The theme following `id` in catalog order, wrapping around.
///
/// An unknown id starts over at the first theme.
pub fn next_after(id: &ThemeId) -> &'static ThemeMeta {
    let next = THEMES
        .iter()
        .position(|t| t.id == id.as_str())
        .map_or(0, |idx| (idx + 1) % THEMES.len());
    &THEMES[next]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_are_unique() {
        let mut ids: Vec<_> = all().iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), all().len());
    }

    #[test]
    fn test_light_and_dark_partition_catalog() {
        assert_eq!(light().count(), 3);
        assert_eq!(dark().count(), 7);
        assert!(light().all(|t| !t.is_dark()));
        assert!(dark().all(ThemeMeta::is_dark));
    }

    #[test]
    fn test_find_unknown_theme_is_none() {
        assert!(find("no-such-theme").is_none());
        assert_eq!(find("nord").map(|t| t.label), Some("Nord"));
    }

    #[test]
    fn test_is_dark_classification() {
        assert!(is_dark(&ThemeId::from("dracula")));
        assert!(!is_dark(&ThemeId::from("github")));
        assert!(!is_dark(&ThemeId::from("unknown")));
    }

    #[test]
    fn test_next_after_wraps_to_first() {
        assert_eq!(next_after(&ThemeId::from("github")).id, "solarized");
        assert_eq!(next_after(&ThemeId::from("sunset")).id, "github");
        assert_eq!(next_after(&ThemeId::from("bogus")).id, "github");
    }

    #[test]
    fn test_default_theme_is_in_catalog() {
        assert!(find(ThemeId::default().as_str()).is_some());
    }
}
