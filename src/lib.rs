// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. preview::PreviewSurface)
    clippy::module_name_repetitions
)]

//! # Tabmark
//!
//! A tabbed, themeable markdown previewer.
//!
//! Tabmark keeps several markdown documents open at once and renders the
//! active one to HTML with:
//! - Syntax-highlighted code blocks
//! - Mermaid diagrams rendered to inline SVG
//! - Ten light and dark themes
//! - A folder browser with previews and word counts
//! - File watching for live preview
//!
//! ## Architecture
//!
//! Tabmark uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application context (workspace and derived preview)
//! - **Message**: Events and actions
//! - **Update**: State transitions followed by a preview sync
//! - **View**: Full HTML page for the current view mode
//!
//! ## Modules
//!
//! - [`app`]: Application context, event loop, and export
//! - [`workspace`]: Open documents, tabs, theme, and view mode
//! - [`document`]: Markdown to HTML rendering
//! - [`highlight`]: Syntax highlighting
//! - [`mermaid`]: Diagram engine
//! - [`preview`]: Rendered surface, diagram passes, and page assembly
//! - [`input`]: Drop and keyboard event sources
//! - [`files`]: Document loading and folder scanning
//! - [`theme`]: Theme catalog
//! - [`watcher`]: File watching

pub mod app;
pub mod config;
pub mod document;
pub mod files;
pub mod highlight;
pub mod input;
pub mod mermaid;
pub mod perf;
pub mod preview;
pub mod theme;
pub mod watcher;
pub mod workspace;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::theme::ThemeId;
    pub use crate::workspace::{Document, ViewMode, Workspace};
}
