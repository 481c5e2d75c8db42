//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The application context (workspace plus derived preview)
//! - [`Message`]: All possible events and actions
//! - [`update`]: State transitions, followed by a preview sync
//! - [`App::run`]: Interactive event loop; [`App::export`] renders once

mod effects;
mod event_loop;
mod model;
mod update;

pub use model::{Model, ToastLevel};
pub use update::{Message, update};

use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use crate::files::{FileSource, FsSource};
use crate::input::DropPolicy;
use crate::mermaid::EngineHandle;
use crate::theme::ThemeId;

/// Main application struct: configuration plus the file source.
pub struct App {
    files: Vec<PathBuf>,
    folder: Option<PathBuf>,
    theme: ThemeId,
    watch_enabled: bool,
    drop_policy: DropPolicy,
    output: Option<PathBuf>,
    source: Box<dyn FileSource>,
    engine_loader: Option<Rc<dyn Fn() -> EngineHandle>>,
}

impl App {
    /// Create an application that opens `files` in order.
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            folder: None,
            theme: ThemeId::default(),
            watch_enabled: false,
            drop_policy: DropPolicy::default(),
            output: None,
            source: Box::new(FsSource),
            engine_loader: None,
        }
    }

    /// Scan `folder` at startup and show its listing.
    #[must_use]
    pub fn with_folder(mut self, folder: Option<PathBuf>) -> Self {
        self.folder = folder;
        self
    }

    #[must_use]
    pub fn with_theme(mut self, theme: ThemeId) -> Self {
        self.theme = theme;
        self
    }

    /// Enable or disable file watching.
    #[must_use]
    pub const fn with_watch(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    #[must_use]
    pub const fn with_drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Where the page is written. Defaults to stdout for export and a file in
    /// the temp directory for interactive mode.
    #[must_use]
    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    /// Read files through `source` instead of the filesystem.
    #[must_use]
    pub fn with_source(mut self, source: impl FileSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    /// Render diagrams with the engine returned by `loader`.
    #[must_use]
    pub fn with_engine_loader(mut self, loader: impl Fn() -> EngineHandle + 'static) -> Self {
        self.engine_loader = Some(Rc::new(loader));
        self
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("files", &self.files)
            .field("folder", &self.folder)
            .field("theme", &self.theme)
            .field("watch_enabled", &self.watch_enabled)
            .field("drop_policy", &self.drop_policy)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
