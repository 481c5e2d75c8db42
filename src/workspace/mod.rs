//! Open documents, tab selection, theme, and view mode.
//!
//! [`Workspace`] is the single owner of this state. Every mutation goes
//! through one of its methods so the selection and recent-file invariants
//! always hold:
//!
//! - `active_index < documents.len()` whenever documents are open, `0` otherwise
//! - `recent_paths` holds no duplicates and at most [`MAX_RECENT`] entries

mod folder;

pub use folder::{FolderEntry, FolderState};

use std::path::{Path, PathBuf};

use crate::theme::ThemeId;

/// Maximum number of entries kept in the recent-files list.
pub const MAX_RECENT: usize = 10;

/// One open markdown source, keyed by its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub content: String,
}

/// Mutually exclusive top-level display states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Preview,
    ThemeSelection,
    Folder,
}

impl ViewMode {
    /// Whether this mode shows document content (as opposed to the theme picker).
    pub const fn is_content(self) -> bool {
        matches!(self, Self::Preview | Self::Folder)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Workspace {
    documents: Vec<Document>,
    active_index: usize,
    theme: ThemeId,
    view_mode: ViewMode,
    recent_paths: Vec<PathBuf>,
    folder: Option<FolderState>,
}

impl Workspace {
    pub fn new(theme: ThemeId) -> Self {
        Self {
            theme,
            ..Self::default()
        }
    }

    /// Open `path`, or refresh it if it is already open, and make it active.
    ///
    /// Reopening keeps the tab in place and replaces its content.
    pub fn add_document(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        let path = path.into();
        let content = content.into();
        if let Some(idx) = self.position(&path) {
            self.documents[idx].content = content;
            self.active_index = idx;
        } else {
            self.documents.push(Document {
                path: path.clone(),
                content,
            });
            self.active_index = self.documents.len() - 1;
        }
        self.promote_recent(path);
    }

    /// Replace the content of an already open document without touching the
    /// selection or the recent list. Returns false when `path` is not open.
    pub fn reload_document(&mut self, path: &Path, content: impl Into<String>) -> bool {
        let Some(idx) = self.position(path) else {
            return false;
        };
        self.documents[idx].content = content.into();
        true
    }

    pub fn switch_tab(&mut self, index: usize) {
        if index < self.documents.len() {
            self.active_index = index;
        }
    }

    pub fn close_tab(&mut self, index: usize) {
        if index >= self.documents.len() {
            return;
        }
        self.documents.remove(index);
        if self.documents.is_empty() {
            self.active_index = 0;
        } else if index < self.active_index {
            self.active_index -= 1;
        } else {
            // Closing the active tab selects whichever tab slid into its slot,
            // or the new last tab when the old last one was closed.
            self.active_index = self.active_index.min(self.documents.len() - 1);
        }
    }

    pub fn next_tab(&mut self) {
        self.cycle(1);
    }

    pub fn prev_tab(&mut self) {
        self.cycle(-1);
    }

    fn cycle(&mut self, step: isize) {
        let count = self.documents.len();
        if count <= 1 {
            return;
        }
        #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
        let next = (self.active_index as isize + step).rem_euclid(count as isize) as usize;
        self.active_index = next;
    }

    pub fn set_theme(&mut self, theme: ThemeId) {
        self.theme = theme;
    }

    /// Close every document. The theme and recent list survive.
    pub fn clear(&mut self) {
        self.documents.clear();
        self.active_index = 0;
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    /// Flip between the content view and theme selection.
    ///
    /// Leaving theme selection returns to the folder view when a folder is
    /// loaded, otherwise to the document preview.
    pub fn toggle_view_mode(&mut self) {
        self.view_mode = if self.view_mode.is_content() {
            ViewMode::ThemeSelection
        } else {
            self.content_mode()
        };
    }

    fn content_mode(&self) -> ViewMode {
        if self.folder.is_some() {
            ViewMode::Folder
        } else {
            ViewMode::Preview
        }
    }

    pub fn set_folder_files(&mut self, path: impl Into<PathBuf>, files: Vec<FolderEntry>) {
        self.folder = Some(FolderState::new(path, files));
        self.view_mode = ViewMode::Folder;
    }

    pub fn clear_folder(&mut self) {
        self.folder = None;
        if self.view_mode == ViewMode::Folder {
            self.view_mode = ViewMode::Preview;
        }
    }

    fn promote_recent(&mut self, path: PathBuf) {
        self.recent_paths.retain(|p| p != &path);
        self.recent_paths.insert(0, path);
        self.recent_paths.truncate(MAX_RECENT);
    }

    fn position(&self, path: &Path) -> Option<usize> {
        self.documents.iter().position(|d| d.path == path)
    }

    // Accessors

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub const fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active_document(&self) -> Option<&Document> {
        self.documents.get(self.active_index)
    }

    pub fn active_path(&self) -> Option<&Path> {
        self.active_document().map(|d| d.path.as_path())
    }

    pub fn active_content(&self) -> Option<&str> {
        self.active_document().map(|d| d.content.as_str())
    }

    /// File name of the active document, with `\` treated as a separator too.
    pub fn display_name(&self) -> Option<String> {
        self.active_path().map(display_name)
    }

    pub const fn theme(&self) -> &ThemeId {
        &self.theme
    }

    pub const fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn recent_paths(&self) -> &[PathBuf] {
        &self.recent_paths
    }

    pub const fn folder(&self) -> Option<&FolderState> {
        self.folder.as_ref()
    }

    /// Entry at `index` among those matching the folder query.
    pub fn folder_entry(&self, index: usize) -> Option<&FolderEntry> {
        self.folder
            .as_ref()
            .and_then(|f| f.visible().get(index).copied())
    }

    /// Narrow the folder listing. No-op without a folder.
    pub fn set_folder_query(&mut self, query: impl Into<String>) {
        if let Some(folder) = self.folder.as_mut() {
            folder.query = query.into();
        }
    }
}

/// Last path segment after normalizing backslashes to forward slashes.
pub fn display_name(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    normalized
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}
