//! Loading documents and scanning folders.
//!
//! The workspace never touches the filesystem itself. Everything it needs
//! goes through a [`FileSource`], so hosts (and tests) can supply documents
//! from wherever they live.

mod scan;

pub use scan::scan_folder;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::workspace::FolderEntry;

/// Extensions treated as markdown documents (compared case-insensitively).
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown", "mdx"];

#[derive(Debug, Error)]
pub enum FileError {
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),
    #[error("'{0}' not found")]
    NotFound(PathBuf),
}

/// The external collaborator the workspace loads from.
pub trait FileSource {
    /// Read the full text of a document.
    ///
    /// # Errors
    /// Returns an error if the document cannot be read.
    fn load_file(&self, path: &Path) -> Result<String, FileError>;

    /// List markdown files below `folder`.
    ///
    /// # Errors
    /// Returns an error if `folder` is not a readable directory.
    fn list_files(&self, folder: &Path) -> Result<Vec<FolderEntry>, FileError>;
}

/// [`FileSource`] backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSource;

impl FileSource for FsSource {
    fn load_file(&self, path: &Path) -> Result<String, FileError> {
        std::fs::read_to_string(path).map_err(|source| FileError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    fn list_files(&self, folder: &Path) -> Result<Vec<FolderEntry>, FileError> {
        scan_folder(folder)
    }
}

/// In-memory [`FileSource`], handy for hosts that already hold the text.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    files: HashMap<PathBuf, String>,
    folders: HashMap<PathBuf, Vec<FolderEntry>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    pub fn with_folder(mut self, path: impl Into<PathBuf>, entries: Vec<FolderEntry>) -> Self {
        self.folders.insert(path.into(), entries);
        self
    }
}

impl FileSource for MemorySource {
    fn load_file(&self, path: &Path) -> Result<String, FileError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FileError::NotFound(path.to_path_buf()))
    }

    fn list_files(&self, folder: &Path) -> Result<Vec<FolderEntry>, FileError> {
        self.folders
            .get(folder)
            .cloned()
            .ok_or_else(|| FileError::NotADirectory(folder.to_path_buf()))
    }
}

/// Whether `path` has one of the [`MARKDOWN_EXTENSIONS`].
pub fn is_markdown_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|md| ext.eq_ignore_ascii_case(md))
        })
}
