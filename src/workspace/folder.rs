use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One markdown file found by a folder scan.
///
/// Carries only metadata and a short preview; the full content is loaded on
/// demand when the entry is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderEntry {
    /// Absolute path used to load the full document
    pub path: PathBuf,
    /// Path relative to the scanned folder, with the platform separator
    pub relative_path: String,
    /// File name including extension
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time as RFC 3339, empty when unknown
    pub modified: String,
    /// First few non-blank lines
    pub preview: String,
    /// Whitespace-separated word estimate
    pub word_count: u32,
}

/// The currently loaded folder, its scan results, and the search query
/// narrowing what is shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderState {
    pub path: PathBuf,
    pub files: Vec<FolderEntry>,
    pub query: String,
}

impl FolderState {
    pub fn new(path: impl Into<PathBuf>, files: Vec<FolderEntry>) -> Self {
        Self {
            path: path.into(),
            files,
            query: String::new(),
        }
    }

    /// Entries matching the current query, in scan order.
    pub fn visible(&self) -> Vec<&FolderEntry> {
        self.filter(&self.query)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Entries whose name, relative path, or preview contains `query`,
    /// ignoring case. An empty (or blank) query matches everything.
    pub fn filter(&self, query: &str) -> Vec<&FolderEntry> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.files.iter().collect();
        }
        self.files
            .iter()
            .filter(|entry| {
                entry.name.to_lowercase().contains(&needle)
                    || entry.relative_path.to_lowercase().contains(&needle)
                    || entry.preview.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn total_words(&self) -> u64 {
        self.files.iter().map(|f| u64::from(f.word_count)).sum()
    }
}
