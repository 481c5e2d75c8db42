use std::fs::File;
use std::io::Read;
use std::path::Path;

use walkdir::WalkDir;

use super::{FileError, is_markdown_path};
use crate::workspace::FolderEntry;

/// Bytes read from each file for the preview and word estimate.
const PREVIEW_BYTES: u64 = 8 * 1024;
const PREVIEW_LINES: usize = 3;
const PREVIEW_MAX_CHARS: usize = 200;

/// Recursively list markdown files below `root`, sorted by relative path.
///
/// Only the first few KiB of each file are read. Unreadable entries are
/// skipped rather than failing the whole scan.
///
/// # Errors
/// Returns [`FileError::NotADirectory`] if `root` is not a directory.
pub fn scan_folder(root: &Path) -> Result<Vec<FolderEntry>, FileError> {
    if !root.is_dir() {
        return Err(FileError::NotADirectory(root.to_path_buf()));
    }
    let _scope = crate::perf::scope("files.scan_folder");

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !path.is_file() || !is_markdown_path(path) {
            continue;
        }
        let Ok(metadata) = std::fs::metadata(path) else {
            continue;
        };

        let modified = metadata
            .modified()
            .ok()
            .map(|t| chrono::DateTime::<chrono::Local>::from(t).to_rfc3339())
            .unwrap_or_default();
        let relative_path = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let (preview, word_count) = read_preview(path);

        files.push(FolderEntry {
            path: path.to_path_buf(),
            relative_path,
            name,
            size: metadata.len(),
            modified,
            preview,
            word_count,
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    tracing::debug!(root = %root.display(), count = files.len(), "scanned folder");
    Ok(files)
}

fn read_preview(path: &Path) -> (String, u32) {
    let Ok(file) = File::open(path) else {
        return (String::new(), 0);
    };
    let mut buf = Vec::new();
    if file.take(PREVIEW_BYTES).read_to_end(&mut buf).is_err() {
        return (String::new(), 0);
    }
    preview_from_bytes(&buf)
}

fn preview_from_bytes(bytes: &[u8]) -> (String, u32) {
    let text = String::from_utf8_lossy(bytes);
    let word_count = u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX);

    let preview = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(PREVIEW_LINES)
        .collect::<Vec<_>>()
        .join("\n");

    (truncate_chars(preview, PREVIEW_MAX_CHARS), word_count)
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut truncated = text[..cut].to_string();
            truncated.push('…');
            truncated
        }
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_scan_lists_markdown_recursively_sorted() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("guides/deep")).unwrap();
        std::fs::write(dir.path().join("zeta.md"), "# Zeta").unwrap();
        std::fs::write(dir.path().join("guides/setup.markdown"), "setup").unwrap();
        std::fs::write(dir.path().join("guides/deep/page.MDX"), "deep page").unwrap();
        std::fs::write(dir.path().join("image.png"), [0u8, 1, 2]).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "text").unwrap();

        let files = scan_folder(dir.path()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["page.MDX", "setup.markdown", "zeta.md"]);
        assert!(files.iter().all(|f| f.path.is_absolute()));
        assert!(files[2].relative_path == "zeta.md");
        assert!(files.iter().all(|f| !f.modified.is_empty()));
    }

    #[test]
    fn test_scan_rejects_non_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.md");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(scan_folder(&file), Err(FileError::NotADirectory(_))));
    }

    #[test]
    fn test_preview_takes_first_three_non_blank_lines() {
        let (preview, words) = preview_from_bytes(b"# Title\n\n   \nfirst line\nsecond\nthird\n");
        assert_eq!(preview, "# Title\nfirst line\nsecond");
        assert_eq!(words, 6);
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "é".repeat(250);
        let (preview, _) = preview_from_bytes(long.as_bytes());
        assert_eq!(preview.chars().count(), PREVIEW_MAX_CHARS + 1);
        assert!(preview.ends_with('…'));
    }

    #[test]
    fn test_preview_reads_only_prefix() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.md");
        let body = "word ".repeat(10_000);
        std::fs::write(&path, &body).unwrap();
        let (_, words) = read_preview(&path);
        assert!(words < 2000, "only the first 8 KiB should be counted, got {words}");
    }
}
