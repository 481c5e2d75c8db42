//! File watching for live reload.
//!
//! Uses notify crate for cross-platform file system events. One watcher
//! covers every open document; each document's parent directory is watched
//! non-recursively and changes are reported per document after a debounce.
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

#[derive(Debug, Clone)]
struct Target {
    /// Path as the workspace knows it.
    path: PathBuf,
    canonical: PathBuf,
    name: Option<OsString>,
    root: PathBuf,
}

impl Target {
    fn new(path: &Path) -> Self {
        // Canonicalize so event paths from the OS (which are always absolute
        // and canonical) match our stored paths.
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let name = canonical.file_name().map(std::ffi::OsStr::to_os_string);
        let root = watch_root_for(&canonical);
        Self {
            path: path.to_path_buf(),
            canonical,
            name,
            root,
        }
    }

    fn is_affected_by(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.root
                || path == &self.canonical
                || (path.parent() == Some(self.root.as_path())
                    && self
                        .name
                        .as_ref()
                        .is_some_and(|name| path.file_name().is_some_and(|f| f == name)))
        })
    }
}

/// Watches a set of documents and emits debounced change notifications.
pub struct DocumentWatcher {
    watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    targets: Vec<Target>,
    roots: HashMap<PathBuf, usize>,
    /// Paths whose directory could not be watched; not retried while open.
    unwatchable: HashSet<PathBuf>,
    debounce: Duration,
    pending: HashMap<PathBuf, Instant>,
}

impl DocumentWatcher {
    /// Create a watcher with nothing watched yet.
    ///
    /// # Errors
    /// Returns an error if the platform watcher cannot be created.
    pub fn new(debounce: Duration) -> notify::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        Ok(Self {
            watcher,
            rx,
            targets: Vec::new(),
            roots: HashMap::new(),
            unwatchable: HashSet::new(),
            debounce,
            pending: HashMap::new(),
        })
    }

    /// Start watching `path`. Watching an already watched path is a no-op.
    ///
    /// # Errors
    /// Returns an error if the parent directory cannot be watched.
    pub fn watch(&mut self, path: &Path) -> notify::Result<()> {
        if self.is_watching(path) {
            return Ok(());
        }
        let target = Target::new(path);
        if !self.roots.contains_key(&target.root) {
            self.watcher.watch(&target.root, RecursiveMode::NonRecursive)?;
        }
        *self.roots.entry(target.root.clone()).or_insert(0) += 1;
        tracing::debug!(path = %path.display(), root = %target.root.display(), "watching");
        self.targets.push(target);
        Ok(())
    }

    pub fn unwatch(&mut self, path: &Path) {
        let Some(index) = self.targets.iter().position(|t| t.path == path) else {
            return;
        };
        let target = self.targets.remove(index);
        self.pending.remove(&target.path);
        if let Some(count) = self.roots.get_mut(&target.root) {
            *count -= 1;
            if *count == 0 {
                self.roots.remove(&target.root);
                if let Err(err) = self.watcher.unwatch(&target.root) {
                    crate::perf::log_event("watcher.unwatch.error", format!("{err}"));
                }
            }
        }
    }

    /// Make the watched set exactly `paths`.
    ///
    /// A path that cannot be watched is skipped and returned; the others are
    /// still watched. It is not retried until it leaves the set and comes back.
    pub fn sync<'a>(&mut self, paths: impl IntoIterator<Item = &'a Path>) -> Vec<PathBuf> {
        let wanted: Vec<&Path> = paths.into_iter().collect();
        self.unwatchable
            .retain(|path| wanted.contains(&path.as_path()));
        let stale: Vec<PathBuf> = self
            .targets
            .iter()
            .filter(|t| !wanted.contains(&t.path.as_path()))
            .map(|t| t.path.clone())
            .collect();
        for path in stale {
            self.unwatch(&path);
        }
        let mut failed = Vec::new();
        for path in wanted {
            if self.unwatchable.contains(path) {
                continue;
            }
            if let Err(err) = self.watch(path) {
                tracing::warn!(path = %path.display(), %err, "cannot watch document");
                self.unwatchable.insert(path.to_path_buf());
                failed.push(path.to_path_buf());
            }
        }
        failed
    }

    pub fn is_watching(&self, path: &Path) -> bool {
        self.targets.iter().any(|t| t.path == path)
    }

    pub fn watched_count(&self) -> usize {
        self.targets.len()
    }

    /// Documents whose changes have settled for the debounce period.
    pub fn take_changed(&mut self) -> Vec<PathBuf> {
        let mut total_events = 0u32;
        let mut relevant_events = 0u32;
        while let Ok(event) = self.rx.try_recv() {
            total_events += 1;
            match event {
                Ok(ev) => {
                    let now = Instant::now();
                    let mut relevant = false;
                    for target in self.targets.iter().filter(|t| t.is_affected_by(&ev)) {
                        self.pending.insert(target.path.clone(), now);
                        relevant = true;
                    }
                    if relevant {
                        relevant_events += 1;
                    } else {
                        crate::perf::log_event(
                            "watcher.irrelevant",
                            format!("kind={:?} paths={:?}", ev.kind, ev.paths),
                        );
                    }
                }
                Err(err) => {
                    tracing::warn!(%err, "watch error");
                    crate::perf::log_event("watcher.error", format!("{err}"));
                }
            }
        }

        if total_events > 0 {
            crate::perf::log_event(
                "watcher.poll",
                format!(
                    "total={total_events} relevant={relevant_events} pending={}",
                    self.pending.len()
                ),
            );
        }

        let ready: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, since)| since.elapsed() >= self.debounce)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &ready {
            self.pending.remove(path);
        }
        // Report in watch order, not hash order.
        self.targets
            .iter()
            .filter(|t| ready.contains(&t.path))
            .map(|t| t.path.clone())
            .collect()
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
