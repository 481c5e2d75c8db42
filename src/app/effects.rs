use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::app::{App, Message, Model, ToastLevel, update};
use crate::preview::{DiagramScheduler, LazyEngine};
use crate::workspace::{ViewMode, Workspace};

impl App {
    /// Build the starting model: open the configured files, scan the folder,
    /// and render the preview.
    pub fn build_model(&self) -> Model {
        let _scope = crate::perf::scope("app.build_model");
        let mut model = Model::new(Workspace::new(self.theme.clone()));
        if let Some(loader) = &self.engine_loader {
            let loader = loader.clone();
            model = model.with_scheduler(DiagramScheduler::new(LazyEngine::new(move || loader())));
        }
        for path in &self.files {
            model = self.open_path(model, path);
        }
        if self.files.len() > 1 {
            // Start on the first file given rather than the last one opened.
            model = update(model, Message::SwitchTab(0));
        }
        if let Some(folder) = &self.folder {
            model = self.open_folder(model, folder);
        }
        model.sync_preview();
        model
    }

    /// Render the page once with all diagrams drawn and write it out.
    ///
    /// # Errors
    /// Returns an error if the page cannot be written.
    pub fn export(&self) -> Result<()> {
        let mut model = self.build_model();
        model.settle_diagrams();
        if let Some(message) = model.toast_message() {
            eprintln!("tabmark: {message}");
        }
        let page = model.view_html();
        match &self.output {
            Some(path) => write_page(path, &page),
            None => {
                let mut out = std::io::stdout().lock();
                out.write_all(page.as_bytes()).context("Failed to write page to stdout")?;
                out.flush().context("Failed to flush stdout")
            }
        }
    }

    /// Load `path` and open it. Failures become an error toast and leave
    /// the workspace untouched.
    ///
    /// A document opened over the folder listing is shown right away.
    pub fn open_path(&self, mut model: Model, path: &Path) -> Model {
        match self.source.load_file(path) {
            Ok(content) => {
                let model = update(
                    model,
                    Message::DocumentLoaded {
                        path: path.to_path_buf(),
                        content,
                    },
                );
                if model.workspace.view_mode() == ViewMode::Folder {
                    update(model, Message::SetViewMode(ViewMode::Preview))
                } else {
                    model
                }
            }
            Err(err) => {
                model.show_toast(ToastLevel::Error, format!("Open failed: {err}"));
                crate::perf::log_event("open.error", format!("path={} err={err}", path.display()));
                model
            }
        }
    }

    /// Open the folder entry at `index` among the cards currently shown.
    /// Out of range (or no folder) is a no-op.
    pub fn open_folder_entry(&self, model: Model, index: usize) -> Model {
        let Some(path) = model.workspace.folder_entry(index).map(|e| e.path.clone()) else {
            return model;
        };
        self.open_path(model, &path)
    }

    /// Open every path in order.
    pub fn open_paths(&self, mut model: Model, paths: &[PathBuf]) -> Model {
        for path in paths {
            model = self.open_path(model, path);
        }
        model
    }

    pub fn open_folder(&self, mut model: Model, folder: &Path) -> Model {
        match self.source.list_files(folder) {
            Ok(files) => {
                let count = files.len();
                model = update(
                    model,
                    Message::FolderLoaded {
                        path: folder.to_path_buf(),
                        files,
                    },
                );
                model.show_toast(ToastLevel::Info, format!("{count} markdown files"));
                model
            }
            Err(err) => {
                model.show_toast(ToastLevel::Error, format!("Folder scan failed: {err}"));
                model
            }
        }
    }

    /// Re-read changed documents from disk.
    pub fn reload_paths(&self, mut model: Model, paths: &[PathBuf]) -> Model {
        for path in paths {
            match self.source.load_file(path) {
                Ok(content) => {
                    model = update(
                        model,
                        Message::DocumentChanged {
                            path: path.clone(),
                            content,
                        },
                    );
                }
                Err(err) => {
                    model.show_toast(ToastLevel::Warning, format!("Reload failed: {err}"));
                    crate::perf::log_event(
                        "reload.error",
                        format!("path={} err={err}", path.display()),
                    );
                }
            }
        }
        model
    }

    pub(super) fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("tabmark-preview.html"))
    }
}

pub(super) fn write_page(path: &Path, page: &str) -> Result<()> {
    let _scope = crate::perf::scope("app.write_page");
    std::fs::write(path, page).with_context(|| format!("Failed to write {}", path.display()))
}
