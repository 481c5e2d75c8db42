use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::{Duration, Instant};

use crate::mermaid::EngineConfig;
use crate::preview::{DiagramScheduler, PassStatus, PreviewSurface, render_page};
use crate::theme::{self, ThemeId};
use crate::workspace::Workspace;

/// How long a toast stays up in the interactive host.
const TOAST_DURATION: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// The application context.
///
/// Owns the workspace plus everything derived from it: the rendered
/// preview, the diagram scheduler, and the current notice. Derived state is
/// brought up to date by [`Model::sync_preview`].
#[derive(Debug, Default)]
pub struct Model {
    pub workspace: Workspace,
    preview: PreviewSurface,
    scheduler: DiagramScheduler,
    rendered_html: String,
    /// Hash of the (path, content) pair the preview was rendered from.
    rendered_key: Option<u64>,
    /// What the last diagram pass was started for.
    diagrams_for: Option<(u64, ThemeId)>,
    toast: Option<Toast>,
    /// Typed keys edit the folder query instead of acting as commands.
    pub folder_search: bool,
    pub should_quit: bool,
}

impl Model {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            ..Self::default()
        }
    }

    /// Use `scheduler` for diagram passes instead of the default mermaid one.
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: DiagramScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Bring derived state up to date with the workspace.
    ///
    /// Re-renders the preview when the active document or its content
    /// changed, then starts a diagram pass when the preview or the theme
    /// changed since the last pass. Returns true if anything was redone.
    pub fn sync_preview(&mut self) -> bool {
        let key = content_key(&self.workspace);
        let mut changed = false;
        if self.rendered_key != Some(key) {
            let _scope = crate::perf::scope("app.sync_preview.render");
            let content = self.workspace.active_content().unwrap_or_default();
            self.rendered_html = crate::document::render_markdown(content);
            self.preview.replace_html(&self.rendered_html);
            self.rendered_key = Some(key);
            changed = true;
        }

        let wanted = (self.preview.generation(), self.workspace.theme().clone());
        if self.diagrams_for.as_ref() != Some(&wanted) {
            let config = EngineConfig::for_brightness(theme::is_dark(&wanted.1));
            self.scheduler.trigger(&mut self.preview, config);
            self.diagrams_for = Some(wanted);
            changed = true;
        }
        changed
    }

    /// Advance the pending diagram pass by one step.
    pub fn pump_diagrams(&mut self) -> PassStatus {
        self.scheduler.pump(&mut self.preview)
    }

    /// Finish the pending diagram pass.
    pub fn settle_diagrams(&mut self) {
        self.scheduler.settle(&mut self.preview);
    }

    pub const fn diagrams_busy(&self) -> bool {
        self.scheduler.is_busy()
    }

    pub const fn scheduler(&self) -> &DiagramScheduler {
        &self.scheduler
    }

    pub const fn preview(&self) -> &PreviewSurface {
        &self.preview
    }

    /// Pipeline output for the active document, before diagrams are drawn.
    pub fn rendered_html(&self) -> &str {
        &self.rendered_html
    }

    /// The complete page for the current view.
    pub fn view_html(&self) -> String {
        render_page(&self.workspace, &self.preview.to_html())
    }

    pub fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            ToastLevel::Error => tracing::warn!(%message, "error notice"),
            ToastLevel::Warning | ToastLevel::Info => tracing::info!(%message, "notice"),
        }
        self.toast = Some(Toast {
            level,
            message,
            expires_at: Instant::now() + TOAST_DURATION,
        });
    }

    pub fn toast_message(&self) -> Option<&str> {
        self.toast.as_ref().map(|t| t.message.as_str())
    }

    pub fn toast_level(&self) -> Option<ToastLevel> {
        self.toast.as_ref().map(|t| t.level)
    }

    /// Drop the toast once it has expired. Returns true if one was removed.
    pub fn expire_toast(&mut self, now: Instant) -> bool {
        if self.toast.as_ref().is_some_and(|t| now >= t.expires_at) {
            self.toast = None;
            return true;
        }
        false
    }
}

fn content_key(workspace: &Workspace) -> u64 {
    let mut hasher = DefaultHasher::new();
    workspace.active_path().hash(&mut hasher);
    workspace.active_content().hash(&mut hasher);
    hasher.finish()
}
