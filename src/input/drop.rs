use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::{EventSource, Flow, Subscription};
use crate::files::is_markdown_path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropEvent {
    /// Files are being dragged over the window.
    Hover,
    /// Files were released onto the window.
    Drop(Vec<PathBuf>),
    /// The drag left the window without dropping.
    Leave,
}

/// Which dropped paths are handed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropPolicy {
    #[default]
    MarkdownOnly,
    AcceptAll,
}

impl DropPolicy {
    pub fn accepts(self, path: &Path) -> bool {
        match self {
            Self::MarkdownOnly => is_markdown_path(path),
            Self::AcceptAll => true,
        }
    }

    /// Keep accepted paths, preserving order.
    pub fn filter(self, paths: &[PathBuf]) -> Vec<PathBuf> {
        paths.iter().filter(|p| self.accepts(p)).cloned().collect()
    }
}

/// Turns drop events into "open these files" calls.
///
/// The callback only fires when at least one dropped path passes the
/// policy. The gateway stops listening when dropped.
#[derive(Debug)]
pub struct DropGateway {
    dragging: Rc<Cell<bool>>,
    policy: DropPolicy,
    _subscription: Subscription,
}

impl DropGateway {
    pub fn activate(
        source: &EventSource<DropEvent>,
        policy: DropPolicy,
        mut on_open: impl FnMut(Vec<PathBuf>) + 'static,
    ) -> Self {
        let dragging = Rc::new(Cell::new(false));
        let state = dragging.clone();
        let subscription = source.subscribe(move |event, _| match event {
            DropEvent::Hover => {
                state.set(true);
                Flow::Continue
            }
            DropEvent::Leave => {
                state.set(false);
                Flow::Continue
            }
            DropEvent::Drop(paths) => {
                state.set(false);
                let accepted = policy.filter(paths);
                tracing::debug!(dropped = paths.len(), accepted = accepted.len(), "files dropped");
                if !accepted.is_empty() {
                    on_open(accepted);
                }
                Flow::PreventDefault
            }
        });
        Self {
            dragging,
            policy,
            _subscription: subscription,
        }
    }

    /// True between `Hover` and the following `Drop` or `Leave`.
    ///
    /// The terminal host receives a drag as one paste and sends `Hover` and
    /// `Drop` back to back, so it never observes this as true. Hosts with
    /// real drag feedback can use it to highlight the drop target.
    pub fn is_dragging(&self) -> bool {
        self.dragging.get()
    }

    pub const fn policy(&self) -> DropPolicy {
        self.policy
    }
}
