use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::{EventSource, Flow, Subscription};

/// Where keyboard focus sits when a key arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    #[default]
    Document,
    TextInput,
    TextArea,
    Select,
    ContentEditable,
}

impl FocusTarget {
    /// Targets that use Tab themselves.
    pub const fn is_editable(self) -> bool {
        !matches!(self, Self::Document)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub event: KeyEvent,
    pub focus: FocusTarget,
}

impl KeyInput {
    pub const fn new(event: KeyEvent, focus: FocusTarget) -> Self {
        Self { event, focus }
    }
}

impl From<KeyEvent> for KeyInput {
    fn from(event: KeyEvent) -> Self {
        Self::new(event, FocusTarget::Document)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabDirection {
    Next,
    Prev,
}

/// Decide whether `input` should cycle tabs with `open` documents open.
pub fn tab_direction(input: &KeyInput, open: usize) -> Option<TabDirection> {
    let event = &input.event;
    if event.kind == KeyEventKind::Release {
        return None;
    }
    let chorded = KeyModifiers::CONTROL
        | KeyModifiers::ALT
        | KeyModifiers::SUPER
        | KeyModifiers::META
        | KeyModifiers::HYPER;
    if event.modifiers.intersects(chorded) || open <= 1 || input.focus.is_editable() {
        return None;
    }
    match event.code {
        KeyCode::BackTab => Some(TabDirection::Prev),
        KeyCode::Tab if event.modifiers.contains(KeyModifiers::SHIFT) => Some(TabDirection::Prev),
        KeyCode::Tab => Some(TabDirection::Next),
        _ => None,
    }
}

/// Cycles the active tab on Tab / Shift+Tab while installed.
#[derive(Debug)]
pub struct TabKeyController {
    _subscription: Subscription,
}

impl TabKeyController {
    pub fn activate(source: &EventSource<KeyInput>) -> Self {
        let subscription = source.subscribe(|input, workspace| {
            match tab_direction(input, workspace.document_count()) {
                Some(TabDirection::Next) => workspace.next_tab(),
                Some(TabDirection::Prev) => workspace.prev_tab(),
                None => return Flow::Continue,
            }
            Flow::PreventDefault
        });
        Self {
            _subscription: subscription,
        }
    }
}
