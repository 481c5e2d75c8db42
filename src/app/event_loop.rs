use std::cell::RefCell;
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::cursor::MoveToColumn;
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode};

use crate::app::effects::write_page;
use crate::app::{App, Message, Model, ToastLevel, update};
use crate::input::{
    DropEvent, DropGateway, EventSource, Flow, FocusTarget, KeyInput, TabKeyController,
};
use crate::preview::PassStatus;
use crate::watcher::DocumentWatcher;
use crate::workspace::{ViewMode, Workspace};

/// Event sources wired up for one interactive session.
struct Host {
    keys: EventSource<KeyInput>,
    drops: EventSource<DropEvent>,
    dropped: Rc<RefCell<Vec<PathBuf>>>,
}

impl App {
    /// Run the interactive loop.
    ///
    /// The page is rewritten to the output path after every change; keys
    /// drive tabs, themes and view modes, and pasted paths are treated as
    /// dropped files.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be put into raw mode or the
    /// page cannot be written.
    pub fn run(&self) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");
        let mut model = self.build_model();
        let output = self.output_path();

        let host = Host {
            keys: EventSource::new(),
            drops: EventSource::new(),
            dropped: Rc::new(RefCell::new(Vec::new())),
        };
        let _tabs = TabKeyController::activate(&host.keys);
        let sink = host.dropped.clone();
        let _gateway = DropGateway::activate(&host.drops, self.drop_policy, move |paths| {
            sink.borrow_mut().extend(paths);
        });

        enable_raw_mode()
            .context("Failed to enable raw mode: tabmark --interactive requires an interactive terminal")?;
        let _ = execute!(stdout(), EnableBracketedPaste);

        let result = self.event_loop(&mut model, &host, &output);

        let _ = execute!(stdout(), DisableBracketedPaste);
        let _ = disable_raw_mode();
        println!();
        result
    }

    fn event_loop(&self, model: &mut Model, host: &Host, output: &Path) -> Result<()> {
        let mut watcher = if self.watch_enabled {
            match DocumentWatcher::new(Duration::from_millis(200)) {
                Ok(watcher) => Some(watcher),
                Err(err) => {
                    model.show_toast(ToastLevel::Warning, format!("Watch unavailable: {err}"));
                    None
                }
            }
        } else {
            None
        };
        let mut needs_write = true;

        loop {
            if model.expire_toast(Instant::now()) {
                draw_status(model, output)?;
            }

            if let Some(w) = watcher.as_mut() {
                let open = model.workspace.documents().iter().map(|d| d.path.as_path());
                let failed = w.sync(open);
                if let Some(path) = failed.first() {
                    let name = crate::workspace::display_name(path);
                    model.show_toast(ToastLevel::Warning, format!("Not watching {name}"));
                    needs_write = true;
                }
                let changed = w.take_changed();
                if !changed.is_empty() {
                    *model = self.reload_paths(std::mem::take(model), &changed);
                    needs_write = true;
                }
            }

            let poll_ms = if model.diagrams_busy() { 0 } else { 250 };
            if event::poll(Duration::from_millis(poll_ms))? {
                let event = event::read()?;
                if self.handle_event(event, model, host) {
                    needs_write = true;
                }
                let dropped: Vec<PathBuf> = host.dropped.borrow_mut().drain(..).collect();
                if !dropped.is_empty() {
                    *model = self.open_paths(std::mem::take(model), &dropped);
                    needs_write = true;
                }
            }

            if model.diagrams_busy() && model.pump_diagrams() == PassStatus::Done {
                needs_write = true;
            }

            if needs_write {
                write_page(output, &model.view_html())?;
                draw_status(model, output)?;
                needs_write = false;
            }

            if model.should_quit {
                break;
            }
        }
        Ok(())
    }
}

impl App {
    /// Route one terminal event. Returns true if the model changed.
    fn handle_event(&self, event: Event, model: &mut Model, host: &Host) -> bool {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                let focus = if model.folder_search {
                    FocusTarget::TextInput
                } else {
                    FocusTarget::Document
                };
                let input = KeyInput::new(key, focus);
                if host.keys.dispatch(&input, &mut model.workspace) == Flow::PreventDefault {
                    model.sync_preview();
                    return true;
                }
                match key_action(key, model) {
                    Some(KeyAction::Update(msg)) => {
                        crate::perf::log_event("event.message", format!("msg={msg:?}"));
                        *model = update(std::mem::take(model), msg);
                        true
                    }
                    Some(KeyAction::OpenFolderEntry(index)) => {
                        crate::perf::log_event("event.open_entry", format!("index={index}"));
                        *model = self.open_folder_entry(std::mem::take(model), index);
                        true
                    }
                    None => false,
                }
            }
            Event::Paste(text) => {
                // A paste is the whole drag; there is no hover phase to show.
                let paths = parse_dropped_paths(&text);
                host.drops.dispatch(&DropEvent::Hover, &mut model.workspace);
                host.drops
                    .dispatch(&DropEvent::Drop(paths), &mut model.workspace);
                true
            }
            Event::FocusLost => {
                host.drops.dispatch(&DropEvent::Leave, &mut model.workspace);
                false
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum KeyAction {
    Update(Message),
    /// Open the nth card of the folder listing; needs a file load.
    OpenFolderEntry(usize),
}

/// What a key does given the current view. Folder view adds number keys for
/// opening cards and `/` for searching; while searching, keys edit the query.
pub(super) fn key_action(key: KeyEvent, model: &Model) -> Option<KeyAction> {
    let ws = &model.workspace;
    if model.folder_search {
        return search_message(key, ws).map(KeyAction::Update);
    }
    let plain = !key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
    if plain && ws.view_mode() == ViewMode::Folder && ws.folder().is_some() {
        match key.code {
            KeyCode::Char(c @ '1'..='9') => {
                return c
                    .to_digit(10)
                    .map(|d| KeyAction::OpenFolderEntry(d as usize - 1));
            }
            KeyCode::Char('/') => return Some(KeyAction::Update(Message::StartFolderSearch)),
            _ => {}
        }
    }
    key_message(key).map(KeyAction::Update)
}

fn search_message(key: KeyEvent, ws: &Workspace) -> Option<Message> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c')).then_some(Message::Quit);
    }
    let query = ws.folder().map(|f| f.query.as_str()).unwrap_or_default();
    match key.code {
        KeyCode::Enter => Some(Message::EndFolderSearch),
        KeyCode::Esc => Some(Message::CancelFolderSearch),
        KeyCode::Backspace => {
            let mut query = query.to_string();
            query.pop();
            Some(Message::SetFolderQuery(query))
        }
        KeyCode::Char(c) => Some(Message::SetFolderQuery(format!("{query}{c}"))),
        _ => None,
    }
}

pub(super) fn key_message(key: KeyEvent) -> Option<Message> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c')).then_some(Message::Quit);
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Message::Quit),
        KeyCode::Char('w') => Some(Message::CloseActiveTab),
        KeyCode::Char('t') => Some(Message::ToggleViewMode),
        KeyCode::Char('n') => Some(Message::NextTheme),
        KeyCode::Char('p') => Some(Message::SetViewMode(ViewMode::Preview)),
        KeyCode::Char('f') => Some(Message::ClearFolder),
        KeyCode::Char('x') => Some(Message::ClearDocuments),
        KeyCode::Right => Some(Message::NextTab),
        KeyCode::Left => Some(Message::PrevTab),
        KeyCode::Char(c @ '1'..='9') => {
            c.to_digit(10).map(|d| Message::SwitchTab(d as usize - 1))
        }
        _ => None,
    }
}

/// Paths from a terminal paste. Terminals paste dragged files as quoted or
/// backslash-escaped paths, one or more per line.
pub(super) fn parse_dropped_paths(text: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut current = String::new();
        let mut quote: Option<char> = None;
        let mut chars = line.chars();
        while let Some(ch) = chars.next() {
            match (quote, ch) {
                (None, '\'' | '"') => quote = Some(ch),
                (Some(q), c) if c == q => quote = None,
                (None, '\\') => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                }
                (None, c) if c.is_whitespace() => {
                    push_path(&mut paths, &mut current);
                }
                (_, c) => current.push(c),
            }
        }
        push_path(&mut paths, &mut current);
    }
    paths
}

fn push_path(paths: &mut Vec<PathBuf>, current: &mut String) {
    if current.is_empty() {
        return;
    }
    let raw = std::mem::take(current);
    let path = raw.strip_prefix("file://").unwrap_or(raw.as_str());
    paths.push(PathBuf::from(path));
}

pub(super) fn status_line(model: &Model, output: &Path) -> String {
    let ws = &model.workspace;
    let mode = match ws.view_mode() {
        ViewMode::Preview => "preview",
        ViewMode::ThemeSelection => "themes",
        ViewMode::Folder => "folder",
    };
    let doc = ws.display_name().map_or_else(
        || "no document".to_string(),
        |name| format!("[{}/{}] {name}", ws.active_index() + 1, ws.document_count()),
    );
    let mut line = format!("{doc} | {} | {mode} | {}", ws.theme(), output.display());
    if model.folder_search {
        let query = ws.folder().map(|f| f.query.as_str()).unwrap_or_default();
        line.push_str(&format!(" | search: {query}_"));
    }
    if model.diagrams_busy() {
        line.push_str(" | rendering diagrams");
    }
    if let Some(message) = model.toast_message() {
        line.push_str(" | ");
        line.push_str(message);
    }
    line
}

fn draw_status(model: &Model, output: &Path) -> Result<()> {
    execute!(
        stdout(),
        MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        Print(status_line(model, output))
    )?;
    Ok(())
}
