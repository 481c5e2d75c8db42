use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tempfile::tempdir;

use crate::files::MemorySource;
use crate::mermaid::{DiagramEngine, DiagramError, EngineConfig, EngineHandle};
use crate::preview::{DiagramScheduler, ERROR_MARKER, LazyEngine, PassStatus};
use crate::theme::ThemeId;
use crate::workspace::{FolderEntry, ViewMode, Workspace};

use super::event_loop::{KeyAction, key_action, key_message, parse_dropped_paths, status_line};
use super::{App, Message, Model, ToastLevel, update};

const DIAGRAM_DOC: &str = "# Flow\n\n```mermaid\ngraph TD; A-->B;\n```\n";

#[derive(Default)]
struct Recorded {
    configs: Vec<EngineConfig>,
    sources: Vec<String>,
}

struct StubEngine {
    recorded: Arc<Mutex<Recorded>>,
}

impl DiagramEngine for StubEngine {
    fn initialize(&mut self, config: EngineConfig) {
        self.recorded.lock().unwrap().configs.push(config);
    }

    fn render(&mut self, id: &str, source: &str) -> Result<String, DiagramError> {
        self.recorded.lock().unwrap().sources.push(source.to_string());
        if source.contains("oops") {
            return Err(DiagramError::Parse("unexpected token".into()));
        }
        Ok(format!("<svg id=\"{id}\"></svg>"))
    }
}

fn stub_engine() -> (impl Fn() -> EngineHandle + Clone + 'static, Arc<Mutex<Recorded>>) {
    let recorded = Arc::new(Mutex::new(Recorded::default()));
    let engine: EngineHandle = Arc::new(Mutex::new(StubEngine {
        recorded: recorded.clone(),
    }));
    (move || engine.clone(), recorded)
}

fn model_with_stub() -> (Model, Arc<Mutex<Recorded>>) {
    let (loader, recorded) = stub_engine();
    let model = Model::new(Workspace::default())
        .with_scheduler(DiagramScheduler::new(LazyEngine::new(loader)));
    (model, recorded)
}

fn open(model: Model, path: &str, content: &str) -> Model {
    update(
        model,
        Message::DocumentLoaded {
            path: PathBuf::from(path),
            content: content.to_string(),
        },
    )
}

fn entry(name: &str) -> FolderEntry {
    FolderEntry {
        path: PathBuf::from("/notes").join(name),
        relative_path: name.to_string(),
        name: name.to_string(),
        size: 10,
        modified: "2026-01-01T00:00:00+00:00".to_string(),
        preview: "preview".to_string(),
        word_count: 2,
    }
}

#[test]
fn test_open_renders_active_document() {
    let (model, _) = model_with_stub();
    let model = open(model, "/docs/a.md", "# Alpha");
    assert!(model.rendered_html().contains("<h1>Alpha</h1>"));
    assert!(model.preview().to_html().contains("<h1>Alpha</h1>"));
}

#[test]
fn test_switching_tabs_rerenders_preview() {
    let (model, _) = model_with_stub();
    let model = open(model, "/docs/a.md", "# Alpha");
    let model = open(model, "/docs/b.md", "# Beta");
    assert!(model.rendered_html().contains("Beta"));

    let model = update(model, Message::SwitchTab(0));
    assert!(model.rendered_html().contains("Alpha"));
    let model = update(model, Message::NextTab);
    assert!(model.rendered_html().contains("Beta"));
}

#[test]
fn test_closing_last_document_empties_preview() {
    let (model, _) = model_with_stub();
    let model = open(model, "/docs/a.md", "# Alpha");
    let model = update(model, Message::CloseActiveTab);
    assert!(model.workspace.is_empty());
    assert_eq!(model.rendered_html(), "");
    assert!(model.view_html().contains("No document open"));
}

#[test]
fn test_diagram_pass_runs_after_render() {
    let (model, recorded) = model_with_stub();
    let mut model = open(model, "/docs/flow.md", DIAGRAM_DOC);
    assert!(model.diagrams_busy());
    model.settle_diagrams();
    assert!(!model.diagrams_busy());

    let html = model.preview().to_html();
    assert!(html.contains("<svg id=\"mermaid-"), "{html}");
    assert_eq!(recorded.lock().unwrap().sources, vec!["graph TD; A-->B;\n"]);
    // The pipeline output itself keeps the empty placeholder.
    assert!(!model.rendered_html().contains("<svg"));
}

#[test]
fn test_theme_change_rerenders_diagrams_with_new_brightness() {
    let (model, recorded) = model_with_stub();
    let mut model = open(model, "/docs/flow.md", DIAGRAM_DOC);
    model.settle_diagrams();

    let mut model = update(model, Message::SetTheme(ThemeId::new("dracula")));
    assert!(model.diagrams_busy());
    model.settle_diagrams();

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.configs.len(), 2);
    assert!(!recorded.configs[0].dark);
    assert!(recorded.configs[1].dark);
}

#[test]
fn test_unchanged_state_does_not_restart_diagrams() {
    let (model, recorded) = model_with_stub();
    let mut model = open(model, "/docs/flow.md", DIAGRAM_DOC);
    model.settle_diagrams();
    assert!(!model.sync_preview());
    let mut model = update(model, Message::SetViewMode(ViewMode::ThemeSelection));
    model.settle_diagrams();
    assert_eq!(recorded.lock().unwrap().configs.len(), 1);
}

#[test]
fn test_failed_diagram_shows_error_marker() {
    let (model, _) = model_with_stub();
    let mut model = open(model, "/docs/bad.md", "```mermaid\noops\n```\n");
    model.settle_diagrams();
    assert!(model.preview().to_html().contains(ERROR_MARKER));
}

#[test]
fn test_new_document_cancels_running_pass() {
    let (model, recorded) = model_with_stub();
    let mut model = open(model, "/docs/a.md", "```mermaid\nfirst\n```\n\n```mermaid\nsecond\n```\n");
    assert_eq!(model.pump_diagrams(), PassStatus::Pending);

    let mut model = open(model, "/docs/b.md", "```mermaid\nthird\n```\n");
    model.settle_diagrams();

    assert_eq!(model.scheduler().passes_cancelled(), 1);
    assert_eq!(recorded.lock().unwrap().sources, vec!["third\n"]);
}

#[test]
fn test_next_theme_cycles_catalog() {
    let (model, _) = model_with_stub();
    let model = update(model, Message::NextTheme);
    assert_eq!(model.workspace.theme().as_str(), "solarized");
}

#[test]
fn test_document_changed_updates_only_open_documents() {
    let (model, _) = model_with_stub();
    let model = open(model, "/docs/a.md", "# Old");
    let model = update(
        model,
        Message::DocumentChanged {
            path: PathBuf::from("/docs/a.md"),
            content: "# New".into(),
        },
    );
    assert!(model.rendered_html().contains("New"));
    let model = update(
        model,
        Message::DocumentChanged {
            path: PathBuf::from("/docs/missing.md"),
            content: "# Ghost".into(),
        },
    );
    assert_eq!(model.workspace.document_count(), 1);
    assert_eq!(model.workspace.recent_paths().len(), 1);
}

#[test]
fn test_folder_loaded_switches_view() {
    let (model, _) = model_with_stub();
    let model = update(
        model,
        Message::FolderLoaded {
            path: PathBuf::from("/notes"),
            files: vec![entry("a.md")],
        },
    );
    assert_eq!(model.workspace.view_mode(), ViewMode::Folder);
    let model = update(model, Message::ToggleViewMode);
    let model = update(model, Message::ToggleViewMode);
    assert_eq!(model.workspace.view_mode(), ViewMode::Folder);
    let model = update(model, Message::ClearFolder);
    assert_eq!(model.workspace.view_mode(), ViewMode::Preview);
}

#[test]
fn test_quit_sets_should_quit() {
    let model = update(Model::default(), Message::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_toast_lifecycle() {
    let mut model = Model::default();
    model.show_toast(ToastLevel::Info, "hello");
    assert_eq!(model.toast_message(), Some("hello"));
    assert_eq!(model.toast_level(), Some(ToastLevel::Info));
    assert!(!model.expire_toast(Instant::now()));
    assert!(model.expire_toast(Instant::now() + Duration::from_secs(10)));
    assert_eq!(model.toast_message(), None);
}

#[test]
fn test_app_opens_files_from_source_and_starts_on_first() {
    let (loader, _) = stub_engine();
    let source = MemorySource::new()
        .with_file("/docs/one.md", "# One")
        .with_file("/docs/two.md", "# Two");
    let app = App::new(vec!["/docs/one.md".into(), "/docs/two.md".into()])
        .with_source(source)
        .with_engine_loader(loader);
    let model = app.build_model();
    assert_eq!(model.workspace.document_count(), 2);
    assert_eq!(model.workspace.active_index(), 0);
    assert!(model.rendered_html().contains("One"));
}

#[test]
fn test_app_open_failure_shows_error_toast_without_mutation() {
    let (loader, _) = stub_engine();
    let app = App::new(vec!["/docs/missing.md".into()])
        .with_source(MemorySource::new())
        .with_engine_loader(loader);
    let model = app.build_model();
    assert!(model.workspace.is_empty());
    assert!(model.workspace.recent_paths().is_empty());
    assert_eq!(model.toast_level(), Some(ToastLevel::Error));
    assert!(model.toast_message().unwrap().contains("missing.md"));
}

#[test]
fn test_app_folder_scan_failure_keeps_view() {
    let (loader, _) = stub_engine();
    let app = App::new(Vec::new())
        .with_folder(Some("/nowhere".into()))
        .with_source(MemorySource::new())
        .with_engine_loader(loader);
    let model = app.build_model();
    assert!(model.workspace.folder().is_none());
    assert_eq!(model.workspace.view_mode(), ViewMode::Preview);
    assert_eq!(model.toast_level(), Some(ToastLevel::Error));
}

#[test]
fn test_app_folder_listing_from_source() {
    let (loader, _) = stub_engine();
    let source = MemorySource::new().with_folder("/notes", vec![entry("a.md"), entry("b.md")]);
    let app = App::new(Vec::new())
        .with_folder(Some("/notes".into()))
        .with_source(source)
        .with_engine_loader(loader);
    let model = app.build_model();
    assert_eq!(model.workspace.view_mode(), ViewMode::Folder);
    assert_eq!(model.workspace.folder().map(|f| f.files.len()), Some(2));
    assert!(model.view_html().contains("2 files"));
}

fn folder_app() -> App {
    let (loader, _) = stub_engine();
    let source = MemorySource::new()
        .with_folder("/notes", vec![entry("a.md"), entry("b.md")])
        .with_file("/notes/a.md", "# Alpha")
        .with_file("/notes/b.md", "# Beta");
    App::new(Vec::new())
        .with_folder(Some("/notes".into()))
        .with_source(source)
        .with_engine_loader(loader)
}

#[test]
fn test_opening_folder_entry_shows_it_in_preview() {
    let app = folder_app();
    let model = app.build_model();
    assert_eq!(model.workspace.view_mode(), ViewMode::Folder);

    let model = app.open_folder_entry(model, 1);
    assert_eq!(model.workspace.view_mode(), ViewMode::Preview);
    assert_eq!(model.workspace.active_path(), Some(Path::new("/notes/b.md")));
    assert!(model.view_html().contains("<h1>Beta</h1>"));

    // The listing is still loaded and one toggle pair away.
    let model = update(model, Message::ToggleViewMode);
    let model = update(model, Message::ToggleViewMode);
    assert_eq!(model.workspace.view_mode(), ViewMode::Folder);
}

#[test]
fn test_open_path_over_listing_shows_document() {
    let app = folder_app();
    let model = app.build_model();
    let model = app.open_path(model, Path::new("/notes/a.md"));
    assert_eq!(model.workspace.view_mode(), ViewMode::Preview);
    assert!(model.view_html().contains("<h1>Alpha</h1>"));
}

#[test]
fn test_open_folder_entry_out_of_range_is_noop() {
    let app = folder_app();
    let model = app.build_model();
    let model = app.open_folder_entry(model, 5);
    assert!(model.workspace.is_empty());
    assert_eq!(model.workspace.view_mode(), ViewMode::Folder);
}

#[test]
fn test_folder_search_narrows_entries() {
    let app = folder_app();
    let model = app.build_model();
    let model = update(model, Message::StartFolderSearch);
    assert!(model.folder_search);
    let model = update(model, Message::SetFolderQuery("b.md".into()));
    let model = update(model, Message::EndFolderSearch);
    assert!(!model.folder_search);

    // Entry numbers follow the filtered listing.
    let model = app.open_folder_entry(model, 0);
    assert_eq!(model.workspace.active_path(), Some(Path::new("/notes/b.md")));
}

#[test]
fn test_cancelled_search_restores_listing() {
    let app = folder_app();
    let model = app.build_model();
    let model = update(model, Message::StartFolderSearch);
    let model = update(model, Message::SetFolderQuery("zzz".into()));
    assert!(model.workspace.folder_entry(0).is_none());
    let model = update(model, Message::CancelFolderSearch);
    assert!(!model.folder_search);
    assert_eq!(model.workspace.folder().map(|f| f.query.as_str()), Some(""));
    assert!(model.workspace.folder_entry(1).is_some());
}

#[test]
fn test_search_only_starts_in_folder_view_and_ends_when_leaving_it() {
    let (model, _) = model_with_stub();
    let model = update(model, Message::StartFolderSearch);
    assert!(!model.folder_search);

    let app = folder_app();
    let model = update(app.build_model(), Message::StartFolderSearch);
    assert!(model.folder_search);
    let model = update(model, Message::SetViewMode(ViewMode::Preview));
    assert!(!model.folder_search);
}

#[test]
fn test_export_writes_page_with_diagrams() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("page.html");
    let (loader, _) = stub_engine();
    let app = App::new(vec!["/docs/flow.md".into()])
        .with_source(MemorySource::new().with_file("/docs/flow.md", DIAGRAM_DOC))
        .with_theme(ThemeId::new("nord"))
        .with_output(Some(out.clone()))
        .with_engine_loader(loader);
    app.export().unwrap();

    let page = std::fs::read_to_string(&out).unwrap();
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains("data-theme=\"nord\""));
    assert!(page.contains("<svg id=\"mermaid-"));
}

#[test]
fn test_reload_paths_reads_from_source() {
    let (loader, _) = stub_engine();
    let app = App::new(Vec::new())
        .with_source(MemorySource::new().with_file("/docs/a.md", "# Fresh"))
        .with_engine_loader(loader);
    let model = open(app.build_model(), "/docs/a.md", "# Stale");
    let model = app.reload_paths(model, &[PathBuf::from("/docs/a.md")]);
    assert!(model.rendered_html().contains("Fresh"));
}

#[test]
fn test_key_bindings() {
    let key = |code| KeyEvent::new(code, KeyModifiers::NONE);
    assert_eq!(key_message(key(KeyCode::Char('q'))), Some(Message::Quit));
    assert_eq!(key_message(key(KeyCode::Char('w'))), Some(Message::CloseActiveTab));
    assert_eq!(key_message(key(KeyCode::Char('t'))), Some(Message::ToggleViewMode));
    assert_eq!(key_message(key(KeyCode::Char('n'))), Some(Message::NextTheme));
    assert_eq!(key_message(key(KeyCode::Char('3'))), Some(Message::SwitchTab(2)));
    assert_eq!(key_message(key(KeyCode::Tab)), None);
    assert_eq!(
        key_message(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        Some(Message::Quit)
    );
    assert_eq!(
        key_message(KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CONTROL)),
        None
    );
}

#[test]
fn test_folder_view_keys_open_cards_and_search() {
    let key = |code| KeyEvent::new(code, KeyModifiers::NONE);
    let model = folder_app().build_model();
    assert_eq!(
        key_action(key(KeyCode::Char('2')), &model),
        Some(KeyAction::OpenFolderEntry(1))
    );
    assert_eq!(
        key_action(key(KeyCode::Char('/')), &model),
        Some(KeyAction::Update(Message::StartFolderSearch))
    );
    assert_eq!(
        key_action(key(KeyCode::Char('n')), &model),
        Some(KeyAction::Update(Message::NextTheme))
    );

    let model = update(model, Message::StartFolderSearch);
    let model = update(model, Message::SetFolderQuery("al".into()));
    assert_eq!(
        key_action(key(KeyCode::Char('q')), &model),
        Some(KeyAction::Update(Message::SetFolderQuery("alq".into())))
    );
    assert_eq!(
        key_action(key(KeyCode::Backspace), &model),
        Some(KeyAction::Update(Message::SetFolderQuery("a".into())))
    );
    assert_eq!(
        key_action(key(KeyCode::Enter), &model),
        Some(KeyAction::Update(Message::EndFolderSearch))
    );
    assert_eq!(
        key_action(key(KeyCode::Esc), &model),
        Some(KeyAction::Update(Message::CancelFolderSearch))
    );
    assert!(status_line(&model, Path::new("/tmp/out.html")).contains("search: al_"));
}

#[test]
fn test_digits_switch_tabs_outside_folder_view() {
    let (model, _) = model_with_stub();
    let model = open(model, "/docs/a.md", "# A");
    assert_eq!(
        key_action(KeyEvent::new(KeyCode::Char('1'), KeyModifiers::NONE), &model),
        Some(KeyAction::Update(Message::SwitchTab(0)))
    );
}

#[test]
fn test_parse_dropped_paths_handles_quotes_and_escapes() {
    let paths = parse_dropped_paths("'/tmp/my notes.md' /tmp/a\\ b.md\n\"/x/y.markdown\"\nfile:///z/c.md\n");
    assert_eq!(
        paths,
        vec![
            PathBuf::from("/tmp/my notes.md"),
            PathBuf::from("/tmp/a b.md"),
            PathBuf::from("/x/y.markdown"),
            PathBuf::from("/z/c.md"),
        ]
    );
    assert!(parse_dropped_paths("  \n").is_empty());
}

#[test]
fn test_status_line_summarizes_state() {
    let (model, _) = model_with_stub();
    let model = open(model, "/docs/a.md", "# A");
    let model = open(model, "/docs/b.md", "# B");
    let line = status_line(&model, Path::new("/tmp/out.html"));
    assert!(line.starts_with("[2/2] b.md | github | preview | /tmp/out.html"), "{line}");
}
