use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use tabmark::app::{App, Message, update};
use tabmark::files::{FileSource, FsSource};
use tabmark::input::{DropEvent, DropGateway, DropPolicy, EventSource};
use tabmark::theme::ThemeId;
use tabmark::workspace::ViewMode;

const SAMPLE: &str = include_str!("fixtures/sample.md");

#[test]
fn test_export_renders_fixture_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let doc = dir.path().join("notes.md");
    std::fs::write(&doc, SAMPLE).unwrap();
    let out = dir.path().join("out.html");

    App::new(vec![doc])
        .with_theme(ThemeId::new("github-dark"))
        .with_output(Some(out.clone()))
        .export()
        .unwrap();

    let page = std::fs::read_to_string(&out).unwrap();
    assert!(page.contains("<title>notes.md</title>"));
    assert!(page.contains("<h1>Release Notes</h1>"));
    assert!(page.contains("class=\"mermaid-block\""));
    assert!(page.contains("<table>"));
    assert!(!page.contains("<script>"));
    assert!(page.contains("&lt;script&gt;"));
}

#[test]
fn test_folder_scan_and_open_entry() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("b.md"), "# Bee\n\nsecond file").unwrap();
    std::fs::write(dir.path().join("sub").join("a.MARKDOWN"), "# Ay").unwrap();
    std::fs::write(dir.path().join("skip.txt"), "not markdown").unwrap();

    let app = App::new(Vec::new()).with_folder(Some(dir.path().to_path_buf()));
    let model = app.build_model();
    assert_eq!(model.workspace.view_mode(), ViewMode::Folder);
    let folder = model.workspace.folder().unwrap();
    let names: Vec<_> = folder.files.iter().map(|f| f.relative_path.as_str()).collect();
    assert_eq!(names, vec!["b.md", "sub/a.MARKDOWN"]);

    let entry_path = model.workspace.folder_entry(0).unwrap().path.clone();
    let model = app.open_path(model, &entry_path);
    assert_eq!(model.workspace.active_path(), Some(entry_path.as_path()));
    assert!(model.rendered_html().contains("<h1>Bee</h1>"));

    let model = update(model, Message::SetViewMode(ViewMode::Preview));
    assert!(model.view_html().contains("<h1>Bee</h1>"));
}

#[test]
fn test_dropped_files_open_through_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let md = dir.path().join("drop.md");
    let png = dir.path().join("image.png");
    std::fs::write(&md, "# Dropped").unwrap();
    std::fs::write(&png, [0u8; 4]).unwrap();

    let app = App::new(Vec::new());
    let mut model = app.build_model();

    let drops = EventSource::new();
    let opened: Rc<RefCell<Vec<PathBuf>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = opened.clone();
    let _gateway = DropGateway::activate(&drops, DropPolicy::MarkdownOnly, move |paths| {
        sink.borrow_mut().extend(paths);
    });
    drops.dispatch(&DropEvent::Drop(vec![md.clone(), png]), &mut model.workspace);

    let paths: Vec<PathBuf> = opened.borrow_mut().drain(..).collect();
    let model = app.open_paths(model, &paths);
    assert_eq!(model.workspace.document_count(), 1);
    assert_eq!(model.workspace.recent_paths(), &[md]);
    assert!(model.rendered_html().contains("Dropped"));
}

#[test]
fn test_fs_source_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = FsSource.load_file(&dir.path().join("nope.md")).unwrap_err();
    assert!(err.to_string().contains("nope.md"));
}
