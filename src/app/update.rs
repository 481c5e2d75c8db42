use std::path::PathBuf;

use crate::app::Model;
use crate::theme::{self, ThemeId};
use crate::workspace::{FolderEntry, ViewMode};

/// All possible events and actions in the application.
///
/// Messages carry data that is already loaded; reading files happens in the
/// side-effect layer before a message is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Documents
    /// A document was loaded and should be opened (or refreshed) and activated
    DocumentLoaded { path: PathBuf, content: String },
    /// An open document changed on disk
    DocumentChanged { path: PathBuf, content: String },
    /// Close all documents
    ClearDocuments,

    // Tabs
    /// Activate the tab at index
    SwitchTab(usize),
    /// Close the tab at index
    CloseTab(usize),
    /// Close the active tab
    CloseActiveTab,
    /// Cycle to the next tab
    NextTab,
    /// Cycle to the previous tab
    PrevTab,

    // Appearance
    /// Apply a theme by id
    SetTheme(ThemeId),
    /// Apply the catalog theme after the current one
    NextTheme,
    /// Flip between content and theme selection
    ToggleViewMode,
    /// Switch to a view mode directly
    SetViewMode(ViewMode),

    // Folder
    /// A folder scan finished
    FolderLoaded { path: PathBuf, files: Vec<FolderEntry> },
    /// Drop the folder listing
    ClearFolder,
    /// Start typing a folder search query
    StartFolderSearch,
    /// Replace the folder search query
    SetFolderQuery(String),
    /// Stop typing, keeping the query
    EndFolderSearch,
    /// Stop typing and show every entry again
    CancelFolderSearch,

    /// Leave the application
    Quit,
}

/// Apply `msg` to the model and bring derived state up to date.
pub fn update(mut model: Model, msg: Message) -> Model {
    let ws = &mut model.workspace;
    match msg {
        Message::DocumentLoaded { path, content } => ws.add_document(path, content),
        Message::DocumentChanged { path, content } => {
            if !ws.reload_document(&path, content) {
                tracing::debug!(path = %path.display(), "change for a document that is no longer open");
            }
        }
        Message::ClearDocuments => ws.clear(),
        Message::SwitchTab(index) => ws.switch_tab(index),
        Message::CloseTab(index) => ws.close_tab(index),
        Message::CloseActiveTab => {
            let index = ws.active_index();
            ws.close_tab(index);
        }
        Message::NextTab => ws.next_tab(),
        Message::PrevTab => ws.prev_tab(),
        Message::SetTheme(id) => ws.set_theme(id),
        Message::NextTheme => {
            let next = theme::next_after(ws.theme());
            ws.set_theme(next.theme_id());
        }
        Message::ToggleViewMode => ws.toggle_view_mode(),
        Message::SetViewMode(mode) => ws.set_view_mode(mode),
        Message::FolderLoaded { path, files } => ws.set_folder_files(path, files),
        Message::ClearFolder => ws.clear_folder(),
        Message::StartFolderSearch => {
            model.folder_search = ws.view_mode() == ViewMode::Folder && ws.folder().is_some();
        }
        Message::SetFolderQuery(query) => ws.set_folder_query(query),
        Message::EndFolderSearch => model.folder_search = false,
        Message::CancelFolderSearch => {
            ws.set_folder_query("");
            model.folder_search = false;
        }
        Message::Quit => model.should_quit = true,
    }
    if model.workspace.view_mode() != ViewMode::Folder {
        model.folder_search = false;
    }
    model.sync_preview();
    model
}
