//! Revealing selected files by opening their ancestor folders.
//!
//! Folders are matched by label text anywhere in the explorer, not by their full path. When two
//! folders share a name the first one in document order is opened, even if the file lives under
//! the other one.

use tracing::debug;

use crate::app::explorer::{ElementKind, Explorer, NodeId};
use crate::domain::model::SelectionSet;

/// Open every ancestor folder of `file_path` below `scope`.
pub fn expand(explorer: &mut Explorer, scope: NodeId, file_path: &str) {
    let mut segments: Vec<&str> = file_path.split('/').collect();
    segments.pop();

    for segment in segments {
        let Some(toggle) = find_folder_toggle(explorer, scope, segment) else {
            debug!(segment, file_path, "no folder label matches path segment");
            continue;
        };
        let Some(item) = explorer.parent(toggle) else {
            continue;
        };
        explorer.add_class(item, "open");
        if let Some(nested) = explorer.nested_list(item) {
            explorer.set_list_visible(nested, true);
        }
    }
}

/// Reveal every path in `selection`.
pub fn expand_all(explorer: &mut Explorer, scope: NodeId, selection: &SelectionSet) {
    for path in selection.iter() {
        expand(explorer, scope, path);
    }
}

fn find_folder_toggle(explorer: &Explorer, scope: NodeId, name: &str) -> Option<NodeId> {
    explorer
        .folder_toggles(scope)
        .into_iter()
        .find(|id| matches!(explorer.kind(*id), Some(ElementKind::FolderToggle { text }) if text == name))
}
