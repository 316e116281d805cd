//! Keeping checkbox state and the persisted selection in step.

use tracing::{debug, warn};

use crate::app::expand;
use crate::app::explorer::{Explorer, NodeId};
use crate::app::store::{SelectionStore, Storage};
use crate::domain::model::{SelectionSet, TreeNode, file_paths};

/// Owns the in-memory [`SelectionSet`] and writes it through to the store after every change.
#[derive(Debug)]
pub struct SelectionController<S> {
    store: SelectionStore<S>,
    selection: SelectionSet,
}

impl<S: Storage> SelectionController<S> {
    /// Create a controller seeded from the store's persisted selection.
    pub fn new(store: SelectionStore<S>) -> Self {
        let selection = store.load();
        Self { store, selection }
    }

    /// The current in-memory selection.
    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn store(&self) -> &SelectionStore<S> {
        &self.store
    }

    pub fn into_store(self) -> SelectionStore<S> {
        self.store
    }

    /// Check the boxes of every persisted path. Paths missing from the tree are ignored.
    pub fn restore(&self, explorer: &mut Explorer) {
        for path in self.selection.iter() {
            match explorer.checkbox_by_value(path) {
                Some(checkbox) => explorer.set_checked(checkbox, true),
                None => debug!(path, "persisted selection no longer present in tree"),
            }
        }
    }

    /// Check every rendered box and select every file of `tree`, including collapsed ones.
    pub fn select_all(&mut self, explorer: &mut Explorer, tree: &[TreeNode]) {
        for checkbox in explorer.checkboxes(explorer.root()) {
            explorer.set_checked(checkbox, true);
        }
        self.selection = file_paths(tree).into_iter().collect();
        self.persist();
    }

    /// Uncheck every rendered box and persist an empty selection.
    pub fn deselect_all(&mut self, explorer: &mut Explorer) {
        for checkbox in explorer.checkboxes(explorer.root()) {
            explorer.set_checked(checkbox, false);
        }
        self.selection.clear();
        self.persist();
    }

    /// Apply a checkbox change event.
    ///
    /// A newly checked file is appended once and its ancestor folders are opened; an unchecked
    /// file is removed. The selection is persisted either way.
    pub fn on_change(&mut self, explorer: &mut Explorer, checkbox: NodeId, checked: bool) {
        let Some(path) = explorer.checkbox_value(checkbox).map(str::to_owned) else {
            return;
        };
        explorer.set_checked(checkbox, checked);

        if checked {
            self.selection.insert(path.clone());
        } else {
            self.selection.remove(&path);
        }
        self.persist();

        if checked {
            let root = explorer.root();
            expand::expand(explorer, root, &path);
        }
    }

    /// Replace the selection wholesale, as done right before a submission.
    pub fn replace(&mut self, selection: SelectionSet) {
        self.selection = selection;
        self.persist();
    }

    /// Forget the persisted selection without touching the checkboxes.
    pub fn forget(&mut self) {
        self.selection.clear();
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear persisted selection");
        }
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.save(&self.selection) {
            warn!(error = %err, "failed to persist selection");
        }
    }
}
