//! Page lifecycle: load sequence, trigger wiring, and event dispatch.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::app::backend::Backend;
use crate::app::expand;
use crate::app::explorer::{Explorer, NodeId};
use crate::app::selection::SelectionController;
use crate::app::store::{SelectionStore, Storage};
use crate::app::submit::{Document, SubmissionController, SubmitAction, SubmitOutcome};
use crate::domain::errors::BackendError;
use crate::domain::model::TreeNode;

/// Alert shown when the tree endpoint answers with a non-success status.
pub const FETCH_STATUS_ALERT: &str = "Failed to fetch file structure.";
/// Alert shown when the tree request fails outright or returns malformed JSON.
pub const FETCH_ERROR_ALERT: &str = "An error occurred while fetching the file structure.";

/// The surrounding UI environment.
pub trait Host {
    /// Show a blocking, user-facing message.
    fn alert(&mut self, message: &str);
}

/// Buttons that may be wired to a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Trigger {
    SelectAll,
    DeselectAll,
    Concatenate,
    ConcatenateWithAi,
    ConcatenateV2,
}

impl Trigger {
    fn action(&self) -> Option<SubmitAction> {
        match self {
            Trigger::Concatenate => Some(SubmitAction::Concatenate),
            Trigger::ConcatenateWithAi => Some(SubmitAction::ConcatenateWithAi),
            Trigger::ConcatenateV2 => Some(SubmitAction::ConcatenateV2),
            Trigger::SelectAll | Trigger::DeselectAll => None,
        }
    }
}

/// Elements the page template provides. Only the explorer is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAnchors {
    pub explorer: bool,
    pub triggers: BTreeSet<Trigger>,
    /// Initial state of the include-line-numbers checkbox, if the page has one.
    pub include_line_numbers: Option<bool>,
    pub base_dir_form: bool,
}

impl PageAnchors {
    /// A page providing every optional element.
    pub fn full() -> Self {
        Self {
            explorer: true,
            triggers: [
                Trigger::SelectAll,
                Trigger::DeselectAll,
                Trigger::Concatenate,
                Trigger::ConcatenateWithAi,
                Trigger::ConcatenateV2,
            ]
            .into_iter()
            .collect(),
            include_line_numbers: Some(false),
            base_dir_form: true,
        }
    }

    /// A page with only the explorer container.
    pub fn explorer_only() -> Self {
        Self {
            explorer: true,
            triggers: BTreeSet::new(),
            include_line_numbers: None,
            base_dir_form: false,
        }
    }
}

/// User interactions routed through [`Page::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Click(Trigger),
    FolderClick(NodeId),
    CheckboxChange { checkbox: NodeId, checked: bool },
    LineNumbersChange(bool),
    BaseDirSubmit(String),
}

/// What the host should do after an event was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Idle,
    Navigated(Document),
    Replaced(Document),
    Reload,
}

/// A loaded file picker page.
#[derive(Debug)]
pub struct Page<B, S> {
    anchors: PageAnchors,
    explorer: Explorer,
    tree: Vec<TreeNode>,
    selection: SelectionController<S>,
    submission: SubmissionController<B>,
    include_line_numbers: bool,
}

impl<B: Backend, S: Storage> Page<B, S> {
    /// Run the load sequence. Returns `None` when the page has no explorer container.
    ///
    /// A failed tree fetch alerts the user and leaves the explorer empty; the page is still
    /// returned so the remaining controls keep working.
    pub async fn load(
        anchors: PageAnchors,
        backend: B,
        store: SelectionStore<S>,
        host: &mut impl Host,
    ) -> Option<Self> {
        if !anchors.explorer {
            warn!("page has no file explorer container, skipping initialization");
            return None;
        }

        let mut explorer = Explorer::new();
        let tree = match backend.fetch_tree().await {
            Ok(tree) => {
                let root = explorer.root();
                explorer.render(&tree, root);
                tree
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch file structure");
                host.alert(match err {
                    BackendError::Status(_) => FETCH_STATUS_ALERT,
                    BackendError::Transport(_) | BackendError::Decode(_) => FETCH_ERROR_ALERT,
                });
                Vec::new()
            }
        };

        let selection = SelectionController::new(store);
        selection.restore(&mut explorer);
        let root = explorer.root();
        expand::expand_all(&mut explorer, root, &selection.store().load());
        debug!(
            files = explorer.file_values().len(),
            restored = explorer.checked_values().len(),
            "file explorer ready"
        );

        Some(Self {
            include_line_numbers: anchors.include_line_numbers.unwrap_or(false),
            anchors,
            explorer,
            tree,
            selection,
            submission: SubmissionController::new(backend),
        })
    }

    pub fn explorer(&self) -> &Explorer {
        &self.explorer
    }

    pub fn tree(&self) -> &[TreeNode] {
        &self.tree
    }

    pub fn selection(&self) -> &SelectionController<S> {
        &self.selection
    }

    pub fn anchors(&self) -> &PageAnchors {
        &self.anchors
    }

    pub fn include_line_numbers(&self) -> bool {
        self.include_line_numbers
    }

    /// Whether `trigger` is present on the page and therefore wired.
    pub fn is_wired(&self, trigger: Trigger) -> bool {
        self.anchors.triggers.contains(&trigger)
    }

    /// Handle one user interaction.
    pub async fn dispatch(&mut self, event: PageEvent, host: &mut impl Host) -> PageOutcome {
        match event {
            PageEvent::Click(trigger) if !self.is_wired(trigger) => {
                debug!(?trigger, "trigger not present on page");
                PageOutcome::Idle
            }
            PageEvent::Click(Trigger::SelectAll) => {
                self.selection.select_all(&mut self.explorer, &self.tree);
                let root = self.explorer.root();
                expand::expand_all(&mut self.explorer, root, &self.selection.store().load());
                PageOutcome::Idle
            }
            PageEvent::Click(Trigger::DeselectAll) => {
                self.selection.deselect_all(&mut self.explorer);
                PageOutcome::Idle
            }
            PageEvent::Click(trigger) => {
                let Some(action) = trigger.action() else {
                    return PageOutcome::Idle;
                };
                let outcome = self
                    .submission
                    .submit(
                        action,
                        &self.explorer,
                        &mut self.selection,
                        self.include_line_numbers,
                        host,
                    )
                    .await;
                match outcome {
                    SubmitOutcome::Navigated(document) => PageOutcome::Navigated(document),
                    SubmitOutcome::Replaced(document) => PageOutcome::Replaced(document),
                    SubmitOutcome::Aborted | SubmitOutcome::Failed => PageOutcome::Idle,
                }
            }
            PageEvent::FolderClick(toggle) => {
                self.explorer.click_folder(toggle);
                PageOutcome::Idle
            }
            PageEvent::CheckboxChange { checkbox, checked } => {
                self.selection
                    .on_change(&mut self.explorer, checkbox, checked);
                PageOutcome::Idle
            }
            PageEvent::LineNumbersChange(value) => {
                if self.anchors.include_line_numbers.is_some() {
                    self.include_line_numbers = value;
                }
                PageOutcome::Idle
            }
            PageEvent::BaseDirSubmit(path) => {
                if !self.anchors.base_dir_form {
                    return PageOutcome::Idle;
                }
                self.selection.forget();
                match self.submission.backend().update_base_dir(&path).await {
                    Ok(()) => {
                        info!(path, "base directory updated");
                        PageOutcome::Reload
                    }
                    Err(err) => {
                        warn!(path, error = %err, "failed to update base directory");
                        host.alert(&format!("Error updating base directory: {err}"));
                        PageOutcome::Idle
                    }
                }
            }
        }
    }

    /// Tear the page down, keeping its backend and store for the next load.
    pub fn into_parts(self) -> (B, SelectionStore<S>) {
        (
            self.submission.into_backend(),
            self.selection.into_store(),
        )
    }
}
