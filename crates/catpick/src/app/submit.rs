//! Gathering the checked files and handing them to a server action.

use tracing::{info, warn};

use crate::app::backend::Backend;
use crate::app::explorer::Explorer;
use crate::app::page::Host;
use crate::app::selection::SelectionController;
use crate::app::store::Storage;
use crate::domain::model::{SelectionSet, SubmissionPayload};

/// Alert shown when a submission is attempted with nothing checked.
pub const EMPTY_SELECTION_ALERT: &str = "Please select at least one file to concatenate.";

/// Server actions that accept the selected files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmitAction {
    /// Plain concatenation, full navigation to the result page.
    Concatenate,
    /// AI-assisted concatenation, full navigation to the result page.
    ConcatenateWithAi,
    /// Asynchronous submission whose response replaces the current document.
    ConcatenateV2,
}

impl SubmitAction {
    pub fn endpoint(&self) -> &'static str {
        match self {
            SubmitAction::Concatenate => "/results",
            SubmitAction::ConcatenateWithAi => "/concat_with_ai",
            SubmitAction::ConcatenateV2 => "/concatenate_v2",
        }
    }

    /// Whether the response replaces the document in place instead of navigating.
    pub fn replaces_document(&self) -> bool {
        matches!(self, SubmitAction::ConcatenateV2)
    }
}

/// A page produced by a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub action: String,
    pub html: String,
}

/// Result of triggering a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing was checked; no request was made.
    Aborted,
    /// Full navigation to a new page, adding a history entry.
    Navigated(Document),
    /// The current document was replaced without a history entry.
    Replaced(Document),
    /// The request failed and the user was alerted.
    Failed,
}

/// Sends the live checkbox state to one of the server actions.
#[derive(Debug, Clone)]
pub struct SubmissionController<B> {
    backend: B,
}

impl<B: Backend> SubmissionController<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Build the payload from the checked boxes, or `None` when nothing is checked.
    pub fn payload(explorer: &Explorer, include_line_numbers: bool) -> Option<SubmissionPayload> {
        let selected_files = explorer.checked_values();
        if selected_files.is_empty() {
            return None;
        }
        Some(SubmissionPayload {
            selected_files,
            include_line_numbers,
        })
    }

    /// Submit the checked files to `action`.
    ///
    /// The checkboxes are the source of truth here, not the persisted selection. The selection
    /// is overwritten with what is being submitted so a later reload restores it.
    pub async fn submit<S: Storage>(
        &self,
        action: SubmitAction,
        explorer: &Explorer,
        selection: &mut SelectionController<S>,
        include_line_numbers: bool,
        host: &mut impl Host,
    ) -> SubmitOutcome {
        let Some(payload) = Self::payload(explorer, include_line_numbers) else {
            host.alert(EMPTY_SELECTION_ALERT);
            return SubmitOutcome::Aborted;
        };

        selection.replace(
            payload
                .selected_files
                .iter()
                .cloned()
                .collect::<SelectionSet>(),
        );
        info!(
            action = action.endpoint(),
            files = payload.selected_files.len(),
            include_line_numbers,
            "submitting selection"
        );

        let response = if action.replaces_document() {
            self.backend
                .submit_multipart(action.endpoint(), &payload)
                .await
        } else {
            self.backend.submit_form(action.endpoint(), &payload).await
        };

        match response {
            Ok(html) => {
                let document = Document {
                    action: action.endpoint().to_owned(),
                    html,
                };
                if action.replaces_document() {
                    SubmitOutcome::Replaced(document)
                } else {
                    SubmitOutcome::Navigated(document)
                }
            }
            Err(err) => {
                warn!(action = action.endpoint(), error = %err, "submission failed");
                host.alert(&format!("Failed to submit selection: {err}"));
                SubmitOutcome::Failed
            }
        }
    }
}
