//! Transport seam between the widget and the server endpoints.

use std::future::Future;

use crate::domain::errors::BackendError;
use crate::domain::model::{SubmissionPayload, TreeNode};

/// Path of the directory description endpoint.
pub const FILE_STRUCTURE_PATH: &str = "/file_structure";
/// Path of the base directory form action.
pub const UPDATE_BASE_DIR_PATH: &str = "/update_base_dir";

/// Server operations the widget depends on. Each call is one suspension point.
pub trait Backend {
    /// Fetch the directory description.
    fn fetch_tree(&self) -> impl Future<Output = Result<Vec<TreeNode>, BackendError>>;

    /// Post `payload` as a url-encoded form to `action` and return the resulting page.
    fn submit_form(
        &self,
        action: &str,
        payload: &SubmissionPayload,
    ) -> impl Future<Output = Result<String, BackendError>>;

    /// Post `payload` as a multipart body to `action` and return the response text.
    fn submit_multipart(
        &self,
        action: &str,
        payload: &SubmissionPayload,
    ) -> impl Future<Output = Result<String, BackendError>>;

    /// Ask the server to serve a different base directory.
    fn update_base_dir(&self, path: &str) -> impl Future<Output = Result<(), BackendError>>;
}
