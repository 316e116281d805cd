use std::fs;
use std::path::PathBuf;

use axum::Json;
use axum::extract::{Form, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;
use tracing::{info, warn};

use super::AppState;
use super::pages::ResultView;
use crate::app::concat;
use crate::app::scan::Scanner;
use crate::domain::errors::ConcatError;
use crate::domain::model::TreeNode;
use crate::infra::config;

const INVALID_BASE_DIR: &str = "The specified path is not a valid directory.";

#[derive(Debug)]
pub(super) struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn internal(err: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }

    fn bad_request(err: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// Fields shared by the three submission actions.
#[derive(Debug, Default, PartialEq, Eq)]
struct SubmissionForm {
    selected_files: Vec<String>,
    include_line_numbers: bool,
}

impl SubmissionForm {
    fn push(&mut self, name: &str, value: String) {
        match name {
            "selected_files" if !value.is_empty() => self.selected_files.push(value),
            "include_line_numbers" => self.include_line_numbers = parse_flag(&value),
            _ => {}
        }
    }

    /// Parse a url-encoded body. Repeated `selected_files` keys are kept in order.
    fn from_urlencoded(body: &[u8]) -> Self {
        let mut form = Self::default();
        for (name, value) in url::form_urlencoded::parse(body) {
            form.push(&name, value.into_owned());
        }
        form
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(AppError::bad_request)? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            let value = field.text().await.map_err(AppError::bad_request)?;
            form.push(&name, value);
        }
        Ok(form)
    }

    /// Concatenate the selection on the blocking pool.
    async fn into_view(self, base_dir: PathBuf) -> Result<ResultView, AppError> {
        tokio::task::spawn_blocking(move || {
            let content =
                concat::concatenate(&base_dir, &self.selected_files, self.include_line_numbers);
            ResultView {
                content,
                selected_files: self.selected_files,
                include_line_numbers: self.include_line_numbers,
            }
        })
        .await
        .map_err(AppError::internal)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "on" | "yes"
    )
}

fn index_with_error(state: &AppState, message: &str) -> Result<Response, AppError> {
    let html = state
        .pages()
        .index(&state.base_dir(), Some(message))
        .map_err(AppError::internal)?;
    Ok((StatusCode::BAD_REQUEST, Html(html)).into_response())
}

pub(super) async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let html = state
        .pages()
        .index(&state.base_dir(), None)
        .map_err(AppError::internal)?;
    Ok(Html(html))
}

pub(super) async fn file_structure(
    State(state): State<AppState>,
) -> Result<Json<Vec<TreeNode>>, AppError> {
    let settings = state.scan_settings();
    let tree = tokio::task::spawn_blocking(move || Scanner::new().scan(&settings))
        .await
        .map_err(AppError::internal)?
        .map_err(AppError::internal)?;
    Ok(Json(tree))
}

#[derive(Debug, Deserialize)]
pub(super) struct BaseDirForm {
    new_base_dir: String,
}

pub(super) async fn update_base_dir(
    State(state): State<AppState>,
    Form(form): Form<BaseDirForm>,
) -> Result<Response, AppError> {
    let resolved = match fs::canonicalize(form.new_base_dir.trim()) {
        Ok(path) if path.is_dir() => path,
        _ => {
            warn!(requested = %form.new_base_dir, "rejected base directory");
            return index_with_error(
                &state,
                &format!("Error updating base directory: {INVALID_BASE_DIR}"),
            );
        }
    };

    if let Some(path) = state.config_path()
        && let Err(err) = config::persist_base_dir(path, &resolved)
    {
        warn!(error = %err, "failed to persist base directory");
        return index_with_error(&state, &format!("Error updating base directory: {err:#}"));
    }

    info!(base_dir = %resolved.display(), "base directory updated");
    state.set_base_dir(resolved);
    Ok(Redirect::to("/").into_response())
}

pub(super) async fn results(
    State(state): State<AppState>,
    body: String,
) -> Result<Response, AppError> {
    let form = SubmissionForm::from_urlencoded(body.as_bytes());
    if form.selected_files.is_empty() {
        return index_with_error(&state, &ConcatError::NoFiles.to_string());
    }

    info!(files = form.selected_files.len(), "concatenating selection");
    let view = form.into_view(state.base_dir()).await?;
    let html = state.pages().result(&view).map_err(AppError::internal)?;
    Ok(Html(html).into_response())
}

pub(super) async fn concat_with_ai(
    State(state): State<AppState>,
    body: String,
) -> Result<Response, AppError> {
    let form = SubmissionForm::from_urlencoded(body.as_bytes());
    let base_dir = state.base_dir();
    let collected = tokio::task::spawn_blocking(move || {
        concat::collect_for_ai(&base_dir, &form.selected_files)
    })
    .await
    .map_err(AppError::internal)?;
    let files = match collected {
        Ok(files) => files,
        Err(err) => return index_with_error(&state, &err.to_string()),
    };

    info!(files = files.len(), "collected selection for AI processing");
    let html = state.pages().result_ai(&files).map_err(AppError::internal)?;
    Ok(Html(html).into_response())
}

pub(super) async fn concatenate_v2(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = SubmissionForm::from_multipart(multipart).await?;
    if form.selected_files.is_empty() {
        return index_with_error(&state, &ConcatError::NoFiles.to_string());
    }

    info!(files = form.selected_files.len(), "concatenating selection (v2)");
    let view = form.into_view(state.base_dir()).await?;
    let html = state.pages().result_v2(&view).map_err(AppError::internal)?;
    Ok(Html(html).into_response())
}

pub(super) async fn test_endpoint() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Endpoint is working" }))
}
