//! HTTP transport for the file picker, talking to a running `catpick serve`.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::redirect::Policy;

use crate::app::backend::{Backend, FILE_STRUCTURE_PATH, UPDATE_BASE_DIR_PATH};
use crate::domain::errors::BackendError;
use crate::domain::model::{SubmissionPayload, TreeNode};

/// [`Backend`] implementation over reqwest.
///
/// Redirects are not followed so that the `303 See Other` answering a base directory update can
/// be told apart from a re-rendered form page.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl HttpBackend {
    /// Backend whose requests wait for the server indefinitely.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().redirect(Policy::none());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build http client")?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Server origin, used to scope persisted selections.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn text(response: reqwest::Response) -> Result<String, BackendError> {
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }
        response.text().await.map_err(from_reqwest)
    }
}

impl Backend for HttpBackend {
    async fn fetch_tree(&self) -> Result<Vec<TreeNode>, BackendError> {
        let response = self
            .http
            .get(self.url(FILE_STRUCTURE_PATH))
            .send()
            .await
            .map_err(from_reqwest)?;
        if !response.status().is_success() {
            return Err(BackendError::Status(response.status().as_u16()));
        }
        response.json().await.map_err(from_reqwest)
    }

    async fn submit_form(
        &self,
        action: &str,
        payload: &SubmissionPayload,
    ) -> Result<String, BackendError> {
        let response = self
            .http
            .post(self.url(action))
            .form(&payload.form_fields())
            .send()
            .await
            .map_err(from_reqwest)?;
        Self::text(response).await
    }

    async fn submit_multipart(
        &self,
        action: &str,
        payload: &SubmissionPayload,
    ) -> Result<String, BackendError> {
        let form = payload
            .form_fields()
            .into_iter()
            .fold(reqwest::multipart::Form::new(), |form, (name, value)| {
                form.text(name, value)
            });
        let response = self
            .http
            .post(self.url(action))
            .multipart(form)
            .send()
            .await
            .map_err(from_reqwest)?;
        Self::text(response).await
    }

    async fn update_base_dir(&self, path: &str) -> Result<(), BackendError> {
        let response = self
            .http
            .post(self.url(UPDATE_BASE_DIR_PATH))
            .form(&[("new_base_dir", path)])
            .send()
            .await
            .map_err(from_reqwest)?;
        match response.status() {
            StatusCode::SEE_OTHER | StatusCode::FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            status => Err(BackendError::Status(status.as_u16())),
        }
    }
}

fn from_reqwest(err: reqwest::Error) -> BackendError {
    if err.is_decode() {
        BackendError::Decode(err.to_string())
    } else {
        BackendError::Transport(err.to_string())
    }
}
