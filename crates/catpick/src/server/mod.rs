//! `catpick serve`: the HTTP side of the file picker.

pub mod pages;
mod routes;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use parking_lot::RwLock;
use tokio::net::TcpListener;
use tracing::info;

use crate::app::scan::ScannerConfig;
use crate::infra::config::{self, Config};
use pages::Pages;

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Shared>,
}

struct Shared {
    scan: RwLock<ScannerConfig>,
    /// Where base directory changes are written; `None` keeps them in memory only.
    config_path: Option<PathBuf>,
    pages: Pages,
}

impl AppState {
    pub fn new(scan: ScannerConfig, config_path: Option<PathBuf>) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(Shared {
                scan: RwLock::new(scan),
                config_path,
                pages: Pages::new()?,
            }),
        })
    }

    pub fn base_dir(&self) -> PathBuf {
        self.inner.scan.read().root.clone()
    }

    fn scan_settings(&self) -> ScannerConfig {
        self.inner.scan.read().clone()
    }

    fn set_base_dir(&self, dir: PathBuf) {
        self.inner.scan.write().root = dir;
    }

    fn config_path(&self) -> Option<&PathBuf> {
        self.inner.config_path.as_ref()
    }

    fn pages(&self) -> &Pages {
        &self.inner.pages
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/file_structure", get(routes::file_structure))
        .route("/update_base_dir", post(routes::update_base_dir))
        .route("/results", post(routes::results))
        .route("/concat_with_ai", post(routes::concat_with_ai))
        .route("/concatenate_v2", post(routes::concatenate_v2))
        .route("/test_endpoint", get(routes::test_endpoint))
        .with_state(state)
}

/// Serve on an already bound listener until the process is stopped.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr: SocketAddr = listener.local_addr()?;
    info!(base_dir = %state.base_dir().display(), "catpick listening on http://{addr}");
    axum::serve(listener, router(state))
        .await
        .context("server terminated")
}

/// Bind the configured address and serve the configured base directory.
pub async fn run(config: &Config) -> Result<()> {
    let mut scan = ScannerConfig::from_config(config);
    if let Ok(resolved) = std::fs::canonicalize(&scan.root) {
        scan.root = resolved;
    }
    let state = AppState::new(scan, config::workspace_config_path()?)?;
    let address = config.server.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    serve(listener, state).await
}
