//! Configuration management utilities.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use dirs_next::{config_dir, data_dir};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".catpick/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub scan: Scan,
    #[serde(default)]
    pub ignore: Ignore,
    #[serde(default)]
    pub client: Client,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    #[serde(default = "Server::default_host")]
    pub host: String,
    #[serde(default = "Server::default_port")]
    pub port: u16,
}

impl Server {
    fn default_host() -> String {
        "127.0.0.1".into()
    }

    fn default_port() -> u16 {
        8000
    }

    /// `host:port` socket address string.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

/// Directory tree settings served by `/file_structure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scan {
    #[serde(default)]
    base_dir: Option<String>,
    #[serde(default)]
    max_depth: Option<usize>,
    #[serde(default)]
    max_files: Option<usize>,
    #[serde(default)]
    ignore_extensions: Option<Vec<String>>,
    #[serde(default)]
    show_hidden: Option<bool>,
}

impl Scan {
    fn default_base_dir() -> &'static str {
        "../"
    }

    fn default_max_depth() -> usize {
        3
    }

    fn default_max_files() -> usize {
        1000
    }

    fn default_ignore_extensions() -> Vec<String> {
        vec![".tmp".into(), ".log".into(), ".bak".into()]
    }

    pub fn base_dir(&self) -> PathBuf {
        PathBuf::from(
            self.base_dir
                .as_deref()
                .filter(|dir| !dir.trim().is_empty())
                .unwrap_or(Self::default_base_dir()),
        )
    }

    pub fn set_base_dir(&mut self, dir: impl Into<String>) {
        self.base_dir = Some(dir.into());
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth.unwrap_or_else(Self::default_max_depth)
    }

    pub fn max_files(&self) -> usize {
        self.max_files.unwrap_or_else(Self::default_max_files)
    }

    /// Lowercased extensions, each with a leading dot.
    pub fn ignore_extensions(&self) -> BTreeSet<String> {
        self.ignore_extensions
            .clone()
            .unwrap_or_else(Self::default_ignore_extensions)
            .into_iter()
            .map(|ext| {
                let ext = ext.trim().to_ascii_lowercase();
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .collect()
    }

    pub fn show_hidden(&self) -> bool {
        self.show_hidden.unwrap_or(true)
    }
}

impl Default for Scan {
    fn default() -> Self {
        Self {
            base_dir: Some(Self::default_base_dir().to_owned()),
            max_depth: Some(Self::default_max_depth()),
            max_files: Some(Self::default_max_files()),
            ignore_extensions: Some(Self::default_ignore_extensions()),
            show_hidden: Some(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ignore {
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub globs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    #[serde(default = "Client::default_server_url")]
    pub server_url: String,
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
    /// Per-request limit in seconds. Requests wait indefinitely when unset.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Client {
    fn default_server_url() -> String {
        "http://127.0.0.1:8000".into()
    }

    /// Directory holding the origin-scoped storage files.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(|| {
            data_dir()
                .map(|base| base.join("catpick/storage"))
                .unwrap_or_else(|| PathBuf::from(".catpick/storage"))
        })
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self {
            server_url: Self::default_server_url(),
            storage_dir: None,
            request_timeout_secs: None,
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    base_dir: Option<String>,
    server_url: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            base_dir: env::var("CATPICK_BASE_DIR").ok(),
            server_url: env::var("CATPICK_SERVER_URL").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(base_dir: &str, server_url: &str) -> Self {
        Self {
            base_dir: Some(base_dir.to_owned()),
            server_url: Some(server_url.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            server: merge_server(self.server, other.server),
            scan: merge_scan(self.scan, other.scan),
            ignore: merge_ignore(self.ignore, other.ignore),
            client: merge_client(self.client, other.client),
        }
    }
}

fn merge_server(base: Server, overlay: Server) -> Server {
    Server {
        host: if overlay.host != Server::default_host() {
            overlay.host
        } else {
            base.host
        },
        port: if overlay.port != Server::default_port() {
            overlay.port
        } else {
            base.port
        },
    }
}

fn merge_scan(mut base: Scan, overlay: Scan) -> Scan {
    if let Some(value) = overlay.base_dir {
        base.base_dir = Some(value);
    }
    if let Some(value) = overlay.max_depth {
        base.max_depth = Some(value);
    }
    if let Some(value) = overlay.max_files {
        base.max_files = Some(value);
    }
    if let Some(value) = overlay.ignore_extensions {
        base.ignore_extensions = Some(value);
    }
    if let Some(value) = overlay.show_hidden {
        base.show_hidden = Some(value);
    }
    base
}

fn merge_ignore(base: Ignore, overlay: Ignore) -> Ignore {
    let mut paths: BTreeSet<String> = base.paths.into_iter().collect();
    paths.extend(overlay.paths);

    let mut globs: BTreeSet<String> = base.globs.into_iter().collect();
    globs.extend(overlay.globs);

    Ignore {
        paths: paths.into_iter().collect(),
        globs: globs.into_iter().collect(),
    }
}

fn merge_client(base: Client, overlay: Client) -> Client {
    Client {
        server_url: if overlay.server_url != Client::default_server_url() {
            overlay.server_url
        } else {
            base.server_url
        },
        storage_dir: overlay.storage_dir.or(base.storage_dir),
        request_timeout_secs: overlay.request_timeout_secs.or(base.request_timeout_secs),
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("catpick/config.toml"))
}

/// Location of the workspace configuration file, where base directory changes are persisted.
pub fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(base_dir) = env.base_dir {
        config.scan.base_dir = Some(base_dir);
    }
    if let Some(server_url) = env.server_url {
        config.client.server_url = server_url;
    }
    config
}

/// Write `base_dir` into the `[scan]` table of the config file at `path`, keeping other keys.
pub fn persist_base_dir(path: &Path, base_dir: &Path) -> Result<()> {
    let mut document: toml::Table = if path.exists() {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&data).with_context(|| format!("invalid TOML in {}", path.display()))?
    } else {
        toml::Table::new()
    };

    let scan = document
        .entry("scan")
        .or_insert_with(|| toml::Value::Table(toml::Table::new()));
    if let toml::Value::Table(table) = scan {
        table.insert(
            "base_dir".into(),
            toml::Value::String(base_dir.display().to_string()),
        );
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let data = toml::to_string_pretty(&document).context("failed to serialize config")?;
    fs::write(path, data).with_context(|| format!("failed to write config file {}", path.display()))
}
