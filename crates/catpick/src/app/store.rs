//! Origin-scoped persistence for the selection set.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::errors::StorageError;
use crate::domain::model::SelectionSet;

/// Key under which the selection set is persisted.
pub const SELECTED_FILES_KEY: &str = "selectedFiles";

/// String key/value storage scoped to a single origin.
pub trait Storage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Volatile storage, mainly for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}

/// Storage persisted as one JSON object per origin under a storage directory.
///
/// Every write goes straight to disk so a restart never loses the latest value.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl FileStorage {
    /// Open the storage for `origin` inside `dir`. Unreadable files start empty.
    pub fn open(dir: impl AsRef<Path>, origin: &str) -> Self {
        let path = dir.as_ref().join(format!("{}.json", origin_slug(origin)));
        let items = fs::read_to_string(&path)
            .ok()
            .and_then(|data| match serde_json::from_str(&data) {
                Ok(items) => Some(items),
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "ignoring malformed storage file");
                    None
                }
            })
            .unwrap_or_default();
        Self { path, items }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|source| StorageError::Io {
                path: dir.display().to_string(),
                source,
            })?;
        }
        let data = serde_json::to_string_pretty(&self.items)?;
        fs::write(&self.path, data).map_err(|source| StorageError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_owned(), value.to_owned());
        self.flush()
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        if self.items.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// File-system safe name for an origin such as `http://127.0.0.1:8000`.
///
/// Percent-encoded, so distinct origins never share a file.
fn origin_slug(origin: &str) -> String {
    let origin = origin.trim().trim_end_matches('/');
    if origin.is_empty() {
        return "default".to_owned();
    }
    url::form_urlencoded::byte_serialize(origin.as_bytes())
        .collect::<String>()
        .replace('*', "%2A")
}

/// Reads and writes the [`SelectionSet`] under [`SELECTED_FILES_KEY`].
#[derive(Debug, Clone)]
pub struct SelectionStore<S> {
    storage: S,
}

impl<S: Storage> SelectionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Load the persisted selection. Absent or malformed state yields an empty set.
    pub fn load(&self) -> SelectionSet {
        let Some(raw) = self.storage.get_item(SELECTED_FILES_KEY) else {
            return SelectionSet::new();
        };
        match serde_json::from_str::<Option<SelectionSet>>(&raw) {
            Ok(set) => set.unwrap_or_default(),
            Err(err) => {
                debug!(error = %err, "persisted selection is malformed, starting empty");
                SelectionSet::new()
            }
        }
    }

    /// Persist the selection as a JSON list.
    pub fn save(&mut self, selection: &SelectionSet) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(selection)?;
        self.storage.set_item(SELECTED_FILES_KEY, &encoded)
    }

    /// Drop the persisted selection entirely.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.storage.remove_item(SELECTED_FILES_KEY)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}
