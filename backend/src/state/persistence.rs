// Item persistence module
// The whole collection lives in one JSON list file that is rewritten on every change.

use super::item::Item;
use crate::config::StorageConfig;
use serde_json::Value;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

/// Error types for persistence operations
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// File I/O error
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        /// File or directory being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// File parsed but does not hold a list of objects
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl PersistenceError {
    fn io(path: &Path, source: io::Error) -> Self {
        PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// File-backed item collection plus the upload directory beside it
#[derive(Debug, Clone)]
pub struct ItemStore {
    items_file: PathBuf,
    upload_dir: PathBuf,
}

impl ItemStore {
    /// Create a store over the given collection file and upload directory
    pub fn new(items_file: impl Into<PathBuf>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            items_file: items_file.into(),
            upload_dir: upload_dir.into(),
        }
    }

    /// Create a store from the storage section of the configuration
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.items_file.clone(), config.upload_dir.clone())
    }

    /// Path of the collection file
    pub fn items_file(&self) -> &Path {
        &self.items_file
    }

    /// Path of the upload directory
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Create the upload directory and an empty collection file if missing
    ///
    /// Existing data is left as it is.
    pub async fn init(&self) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| PersistenceError::io(&self.upload_dir, e))?;

        if let Some(parent) = self.items_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| PersistenceError::io(parent, e))?;
            }
        }

        let exists = fs::try_exists(&self.items_file)
            .await
            .map_err(|e| PersistenceError::io(&self.items_file, e))?;
        if !exists {
            self.save(&[]).await?;
            info!(path = %self.items_file.display(), "Initialized empty item collection");
        }

        Ok(())
    }

    /// Load the whole collection
    ///
    /// # Returns
    /// * `Ok(Vec<Item>)` in stored order
    /// * `Err(PersistenceError)` if the file is unreadable or not a list of objects
    pub async fn load(&self) -> Result<Vec<Item>, PersistenceError> {
        let json = fs::read_to_string(&self.items_file)
            .await
            .map_err(|e| PersistenceError::io(&self.items_file, e))?;

        let value: Value = serde_json::from_str(&json)?;
        let Value::Array(entries) = value else {
            return Err(PersistenceError::InvalidData(format!(
                "{} does not contain a list",
                self.items_file.display()
            )));
        };

        entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| match entry {
                Value::Object(fields) => Ok(Item::from_fields(fields)),
                _ => Err(PersistenceError::InvalidData(format!(
                    "entry {} is not an object",
                    index
                ))),
            })
            .collect()
    }

    /// Replace the collection file with `items`
    ///
    /// Writes a sibling temporary file and renames it into place, so readers
    /// never observe a half-written list.
    pub async fn save(&self, items: &[Item]) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(items)?;
        let tmp_path = self.temp_path();

        fs::write(&tmp_path, json)
            .await
            .map_err(|e| PersistenceError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.items_file)
            .await
            .map_err(|e| PersistenceError::io(&self.items_file, e))?;

        debug!(count = items.len(), "Saved item collection");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name: OsString = self.items_file.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> ItemStore {
        ItemStore::new(dir.join("items.json"), dir.join("uploads"))
    }

    #[tokio::test]
    async fn test_init_creates_empty_list_and_upload_dir() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let store = store_in(temp_dir.path());

        store.init().await.expect("Init should succeed");

        assert!(store.upload_dir().is_dir());
        let contents = std::fs::read_to_string(store.items_file()).unwrap();
        assert_eq!(contents, "[]");
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_init_keeps_existing_collection() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let store = store_in(temp_dir.path());
        std::fs::write(
            store.items_file(),
            r#"[{"id":"1","name":"Kept","imageUrl":"/uploads/a.png"}]"#,
        )
        .unwrap();

        store.init().await.expect("Init should succeed");

        let items = store.load().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name(), Some("Kept"));
    }

    #[tokio::test]
    async fn test_init_creates_parent_directories() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let store = ItemStore::new(
            temp_dir.path().join("data/nested/items.json"),
            temp_dir.path().join("data/uploads"),
        );

        store.init().await.expect("Init should succeed");
        assert!(store.items_file().exists());
    }

    #[tokio::test]
    async fn test_save_and_load_preserves_order() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let store = store_in(temp_dir.path());
        store.init().await.unwrap();

        let items = vec![
            Item::new("b".into(), "Second".into(), "/uploads/b.png".into()),
            Item::new("a".into(), "First".into(), "/uploads/a.png".into()),
        ];
        store.save(&items).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, items);

        // Pretty-printed with two-space indentation
        let contents = std::fs::read_to_string(store.items_file()).unwrap();
        assert!(contents.starts_with("[\n  {\n    \"id\": \"b\""));
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_load_rejects_non_list() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let store = store_in(temp_dir.path());
        std::fs::write(store.items_file(), r#"{"id":"1"}"#).unwrap();

        match store.load().await {
            Err(PersistenceError::InvalidData(_)) => {}
            other => panic!("Expected InvalidData error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_rejects_non_object_entries() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let store = store_in(temp_dir.path());
        std::fs::write(store.items_file(), r#"[{"id":"1"}, 5]"#).unwrap();

        match store.load().await {
            Err(PersistenceError::InvalidData(msg)) => assert!(msg.contains("entry 1")),
            other => panic!("Expected InvalidData error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_reports_malformed_json() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let store = store_in(temp_dir.path());
        std::fs::write(store.items_file(), "[{").unwrap();

        assert!(matches!(
            store.load().await,
            Err(PersistenceError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let store = store_in(temp_dir.path());

        assert!(matches!(
            store.load().await,
            Err(PersistenceError::Io { .. })
        ));
    }
}
