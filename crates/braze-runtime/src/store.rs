//! JSON-file persistence for the channel directory.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use braze_core::{DirectoryStore, StoreResult};

/// Persists the channel directory snapshot to a JSON file.
///
/// `save` rewrites the whole file; `load` reads it back. Both surface
/// [`StoreError`](braze_core::StoreError)s, which the directory logs and
/// absorbs - persistence never breaks dispatch.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store over the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DirectoryStore for JsonFileStore {
    async fn save(&self, entries: &HashMap<String, String>) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(entries)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    async fn load(&self) -> StoreResult<HashMap<String, String>> {
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
