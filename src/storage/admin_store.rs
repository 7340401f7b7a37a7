// src/storage/admin_store.rs

use std::path::{Path, PathBuf};

use crate::{
    error::StoreError,
    models::admin::Admin,
    storage::write_json_atomic,
};

/// Admin accounts kept in a single JSON array file.
#[derive(Debug, Clone)]
pub struct AdminStore {
    path: PathBuf,
}

impl AdminStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    pub async fn all(&self) -> Result<Vec<Admin>, StoreError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        serde_json::from_str(&content).map_err(|e| StoreError::json(&self.path, e))
    }

    pub async fn find(&self, username: &str) -> Result<Option<Admin>, StoreError> {
        Ok(self.all().await?.into_iter().find(|a| a.username == username))
    }

    /// Replaces the file with `admins`.
    pub async fn write(&self, admins: &[Admin]) -> Result<(), StoreError> {
        write_json_atomic(&self.path, &admins).await
    }
}
