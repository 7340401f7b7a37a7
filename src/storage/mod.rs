// src/storage/mod.rs

pub mod admin_store;
pub mod exam_store;
pub mod result_store;
pub mod snapshot_store;

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use serde::Serialize;

use crate::error::StoreError;

static SAFE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]{0,127}$").expect("valid regex"));

/// Whether `id` can be used as a file stem without escaping its directory.
pub fn is_safe_id(id: &str) -> bool {
    SAFE_ID.is_match(id) && !id.contains("..")
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
    path.with_file_name(name)
}

/// Writes pretty JSON next to `path` and renames it into place, so readers
/// never observe a half-written file.
pub async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let body = serde_json::to_vec_pretty(value).map_err(|e| StoreError::json(path, e))?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }

    let tmp = temp_path(path);
    tokio::fs::write(&tmp, body)
        .await
        .map_err(|e| StoreError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| StoreError::io(path, e))
}

/// Like [`write_json_atomic`], but fails with [`StoreError::AlreadyExists`]
/// instead of replacing an existing file.
///
/// The temp file is hard-linked into place, which either creates `path`
/// whole or fails without touching it.
pub async fn write_json_new<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let body = serde_json::to_vec_pretty(value).map_err(|e| StoreError::json(path, e))?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }

    let tmp = temp_path(path);
    tokio::fs::write(&tmp, body)
        .await
        .map_err(|e| StoreError::io(&tmp, e))?;
    let linked = tokio::fs::hard_link(&tmp, path).await;
    if let Err(e) = tokio::fs::remove_file(&tmp).await {
        tracing::warn!("Could not remove temp file {}: {}", tmp.display(), e);
    }

    match linked {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(StoreError::AlreadyExists {
            path: path.display().to_string(),
        }),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

/// Blocking twin of [`write_json_atomic`] for synchronous callers.
pub fn write_json_atomic_blocking<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let body = serde_json::to_vec(value).map_err(|e| StoreError::json(path, e))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let tmp = temp_path(path);
    std::fs::write(&tmp, body).map_err(|e| StoreError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))
}

/// Lists `*.json` files directly inside `dir`; a missing directory is empty.
pub async fn json_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io(dir, e)),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| StoreError::io(dir, e))? {
        let path = entry.path();
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if is_file && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_ids() {
        assert!(is_safe_id("pmp-test-bank-180"));
        assert!(is_safe_id("exam-1700000000000"));
        assert!(!is_safe_id("../etc/passwd"));
        assert!(!is_safe_id("a/b"));
        assert!(!is_safe_id(""));
        assert!(!is_safe_id("a..b"));
    }

    #[tokio::test]
    async fn atomic_write_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("value.json");

        write_json_atomic(&path, &serde_json::json!({"a": 1})).await.unwrap();

        let files = json_files(&dir.path().join("nested")).await.unwrap();
        assert_eq!(files, vec![path.clone()]);
        let content: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(content["a"], 1);
    }

    #[tokio::test]
    async fn new_file_write_never_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exam.json");
        std::fs::write(&path, "{\"id\":\"kept\"}").unwrap();

        let err = write_json_new(&path, &serde_json::json!({"id": "other"}))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"id\":\"kept\"}");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn missing_directory_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let files = json_files(&dir.path().join("absent")).await.unwrap();
        assert!(files.is_empty());
    }
}
