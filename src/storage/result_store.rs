// src/storage/result_store.rs

use std::path::PathBuf;

use async_trait::async_trait;

use crate::{
    error::StoreError,
    models::exam_record::{ExamTestRecord, NewExamTestRecord},
    storage::{json_files, write_json_atomic},
};

/// Append-only store of submitted attempts.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Assigns an id (and a timestamp when missing) and persists the record.
    async fn save(&self, record: NewExamTestRecord) -> Result<ExamTestRecord, StoreError>;

    /// Returns page `page` (1-based) of records, newest first, and the total count.
    async fn list(
        &self,
        page: usize,
        page_size: usize,
    ) -> Result<(Vec<ExamTestRecord>, usize), StoreError>;
}

/// One `<uuid>.json` file per record.
#[derive(Debug, Clone)]
pub struct FileResultStore {
    dir: PathBuf,
}

impl FileResultStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| StoreError::io(&dir, e))?;
            tracing::info!("Created results directory at: {}", dir.display());
        }
        Ok(Self { dir })
    }
}

#[async_trait]
impl ResultStore for FileResultStore {
    async fn save(&self, record: NewExamTestRecord) -> Result<ExamTestRecord, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let record = record.into_record(id, chrono::Utc::now().timestamp_millis());

        let path = self.dir.join(format!("{}.json", record.id));
        write_json_atomic(&path, &record).await.inspect_err(|e| {
            tracing::error!("Error saving result: {}", e);
        })?;

        tracing::info!(
            record_id = %record.id,
            exam_id = %record.exam_id,
            percentage = record.percentage,
            "Result saved"
        );
        Ok(record)
    }

    async fn list(
        &self,
        page: usize,
        page_size: usize,
    ) -> Result<(Vec<ExamTestRecord>, usize), StoreError> {
        let mut records = Vec::new();
        for path in json_files(&self.dir).await? {
            let parsed = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| StoreError::io(&path, e))
                .and_then(|content| {
                    serde_json::from_str::<ExamTestRecord>(&content)
                        .map_err(|e| StoreError::json(&path, e))
                });
            match parsed {
                Ok(record) => records.push(record),
                Err(e) => tracing::error!("Error reading result file: {}", e),
            }
        }

        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let total = records.len();
        let start = page.saturating_sub(1).saturating_mul(page_size);
        let page_records = records.into_iter().skip(start).take(page_size).collect();
        Ok((page_records, total))
    }
}
