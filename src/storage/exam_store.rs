// src/storage/exam_store.rs

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{
    error::StoreError,
    exam::normalize::normalize_exam,
    models::question::{Exam, ExamListItem, RawExam},
    storage::{json_files, write_json_new},
};

/// Source of exam definitions.
#[async_trait]
pub trait ExamStore: Send + Sync {
    async fn list_exams(&self) -> Result<Vec<ExamListItem>, StoreError>;

    /// Returns the normalized exam, `None` when no exam has this id.
    async fn get_exam(&self, id: &str) -> Result<Option<Exam>, StoreError>;

    /// Writes a new exam under its id. Never replaces an existing file:
    /// a taken file name is [`StoreError::AlreadyExists`].
    async fn save_exam(&self, exam: &Exam) -> Result<PathBuf, StoreError>;
}

/// Exams kept as `*.json` files in one directory.
#[derive(Debug, Clone)]
pub struct FileExamStore {
    dir: PathBuf,
}

impl FileExamStore {
    /// Opens the store, creating the directory on first use.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| StoreError::io(&dir, e))?;
            tracing::info!("Created exams directory at: {}", dir.display());
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_raw(path: &Path) -> Result<RawExam, StoreError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| StoreError::json(path, e))
    }
}

#[async_trait]
impl ExamStore for FileExamStore {
    async fn list_exams(&self) -> Result<Vec<ExamListItem>, StoreError> {
        let mut exams = Vec::new();
        for path in json_files(&self.dir).await? {
            match Self::read_raw(&path).await {
                Ok(raw) => exams.push(ExamListItem {
                    question_count: raw.questions.len(),
                    id: raw.id,
                    title: raw.title,
                    description: raw.description,
                    duration: raw.duration,
                }),
                Err(e) => tracing::error!("Error parsing exam file: {}", e),
            }
        }
        Ok(exams)
    }

    async fn get_exam(&self, id: &str) -> Result<Option<Exam>, StoreError> {
        for path in json_files(&self.dir).await? {
            let raw = match Self::read_raw(&path).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!("Skipping unreadable exam file: {}", e);
                    continue;
                }
            };
            if raw.id == id {
                return Ok(Some(normalize_exam(raw)?));
            }
        }
        Ok(None)
    }

    async fn save_exam(&self, exam: &Exam) -> Result<PathBuf, StoreError> {
        let path = self.dir.join(format!("{}.json", exam.id));
        write_json_new(&path, exam).await?;
        tracing::info!(exam_id = %exam.id, questions = exam.questions.len(), "Exam saved");
        Ok(path)
    }
}
