// src/storage/snapshot_store.rs

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::Mutex,
};

use crate::{
    error::StoreError,
    exam::session::SnapshotRepository,
    models::session::{RawSessionSnapshot, SessionSnapshot},
    storage::{is_safe_id, write_json_atomic_blocking},
};

fn key(exam_id: &str) -> String {
    format!("examProgress-{}", exam_id)
}

/// Keeps serialized snapshots in memory, like a browser tab's session storage.
#[derive(Debug, Default)]
pub struct MemorySnapshotRepository {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySnapshotRepository {
    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stores an arbitrary string, e.g. what an older client left behind.
    #[cfg(test)]
    pub fn insert_raw(&self, exam_id: &str, value: &str) {
        self.entries().insert(key(exam_id), value.to_string());
    }
}

impl SnapshotRepository for MemorySnapshotRepository {
    fn load(&self, exam_id: &str) -> Result<Option<RawSessionSnapshot>, StoreError> {
        let key = key(exam_id);
        match self.entries().get(&key) {
            Some(value) => serde_json::from_str(value)
                .map(Some)
                .map_err(|e| StoreError::json(&key, e)),
            None => Ok(None),
        }
    }

    fn save(&self, exam_id: &str, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        let key = key(exam_id);
        let value = serde_json::to_string(snapshot).map_err(|e| StoreError::json(&key, e))?;
        self.entries().insert(key, value);
        Ok(())
    }

    fn clear(&self, exam_id: &str) -> Result<(), StoreError> {
        self.entries().remove(&key(exam_id));
        Ok(())
    }
}

/// One JSON file per exam under a directory; survives process restarts.
///
/// All calls do blocking `std::fs` I/O.
#[derive(Debug, Clone)]
pub struct FileSnapshotRepository {
    dir: PathBuf,
}

impl FileSnapshotRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, exam_id: &str) -> Result<PathBuf, StoreError> {
        if !is_safe_id(exam_id) {
            return Err(StoreError::io(
                exam_id,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "unsafe exam id"),
            ));
        }
        Ok(self.dir.join(format!("{}.json", key(exam_id))))
    }
}

impl SnapshotRepository for FileSnapshotRepository {
    fn load(&self, exam_id: &str) -> Result<Option<RawSessionSnapshot>, StoreError> {
        let path = self.path(exam_id)?;
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::json(&path, e))
    }

    fn save(&self, exam_id: &str, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        write_json_atomic_blocking(&self.path(exam_id)?, snapshot)
    }

    fn clear(&self, exam_id: &str) -> Result<(), StoreError> {
        let path = self.path(exam_id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::{
        exam::normalize::normalize_answers,
        models::{
            answer::{MultipleUserAnswer, SingleUserAnswer, UserAnswer},
            localized::LocalizedText,
            question::{MultipleAnswerQuestion, Question, SingleAnswerQuestion},
        },
    };

    fn questions() -> Vec<Question> {
        let options: Vec<LocalizedText> =
            ["A", "B", "C", "D"].into_iter().map(Into::into).collect();
        vec![
            Question::Single(SingleAnswerQuestion {
                id: 7,
                question: "Q".into(),
                options: options.clone(),
                correct_answer: 0,
                explanation: "E".into(),
                domain: "People".into(),
            }),
            Question::Multiple(MultipleAnswerQuestion {
                id: 8,
                question: "Q".into(),
                options,
                correct_answers: BTreeSet::from([1, 2]),
                min_selections: None,
                max_selections: None,
                explanation: "E".into(),
                domain: "Process".into(),
            }),
        ]
    }

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            answers: vec![
                UserAnswer::Single(SingleUserAnswer {
                    question_id: 7,
                    selected_answer: Some(2),
                    is_marked: true,
                }),
                UserAnswer::Multiple(MultipleUserAnswer {
                    question_id: 8,
                    selected_answers: BTreeSet::from([3, 1]),
                    is_marked: false,
                }),
            ],
            time_remaining: 3_512,
            current_question_index: 1,
            is_paused: true,
        }
    }

    fn round_trip(repo: &dyn SnapshotRepository) {
        let original = snapshot();
        repo.save("pmp", &original).unwrap();

        let raw = repo.load("pmp").unwrap().unwrap();
        let restored = SessionSnapshot {
            answers: normalize_answers(&questions(), &raw.answers).unwrap(),
            time_remaining: raw.time_remaining,
            current_question_index: raw.current_question_index,
            is_paused: raw.is_paused,
        };
        assert_eq!(restored, original);

        repo.clear("pmp").unwrap();
        assert!(repo.load("pmp").unwrap().is_none());
    }

    #[test]
    fn memory_repository_round_trips() {
        round_trip(&MemorySnapshotRepository::default());
    }

    #[test]
    fn file_repository_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        round_trip(&FileSnapshotRepository::new(dir.path()));
    }

    #[test]
    fn file_repository_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("examProgress-pmp.json"), "garbage").unwrap();

        let repo = FileSnapshotRepository::new(dir.path());
        assert!(matches!(repo.load("pmp"), Err(StoreError::Json { .. })));
    }

    #[test]
    fn clearing_missing_snapshot_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileSnapshotRepository::new(dir.path()).clear("nothing").is_ok());
    }
}
