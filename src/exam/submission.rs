// src/exam/submission.rs

use crate::{
    models::{
        exam_record::{ExamResult, ExamTestRecord, NewExamTestRecord},
        localized::Locale,
        question::Exam,
    },
    storage::result_store::ResultStore,
};

pub const ANONYMOUS_TESTER: &str = "Anonymous";

/// Summarizes a scored attempt for the result store.
pub fn build_record(
    tester_name: Option<&str>,
    exam: &Exam,
    result: &ExamResult,
) -> NewExamTestRecord {
    let tester_name = tester_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(ANONYMOUS_TESTER);

    NewExamTestRecord {
        tester_name: tester_name.to_string(),
        exam_id: exam.id.clone(),
        exam_title: exam.title.resolve(Locale::En).to_string(),
        score: result.correct_answers,
        percentage: result.percentage,
        total_questions: result.total_questions,
        timestamp: Some(chrono::Utc::now().timestamp_millis()),
        domain_results: result.domain_results.clone(),
    }
}

/// Persists a record without letting a storage failure reach the tester;
/// the result they already see stays authoritative.
pub async fn persist_best_effort(
    store: &dyn ResultStore,
    record: NewExamTestRecord,
) -> Option<ExamTestRecord> {
    match store.save(record).await {
        Ok(saved) => Some(saved),
        Err(e) => {
            tracing::error!("Error saving result: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        error::StoreError,
        exam::scoring::score_exam,
        models::answer::UserAnswer,
        models::localized::LocalizedText,
        models::question::{Question, SingleAnswerQuestion},
        storage::result_store::FileResultStore,
    };

    struct FailingStore;

    #[async_trait]
    impl ResultStore for FailingStore {
        async fn save(&self, _record: NewExamTestRecord) -> Result<ExamTestRecord, StoreError> {
            Err(StoreError::io("results", std::io::Error::other("disk full")))
        }

        async fn list(
            &self,
            _page: usize,
            _page_size: usize,
        ) -> Result<(Vec<ExamTestRecord>, usize), StoreError> {
            Ok((Vec::new(), 0))
        }
    }

    fn exam() -> Exam {
        Exam {
            id: "pmp".into(),
            title: LocalizedText::bilingual("PMP", Some("بي إم بي")),
            description: "d".into(),
            duration: 1,
            questions: vec![Question::Single(SingleAnswerQuestion {
                id: 1,
                question: "Q".into(),
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct_answer: 1,
                explanation: "E".into(),
                domain: "People".into(),
            })],
        }
    }

    #[test]
    fn record_copies_scores_and_defaults_name() {
        let exam = exam();
        let answers: Vec<UserAnswer> = exam.questions.iter().map(UserAnswer::empty_for).collect();
        let result = score_exam(&exam.questions, &answers, Locale::En);

        let record = build_record(Some("   "), &exam, &result);
        assert_eq!(record.tester_name, ANONYMOUS_TESTER);
        assert_eq!(record.exam_title, "PMP");
        assert_eq!(record.score, 0);
        assert_eq!(record.total_questions, 1);
        assert_eq!(record.domain_results, result.domain_results);
    }

    #[tokio::test]
    async fn storage_failure_is_swallowed() {
        let exam = exam();
        let answers: Vec<UserAnswer> = exam.questions.iter().map(UserAnswer::empty_for).collect();
        let result = score_exam(&exam.questions, &answers, Locale::En);

        let record = build_record(Some("Dana"), &exam, &result);
        assert!(persist_best_effort(&FailingStore, record).await.is_none());
    }

    #[tokio::test]
    async fn stored_record_gets_an_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileResultStore::open(dir.path()).await.unwrap();
        let exam = exam();
        let answers: Vec<UserAnswer> = exam.questions.iter().map(UserAnswer::empty_for).collect();
        let result = score_exam(&exam.questions, &answers, Locale::En);

        let saved = persist_best_effort(&store, build_record(Some("Dana"), &exam, &result))
            .await
            .unwrap();
        assert_eq!(saved.tester_name, "Dana");
        assert!(!saved.id.is_empty());
    }
}
