// src/exam/session.rs

//! The in-progress exam attempt.
//!
//! A session is `Active` or `Paused` until it is submitted, by the tester or
//! by the clock running out. Every mutation is written through the injected
//! [`SnapshotRepository`] so a reload resumes where the tester left off.

use std::sync::Arc;

use crate::{
    error::{SessionError, StoreError},
    exam::{normalize::normalize_answers, scoring::score_exam},
    models::{
        answer::UserAnswer,
        exam_record::ExamResult,
        localized::Locale,
        question::{Exam, OPTION_COUNT, Question},
        session::{RawSessionSnapshot, SessionSnapshot},
    },
};

/// Where snapshots live between page loads, keyed by exam id.
pub trait SnapshotRepository: Send + Sync {
    fn load(&self, exam_id: &str) -> Result<Option<RawSessionSnapshot>, StoreError>;
    fn save(&self, exam_id: &str, snapshot: &SessionSnapshot) -> Result<(), StoreError>;
    fn clear(&self, exam_id: &str) -> Result<(), StoreError>;
}

impl<R: SnapshotRepository + ?Sized> SnapshotRepository for Arc<R> {
    fn load(&self, exam_id: &str) -> Result<Option<RawSessionSnapshot>, StoreError> {
        (**self).load(exam_id)
    }

    fn save(&self, exam_id: &str, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        (**self).save(exam_id, snapshot)
    }

    fn clear(&self, exam_id: &str) -> Result<(), StoreError> {
        (**self).clear(exam_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Active,
    Paused,
    Submitted,
}

pub struct ExamSession<R> {
    exam: Arc<Exam>,
    repository: R,
    snapshot: SessionSnapshot,
    submitted: bool,
}

impl<R: SnapshotRepository> ExamSession<R> {
    /// Resumes the stored attempt for this exam, or starts a fresh one.
    ///
    /// A snapshot that cannot be read or no longer lines up with the exam is
    /// discarded; losing progress is preferred over refusing to start.
    pub fn start(exam: Arc<Exam>, repository: R) -> Self {
        let snapshot = match repository.load(&exam.id) {
            Ok(Some(raw)) => restore(&exam, raw).unwrap_or_else(|| {
                tracing::warn!(
                    exam_id = %exam.id,
                    "Stored progress does not match exam, starting fresh"
                );
                fresh_snapshot(&exam)
            }),
            Ok(None) => fresh_snapshot(&exam),
            Err(e) => {
                tracing::warn!(
                    exam_id = %exam.id,
                    "Failed to restore progress, starting fresh: {}",
                    e
                );
                fresh_snapshot(&exam)
            }
        };

        let session = Self {
            exam,
            repository,
            snapshot,
            submitted: false,
        };
        session.persist();
        session
    }

    pub fn exam(&self) -> &Exam {
        &self.exam
    }

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }

    pub fn phase(&self) -> SessionPhase {
        if self.submitted {
            SessionPhase::Submitted
        } else if self.snapshot.is_paused {
            SessionPhase::Paused
        } else {
            SessionPhase::Active
        }
    }

    pub fn time_remaining(&self) -> u64 {
        self.snapshot.time_remaining
    }

    pub fn current_index(&self) -> usize {
        self.snapshot.current_question_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.exam.questions.get(self.snapshot.current_question_index)
    }

    pub fn answer(&self, index: usize) -> Option<&UserAnswer> {
        self.snapshot.answers.get(index)
    }

    pub fn answered_count(&self) -> usize {
        self.snapshot.answers.iter().filter(|a| a.is_answered()).count()
    }

    pub fn marked_count(&self) -> usize {
        self.snapshot.answers.iter().filter(|a| a.is_marked()).count()
    }

    /// Advances the clock by one second.
    ///
    /// Returns the result when this tick used up the remaining time and
    /// submitted the exam. Paused and submitted sessions ignore ticks.
    pub fn tick(&mut self) -> Option<ExamResult> {
        if self.phase() != SessionPhase::Active {
            return None;
        }

        if self.snapshot.time_remaining <= 1 {
            self.snapshot.time_remaining = 0;
            tracing::info!(exam_id = %self.exam.id, "Time is up, submitting exam");
            return self.submit();
        }

        self.snapshot.time_remaining -= 1;
        self.persist();
        None
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        if !self.snapshot.is_paused {
            self.snapshot.is_paused = true;
            self.persist();
        }
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        if self.snapshot.is_paused {
            self.snapshot.is_paused = false;
            self.persist();
        }
        Ok(())
    }

    /// Picks `option` for a single-answer question.
    pub fn select_answer(&mut self, index: usize, option: u8) -> Result<(), SessionError> {
        self.ensure_open()?;
        check_option(option)?;
        match self.answer_mut(index)? {
            UserAnswer::Single(answer) => answer.selected_answer = Some(option),
            UserAnswer::Multiple(_) => return Err(SessionError::WrongAnswerKind { index }),
        }
        self.persist();
        Ok(())
    }

    /// Flips `option` in a multiple-answer selection.
    ///
    /// Adding past the question's `maxSelections` is ignored; removing is
    /// always allowed.
    pub fn toggle_answer(&mut self, index: usize, option: u8) -> Result<(), SessionError> {
        self.ensure_open()?;
        check_option(option)?;
        let max_selections = match self.exam.questions.get(index) {
            Some(Question::Multiple(q)) => q.max_selections,
            Some(Question::Single(_)) => return Err(SessionError::WrongAnswerKind { index }),
            None => return Err(self.out_of_range(index)),
        };

        let UserAnswer::Multiple(answer) = self.answer_mut(index)? else {
            return Err(SessionError::WrongAnswerKind { index });
        };
        if !answer.selected_answers.remove(&option) {
            if max_selections.is_some_and(|max| answer.selected_answers.len() >= usize::from(max)) {
                tracing::debug!(index, option, "Selection limit reached");
                return Ok(());
            }
            answer.selected_answers.insert(option);
        }

        self.persist();
        Ok(())
    }

    pub fn set_marked(&mut self, index: usize, marked: bool) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.answer_mut(index)?.set_marked(marked);
        self.persist();
        Ok(())
    }

    pub fn go_to(&mut self, index: usize) -> Result<(), SessionError> {
        self.ensure_open()?;
        if index >= self.exam.questions.len() {
            return Err(self.out_of_range(index));
        }
        self.snapshot.current_question_index = index;
        self.persist();
        Ok(())
    }

    pub fn next(&mut self) -> Result<(), SessionError> {
        let last = self.exam.questions.len().saturating_sub(1);
        let target = (self.current_index() + 1).min(last);
        self.go_to(target)
    }

    pub fn previous(&mut self) -> Result<(), SessionError> {
        let target = self.current_index().saturating_sub(1);
        self.go_to(target)
    }

    /// Ends the attempt and scores it.
    ///
    /// Fires once: a second call, e.g. a click racing the clock, returns
    /// `None` and changes nothing.
    pub fn submit(&mut self) -> Option<ExamResult> {
        if self.submitted {
            return None;
        }
        self.submitted = true;

        if let Err(e) = self.repository.clear(&self.exam.id) {
            tracing::warn!(exam_id = %self.exam.id, "Failed to clear stored progress: {}", e);
        }

        let result = score_exam(&self.exam.questions, &self.snapshot.answers, Locale::En);
        tracing::info!(
            exam_id = %self.exam.id,
            correct = result.correct_answers,
            total = result.total_questions,
            passed = result.passed,
            "Exam submitted"
        );
        Some(result)
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.submitted {
            return Err(SessionError::AlreadySubmitted);
        }
        Ok(())
    }

    fn answer_mut(&mut self, index: usize) -> Result<&mut UserAnswer, SessionError> {
        let len = self.snapshot.answers.len();
        self.snapshot
            .answers
            .get_mut(index)
            .ok_or(SessionError::QuestionOutOfRange { index, len })
    }

    fn out_of_range(&self, index: usize) -> SessionError {
        SessionError::QuestionOutOfRange {
            index,
            len: self.exam.questions.len(),
        }
    }

    fn persist(&self) {
        if self.submitted {
            return;
        }
        if let Err(e) = self.repository.save(&self.exam.id, &self.snapshot) {
            tracing::warn!(exam_id = %self.exam.id, "Failed to save progress: {}", e);
        }
    }
}

fn check_option(option: u8) -> Result<(), SessionError> {
    if usize::from(option) >= OPTION_COUNT {
        return Err(SessionError::OptionOutOfRange { option });
    }
    Ok(())
}

/// Initial state: full time, first question, one empty answer per question.
pub fn fresh_snapshot(exam: &Exam) -> SessionSnapshot {
    SessionSnapshot {
        answers: exam.questions.iter().map(UserAnswer::empty_for).collect(),
        time_remaining: exam.duration_secs(),
        current_question_index: 0,
        is_paused: false,
    }
}

fn restore(exam: &Exam, raw: RawSessionSnapshot) -> Option<SessionSnapshot> {
    let answers = normalize_answers(&exam.questions, &raw.answers).ok()?;
    let last = exam.questions.len().saturating_sub(1);

    Some(SessionSnapshot {
        answers,
        time_remaining: raw.time_remaining,
        current_question_index: raw.current_question_index.min(last),
        is_paused: raw.is_paused,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::{
        models::{
            localized::LocalizedText,
            question::{MultipleAnswerQuestion, SingleAnswerQuestion},
        },
        storage::snapshot_store::MemorySnapshotRepository,
    };

    fn options() -> Vec<LocalizedText> {
        ["A", "B", "C", "D"].into_iter().map(LocalizedText::from).collect()
    }

    fn exam() -> Arc<Exam> {
        Arc::new(Exam {
            id: "pmp-mini".into(),
            title: "Mini".into(),
            description: "Two questions".into(),
            duration: 2,
            questions: vec![
                Question::Single(SingleAnswerQuestion {
                    id: 1,
                    question: "First".into(),
                    options: options(),
                    correct_answer: 1,
                    explanation: "B".into(),
                    domain: "People".into(),
                }),
                Question::Multiple(MultipleAnswerQuestion {
                    id: 2,
                    question: "Second".into(),
                    options: options(),
                    correct_answers: BTreeSet::from([0, 2]),
                    min_selections: Some(2),
                    max_selections: Some(2),
                    explanation: "A and C".into(),
                    domain: "Process".into(),
                }),
            ],
        })
    }

    fn session() -> (ExamSession<Arc<MemorySnapshotRepository>>, Arc<MemorySnapshotRepository>) {
        let repo = Arc::new(MemorySnapshotRepository::default());
        (ExamSession::start(exam(), repo.clone()), repo)
    }

    #[test]
    fn fresh_start_uses_full_duration() {
        let (s, repo) = session();
        assert_eq!(s.phase(), SessionPhase::Active);
        assert_eq!(s.time_remaining(), 120);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.snapshot().answers[0], UserAnswer::empty_for(&s.exam().questions[0]));
        assert_eq!(s.snapshot().answers[1].kind(), crate::models::question::QuestionKind::Multiple);
        assert!(repo.load("pmp-mini").unwrap().is_some());
    }

    #[test]
    fn restores_previous_progress() {
        let (mut s, repo) = session();
        s.select_answer(0, 1).unwrap();
        s.next().unwrap();
        s.tick();
        s.pause().unwrap();
        let before = s.snapshot().clone();
        drop(s);

        let restored = ExamSession::start(exam(), repo);
        assert_eq!(restored.snapshot(), &before);
        assert_eq!(restored.phase(), SessionPhase::Paused);
    }

    #[test]
    fn corrupt_snapshot_starts_fresh() {
        let repo = Arc::new(MemorySnapshotRepository::default());
        repo.insert_raw("pmp-mini", "{not json");

        let s = ExamSession::start(exam(), repo);
        assert_eq!(s.time_remaining(), 120);
        assert_eq!(s.answered_count(), 0);
    }

    #[test]
    fn snapshot_for_different_question_count_starts_fresh() {
        let repo = Arc::new(MemorySnapshotRepository::default());
        repo.insert_raw(
            "pmp-mini",
            r#"{"answers":[{"questionId":1,"selectedAnswer":1}],"timeRemaining":5,"currentQuestionIndex":0,"isPaused":false}"#,
        );

        let s = ExamSession::start(exam(), repo);
        assert_eq!(s.time_remaining(), 120);
    }

    #[test]
    fn legacy_snapshot_is_tagged_on_restore() {
        let repo = Arc::new(MemorySnapshotRepository::default());
        repo.insert_raw(
            "pmp-mini",
            r#"{"answers":[{"questionId":1,"selectedAnswer":3},{"questionId":2,"selectedAnswer":0,"isMarked":true}],"timeRemaining":42,"currentQuestionIndex":1,"isPaused":false}"#,
        );

        let s = ExamSession::start(exam(), repo);
        assert_eq!(s.time_remaining(), 42);
        assert_eq!(s.current_index(), 1);
        assert!(s.answer(0).unwrap().is_answered());
        let second = s.answer(1).unwrap();
        assert!(!second.is_answered());
        assert!(second.is_marked());
    }

    #[test]
    fn tick_counts_down_while_active() {
        let (mut s, _) = session();
        assert!(s.tick().is_none());
        assert_eq!(s.time_remaining(), 119);
    }

    #[test]
    fn last_tick_auto_submits() {
        let (mut s, repo) = session();
        s.snapshot.time_remaining = 1;

        let result = s.tick();
        assert!(result.is_some());
        assert_eq!(s.phase(), SessionPhase::Submitted);
        assert_eq!(s.time_remaining(), 0);
        assert!(repo.load("pmp-mini").unwrap().is_none());
    }

    #[test]
    fn pause_stops_clock_but_not_editing() {
        let (mut s, _) = session();
        s.pause().unwrap();

        assert!(s.tick().is_none());
        assert_eq!(s.time_remaining(), 120);

        s.toggle_answer(1, 2).unwrap();
        assert!(s.answer(1).unwrap().is_answered());
        assert_eq!(s.time_remaining(), 120);

        s.resume().unwrap();
        s.tick();
        assert_eq!(s.time_remaining(), 119);
    }

    #[test]
    fn submit_fires_once() {
        let (mut s, _) = session();
        assert!(s.submit().is_some());
        assert!(s.submit().is_none());
        s.snapshot.time_remaining = 1;
        assert!(s.tick().is_none());
        assert_eq!(s.select_answer(0, 1), Err(SessionError::AlreadySubmitted));
    }

    #[test]
    fn submitted_result_scores_answers() {
        let (mut s, _) = session();
        s.select_answer(0, 1).unwrap();
        s.toggle_answer(1, 0).unwrap();
        s.toggle_answer(1, 2).unwrap();

        let result = s.submit().unwrap();
        assert_eq!(result.correct_answers, 2);
        assert_eq!(result.percentage, 100);
        assert!(result.passed);
    }

    #[test]
    fn toggle_respects_max_selections() {
        let (mut s, _) = session();
        s.toggle_answer(1, 0).unwrap();
        s.toggle_answer(1, 1).unwrap();
        s.toggle_answer(1, 3).unwrap();
        match s.answer(1).unwrap() {
            UserAnswer::Multiple(a) => assert_eq!(a.selected_answers, BTreeSet::from([0, 1])),
            other => panic!("expected multiple, got {:?}", other),
        }

        s.toggle_answer(1, 1).unwrap();
        match s.answer(1).unwrap() {
            UserAnswer::Multiple(a) => assert_eq!(a.selected_answers, BTreeSet::from([0])),
            other => panic!("expected multiple, got {:?}", other),
        }
    }

    #[test]
    fn answer_kind_must_match_question() {
        let (mut s, _) = session();
        assert_eq!(s.toggle_answer(0, 1), Err(SessionError::WrongAnswerKind { index: 0 }));
        assert_eq!(s.select_answer(1, 1), Err(SessionError::WrongAnswerKind { index: 1 }));
        assert_eq!(s.select_answer(0, 4), Err(SessionError::OptionOutOfRange { option: 4 }));
    }

    #[test]
    fn navigation_clamps_and_validates() {
        let (mut s, _) = session();
        s.previous().unwrap();
        assert_eq!(s.current_index(), 0);
        s.next().unwrap();
        s.next().unwrap();
        assert_eq!(s.current_index(), 1);
        assert_eq!(s.go_to(5), Err(SessionError::QuestionOutOfRange { index: 5, len: 2 }));
    }

    #[test]
    fn counters_track_answers_and_marks() {
        let (mut s, _) = session();
        s.select_answer(0, 2).unwrap();
        s.set_marked(1, true).unwrap();
        assert_eq!(s.answered_count(), 1);
        assert_eq!(s.marked_count(), 1);
    }
}
