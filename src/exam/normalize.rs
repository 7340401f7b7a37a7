// src/exam/normalize.rs

//! Repairs exam and answer data written before the `type` tag existed.
//!
//! Everything read from the definition store or restored from a snapshot
//! passes through here once; scoring and the session machine only ever see
//! fully tagged values.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::{
    error::ValidationError,
    models::{
        answer::{MultipleUserAnswer, RawAnswer, SingleUserAnswer, UserAnswer},
        question::{
            Exam, MultipleAnswerQuestion, OPTION_COUNT, Question, QuestionKind, RawExam,
            RawQuestion, SingleAnswerQuestion,
        },
    },
};

/// Question type from the explicit tag, else inferred from the shape:
/// a plural `correctAnswers` collection means multiple-answer.
pub fn infer_kind(raw: &RawQuestion) -> QuestionKind {
    match raw.kind {
        Some(kind) => kind,
        None if raw.correct_answers.is_some() => QuestionKind::Multiple,
        None => QuestionKind::Single,
    }
}

pub fn normalize_question(raw: RawQuestion) -> Result<Question, ValidationError> {
    let id = raw.id;
    if raw.options.len() != OPTION_COUNT {
        return Err(ValidationError::OptionCount {
            id,
            found: raw.options.len(),
        });
    }

    match infer_kind(&raw) {
        QuestionKind::Single => {
            let index = raw
                .correct_answer
                .ok_or(ValidationError::MissingCorrectAnswer { id })?;
            let correct_answer = option_index(id, index)?;

            Ok(Question::Single(SingleAnswerQuestion {
                id,
                question: raw.question,
                options: raw.options,
                correct_answer,
                explanation: raw.explanation,
                domain: raw.domain,
            }))
        }
        QuestionKind::Multiple => {
            let indices = raw
                .correct_answers
                .ok_or(ValidationError::MissingCorrectAnswer { id })?;
            let correct_answers = indices
                .into_iter()
                .map(|index| option_index(id, index))
                .collect::<Result<BTreeSet<u8>, _>>()?;
            if correct_answers.len() < 2 {
                return Err(ValidationError::TooFewCorrectAnswers { id });
            }

            let min_selections = raw
                .min_selections
                .map(|v| selection_limit(id, "minSelections", v))
                .transpose()?;
            let max_selections = raw
                .max_selections
                .map(|v| selection_limit(id, "maxSelections", v))
                .transpose()?;
            if let (Some(min), Some(max)) = (min_selections, max_selections) {
                if min > max {
                    return Err(ValidationError::SelectionLimits {
                        id,
                        detail: format!("minSelections {} exceeds maxSelections {}", min, max),
                    });
                }
            }
            if let Some(max) = max_selections {
                if usize::from(max) < correct_answers.len() {
                    return Err(ValidationError::SelectionLimits {
                        id,
                        detail: format!(
                            "maxSelections {} is below the {} correct answers",
                            max,
                            correct_answers.len()
                        ),
                    });
                }
            }

            Ok(Question::Multiple(MultipleAnswerQuestion {
                id,
                question: raw.question,
                options: raw.options,
                correct_answers,
                min_selections,
                max_selections,
                explanation: raw.explanation,
                domain: raw.domain,
            }))
        }
    }
}

fn option_index(id: i64, index: i64) -> Result<u8, ValidationError> {
    u8::try_from(index)
        .ok()
        .filter(|i| usize::from(*i) < OPTION_COUNT)
        .ok_or(ValidationError::AnswerOutOfRange { id, index })
}

fn selection_limit(id: i64, field: &str, value: i64) -> Result<u8, ValidationError> {
    if !(2..=OPTION_COUNT as i64).contains(&value) {
        return Err(ValidationError::SelectionLimits {
            id,
            detail: format!("{} must be between 2 and {}, got {}", field, OPTION_COUNT, value),
        });
    }
    Ok(value as u8)
}

/// Normalizes every question and checks the exam-level invariants.
pub fn normalize_exam(raw: RawExam) -> Result<Exam, ValidationError> {
    if raw.id.trim().is_empty() {
        return Err(ValidationError::EmptyExamId);
    }
    if raw.title.is_blank() {
        return Err(ValidationError::EmptyTitle(raw.id));
    }
    if raw.duration == 0 {
        return Err(ValidationError::InvalidDuration(raw.id));
    }

    let questions = raw
        .questions
        .into_iter()
        .map(normalize_question)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Exam {
        id: raw.id,
        title: raw.title,
        description: raw.description,
        duration: raw.duration,
        questions,
    })
}

/// Produces a tagged answer that matches `question`'s type.
///
/// The answer's own tag is trusted only when it agrees with the question.
/// Values that do not map cleanly onto the question's type are dropped and
/// the selection starts empty; the review mark always survives.
pub fn normalize_answer(question: &Question, raw: &RawAnswer) -> UserAnswer {
    let question_id = raw.question_id.unwrap_or_else(|| question.id());
    let is_marked = raw.is_marked.unwrap_or(false);
    let kind = question.kind();

    match raw.kind {
        Some(tag) if tag != kind => {
            tracing::warn!(
                question_id,
                stored = ?tag,
                expected = ?kind,
                "Answer type no longer matches its question, resetting selection"
            );
            return UserAnswer::empty(question_id, kind, is_marked);
        }
        None => tracing::debug!(question_id, ?kind, "Tagging legacy answer from its question"),
        Some(_) => {}
    }

    match kind {
        QuestionKind::Single => UserAnswer::Single(SingleUserAnswer {
            question_id,
            selected_answer: raw.selected_answer.as_ref().and_then(answer_index),
            is_marked,
        }),
        QuestionKind::Multiple => UserAnswer::Multiple(MultipleUserAnswer {
            question_id,
            selected_answers: raw
                .selected_answers
                .as_ref()
                .map(answer_index_set)
                .unwrap_or_default(),
            is_marked,
        }),
    }
}

/// Pairs answers with questions by position.
pub fn normalize_answers(
    questions: &[Question],
    raw: &[RawAnswer],
) -> Result<Vec<UserAnswer>, ValidationError> {
    if questions.len() != raw.len() {
        return Err(ValidationError::AnswerCount {
            expected: questions.len(),
            found: raw.len(),
        });
    }

    Ok(questions
        .iter()
        .zip(raw)
        .map(|(question, answer)| normalize_answer(question, answer))
        .collect())
}

fn answer_index(value: &Value) -> Option<u8> {
    value
        .as_u64()
        .filter(|i| *i < OPTION_COUNT as u64)
        .map(|i| i as u8)
}

fn answer_index_set(value: &Value) -> BTreeSet<u8> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(answer_index).collect())
        .unwrap_or_default()
}
