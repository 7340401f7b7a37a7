// src/models/answer.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::question::{Question, QuestionKind};

/// The tester's answer to one question, tagged like its question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UserAnswer {
    Single(SingleUserAnswer),
    Multiple(MultipleUserAnswer),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleUserAnswer {
    pub question_id: i64,
    pub selected_answer: Option<u8>,
    #[serde(default)]
    pub is_marked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleUserAnswer {
    pub question_id: i64,
    pub selected_answers: BTreeSet<u8>,
    #[serde(default)]
    pub is_marked: bool,
}

impl UserAnswer {
    /// Empty answer matching the question's type.
    pub fn empty_for(question: &Question) -> Self {
        Self::empty(question.id(), question.kind(), false)
    }

    pub fn empty(question_id: i64, kind: QuestionKind, is_marked: bool) -> Self {
        match kind {
            QuestionKind::Single => UserAnswer::Single(SingleUserAnswer {
                question_id,
                selected_answer: None,
                is_marked,
            }),
            QuestionKind::Multiple => UserAnswer::Multiple(MultipleUserAnswer {
                question_id,
                selected_answers: BTreeSet::new(),
                is_marked,
            }),
        }
    }

    pub fn kind(&self) -> QuestionKind {
        match self {
            UserAnswer::Single(_) => QuestionKind::Single,
            UserAnswer::Multiple(_) => QuestionKind::Multiple,
        }
    }

    pub fn question_id(&self) -> i64 {
        match self {
            UserAnswer::Single(a) => a.question_id,
            UserAnswer::Multiple(a) => a.question_id,
        }
    }

    pub fn is_marked(&self) -> bool {
        match self {
            UserAnswer::Single(a) => a.is_marked,
            UserAnswer::Multiple(a) => a.is_marked,
        }
    }

    pub fn set_marked(&mut self, marked: bool) {
        match self {
            UserAnswer::Single(a) => a.is_marked = marked,
            UserAnswer::Multiple(a) => a.is_marked = marked,
        }
    }

    /// Whether the tester has picked anything for this question.
    pub fn is_answered(&self) -> bool {
        match self {
            UserAnswer::Single(a) => a.selected_answer.is_some(),
            UserAnswer::Multiple(a) => !a.selected_answers.is_empty(),
        }
    }
}

/// Answer as held by older clients, where the `type` tag may be missing
/// and the value fields may not match the question any more.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnswer {
    #[serde(default)]
    pub question_id: Option<i64>,
    #[serde(rename = "type", default)]
    pub kind: Option<QuestionKind>,
    #[serde(default)]
    pub selected_answer: Option<Value>,
    #[serde(default)]
    pub selected_answers: Option<Value>,
    #[serde(default)]
    pub is_marked: Option<bool>,
}

impl From<&UserAnswer> for RawAnswer {
    fn from(answer: &UserAnswer) -> Self {
        match answer {
            UserAnswer::Single(a) => RawAnswer {
                question_id: Some(a.question_id),
                kind: Some(QuestionKind::Single),
                selected_answer: Some(a.selected_answer.map_or(Value::Null, Value::from)),
                selected_answers: None,
                is_marked: Some(a.is_marked),
            },
            UserAnswer::Multiple(a) => RawAnswer {
                question_id: Some(a.question_id),
                kind: Some(QuestionKind::Multiple),
                selected_answer: None,
                selected_answers: Some(Value::from(
                    a.selected_answers.iter().map(|i| Value::from(*i)).collect::<Vec<_>>(),
                )),
                is_marked: Some(a.is_marked),
            },
        }
    }
}
