// src/models/question.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::localized::LocalizedText;

/// Every question carries exactly this many options.
pub const OPTION_COUNT: usize = 4;

/// Discriminant shared by questions, answers and per-question results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Single,
    Multiple,
}

/// A validated question definition.
///
/// Serialized with an explicit `type` tag so a stored exam never needs
/// shape inference again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Question {
    Single(SingleAnswerQuestion),
    Multiple(MultipleAnswerQuestion),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleAnswerQuestion {
    pub id: i64,
    pub question: LocalizedText,
    pub options: Vec<LocalizedText>,
    pub correct_answer: u8,
    pub explanation: LocalizedText,
    pub domain: LocalizedText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleAnswerQuestion {
    pub id: i64,
    pub question: LocalizedText,
    pub options: Vec<LocalizedText>,
    pub correct_answers: BTreeSet<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_selections: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_selections: Option<u8>,
    pub explanation: LocalizedText,
    pub domain: LocalizedText,
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        match self {
            Question::Single(_) => QuestionKind::Single,
            Question::Multiple(_) => QuestionKind::Multiple,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Question::Single(q) => q.id,
            Question::Multiple(q) => q.id,
        }
    }

    pub fn text(&self) -> &LocalizedText {
        match self {
            Question::Single(q) => &q.question,
            Question::Multiple(q) => &q.question,
        }
    }

    pub fn domain(&self) -> &LocalizedText {
        match self {
            Question::Single(q) => &q.domain,
            Question::Multiple(q) => &q.domain,
        }
    }

    pub fn options(&self) -> &[LocalizedText] {
        match self {
            Question::Single(q) => &q.options,
            Question::Multiple(q) => &q.options,
        }
    }
}

/// A complete exam definition as read from the definition store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    pub id: String,
    pub title: LocalizedText,
    pub description: LocalizedText,
    /// Minutes.
    pub duration: u32,
    pub questions: Vec<Question>,
}

impl Exam {
    pub fn duration_secs(&self) -> u64 {
        u64::from(self.duration) * 60
    }
}

/// Summary row returned by the exam listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamListItem {
    pub id: String,
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub question_count: usize,
    pub duration: u32,
}

impl From<&Exam> for ExamListItem {
    fn from(exam: &Exam) -> Self {
        Self {
            id: exam.id.clone(),
            title: exam.title.clone(),
            description: exam.description.clone(),
            question_count: exam.questions.len(),
            duration: exam.duration,
        }
    }
}

/// Question as found on disk, possibly written before the `type` tag existed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestion {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: Option<QuestionKind>,
    pub question: LocalizedText,
    pub options: Vec<LocalizedText>,
    #[serde(default)]
    pub correct_answer: Option<i64>,
    #[serde(default)]
    pub correct_answers: Option<Vec<i64>>,
    #[serde(default)]
    pub min_selections: Option<i64>,
    #[serde(default)]
    pub max_selections: Option<i64>,
    pub explanation: LocalizedText,
    pub domain: LocalizedText,
}

/// Exam as found on disk, before normalization and validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawExam {
    pub id: String,
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub duration: u32,
    pub questions: Vec<RawQuestion>,
}
