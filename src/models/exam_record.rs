// src/models/exam_record.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    answer::RawAnswer,
    localized::{LocalizedText, Locale},
};

/// Sub-score for one topical domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainResult {
    pub domain: String,
    pub correct: u32,
    pub total: u32,
    pub percentage: u32,
}

/// Per-question outcome, tagged like its source question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QuestionResult {
    Single(SingleQuestionResult),
    Multiple(MultipleQuestionResult),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleQuestionResult {
    pub question_id: i64,
    pub question: LocalizedText,
    pub options: Vec<LocalizedText>,
    pub user_answer: Option<u8>,
    pub correct_answer: u8,
    pub is_correct: bool,
    pub explanation: LocalizedText,
    pub domain: LocalizedText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleQuestionResult {
    pub question_id: i64,
    pub question: LocalizedText,
    pub options: Vec<LocalizedText>,
    pub user_answers: BTreeSet<u8>,
    pub correct_answers: BTreeSet<u8>,
    pub is_correct: bool,
    pub explanation: LocalizedText,
    pub domain: LocalizedText,
}

impl QuestionResult {
    pub fn is_correct(&self) -> bool {
        match self {
            QuestionResult::Single(r) => r.is_correct,
            QuestionResult::Multiple(r) => r.is_correct,
        }
    }
}

/// Outcome of scoring one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub total_questions: u32,
    pub correct_answers: u32,
    pub percentage: u32,
    pub passed: bool,
    pub domain_results: Vec<DomainResult>,
    pub question_results: Vec<QuestionResult>,
}

/// Persisted summary of a submitted attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamTestRecord {
    pub id: String,
    pub tester_name: String,
    pub exam_id: String,
    pub exam_title: String,
    pub score: u32,
    pub percentage: u32,
    pub total_questions: u32,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub domain_results: Vec<DomainResult>,
}

/// Record payload before the store assigns an id.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_score_bounds))]
pub struct NewExamTestRecord {
    #[validate(length(min = 1, max = 200))]
    pub tester_name: String,
    #[validate(length(min = 1, max = 200))]
    pub exam_id: String,
    #[validate(length(min = 1, max = 500))]
    pub exam_title: String,
    pub score: u32,
    #[validate(range(max = 100))]
    pub percentage: u32,
    pub total_questions: u32,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[validate(custom(function = validate_domain_results))]
    pub domain_results: Vec<DomainResult>,
}

fn validate_score_bounds(record: &NewExamTestRecord) -> Result<(), validator::ValidationError> {
    if record.score > record.total_questions {
        return Err(validator::ValidationError::new("score_exceeds_total"));
    }
    Ok(())
}

fn validate_domain_results(results: &[DomainResult]) -> Result<(), validator::ValidationError> {
    for result in results {
        if result.correct > result.total || result.percentage > 100 {
            return Err(validator::ValidationError::new("invalid_domain_result"));
        }
    }
    Ok(())
}

impl NewExamTestRecord {
    pub fn into_record(self, id: String, now_ms: i64) -> ExamTestRecord {
        ExamTestRecord {
            id,
            tester_name: self.tester_name,
            exam_id: self.exam_id,
            exam_title: self.exam_title,
            score: self.score,
            percentage: self.percentage,
            total_questions: self.total_questions,
            timestamp: self.timestamp.unwrap_or(now_ms),
            domain_results: self.domain_results,
        }
    }
}

/// Query parameters for the paginated result listing.
///
/// Kept as strings so that junk values fall back to the defaults instead
/// of rejecting the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResultsParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

pub const DEFAULT_PAGE_SIZE: usize = 10;

impl ListResultsParams {
    pub fn page(&self) -> usize {
        parse_positive(self.page.as_deref()).unwrap_or(1)
    }

    pub fn page_size(&self) -> usize {
        parse_positive(self.page_size.as_deref()).unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

fn parse_positive(value: Option<&str>) -> Option<usize> {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| *v > 0)
}

/// One page of stored records plus the unpaginated total.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsPage {
    pub records: Vec<ExamTestRecord>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

/// Request body for scoring a finished attempt on the server.
#[derive(Debug, Deserialize)]
pub struct ScoreExamRequest {
    pub answers: Vec<RawAnswer>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScoreExamParams {
    #[serde(default)]
    pub lang: Locale,
}

/// Scoring response, titled for display.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredExamResponse {
    pub exam_title: String,
    #[serde(flatten)]
    pub result: ExamResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(score: u32, total: u32) -> NewExamTestRecord {
        NewExamTestRecord {
            tester_name: "Alice".into(),
            exam_id: "pmp-1".into(),
            exam_title: "PMP Practice".into(),
            score,
            percentage: 50,
            total_questions: total,
            timestamp: None,
            domain_results: vec![DomainResult {
                domain: "People".into(),
                correct: 1,
                total: 2,
                percentage: 50,
            }],
        }
    }

    #[test]
    fn accepts_consistent_record() {
        assert!(record(1, 2).validate().is_ok());
    }

    #[test]
    fn rejects_score_above_total() {
        assert!(record(3, 2).validate().is_err());
    }

    #[test]
    fn rejects_blank_tester_name() {
        let mut r = record(1, 2);
        r.tester_name.clear();
        assert!(r.validate().is_err());
    }

    #[test]
    fn pagination_params_fall_back_to_defaults() {
        let params = ListResultsParams {
            page: Some("abc".into()),
            page_size: Some("0".into()),
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.page_size(), DEFAULT_PAGE_SIZE);

        let params = ListResultsParams {
            page: Some("3".into()),
            page_size: Some("25".into()),
        };
        assert_eq!(params.page(), 3);
        assert_eq!(params.page_size(), 25);
    }

    #[test]
    fn missing_timestamp_uses_store_clock() {
        let stored = record(1, 2).into_record("id-1".into(), 1_700_000_000_000);
        assert_eq!(stored.timestamp, 1_700_000_000_000);
        assert_eq!(stored.id, "id-1");
    }
}
