// src/upload/mod.rs

pub mod csv_exam;

use serde::Deserialize;

use crate::{
    error::{AppError, ValidationError},
    exam::normalize::normalize_exam,
    models::question::{Exam, RawExam},
    storage::is_safe_id,
    utils::html::sanitize_exam,
};

/// Body of an admin upload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadExamRequest {
    pub file_name: Option<String>,
    pub content: Option<String>,
    #[serde(default)]
    pub exam_data: Option<UploadMetadata>,
}

/// Optional title/description supplied alongside a CSV file.
#[derive(Debug, Default, Deserialize)]
pub struct UploadMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Missing fileName or content")]
    MissingFile,

    #[error("Only CSV and JSON files are supported")]
    UnsupportedFormat,

    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid exam structure: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid exam structure: {0}")]
    Validation(#[from] ValidationError),

    #[error("Exam id '{0}' may only contain letters, digits, '-', '_' and '.'")]
    UnsafeId(String),
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Turns an upload into a validated, sanitized exam ready to be stored.
///
/// `now_ms` names CSV exams (`exam-<now_ms>`); JSON uploads carry their own id.
pub fn parse_upload(request: UploadExamRequest, now_ms: i64) -> Result<Exam, UploadError> {
    let (file_name, content) = match (request.file_name, request.content) {
        (Some(name), Some(content)) if !name.is_empty() && !content.is_empty() => (name, content),
        _ => return Err(UploadError::MissingFile),
    };
    let metadata = request.exam_data.unwrap_or_default();
    let lower_name = file_name.to_lowercase();

    let exam = if lower_name.ends_with(".csv") {
        let rows = csv_exam::parse_csv(&content)?;
        let title = metadata
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("Uploaded Exam");
        csv_exam::csv_to_exam(
            &rows,
            format!("exam-{}", now_ms),
            title,
            metadata.description.as_deref(),
        )?
    } else if lower_name.ends_with(".json") {
        let raw: RawExam = serde_json::from_str(&content)?;
        normalize_exam(raw)?
    } else {
        return Err(UploadError::UnsupportedFormat);
    };

    if !is_safe_id(&exam.id) {
        return Err(UploadError::UnsafeId(exam.id));
    }

    let exam = sanitize_exam(exam);
    check_display_text(&exam)?;
    Ok(exam)
}

/// Sanitizing can strip markup-only text down to nothing.
fn check_display_text(exam: &Exam) -> Result<(), ValidationError> {
    if exam.title.is_blank() {
        return Err(ValidationError::EmptyTitle(exam.id.clone()));
    }
    match exam.questions.iter().find(|q| q.text().is_blank()) {
        Some(question) => Err(ValidationError::EmptyQuestion { id: question.id() }),
        None => Ok(()),
    }
}
