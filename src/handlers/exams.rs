// src/handlers/exams.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    exam::{
        normalize::normalize_answers,
        scoring::score_exam,
        submission::{build_record, persist_best_effort},
    },
    models::{
        answer::RawAnswer,
        exam_record::{ScoreExamParams, ScoreExamRequest, ScoredExamResponse},
        localized::Locale,
        question::Exam,
    },
    storage::{exam_store::ExamStore, result_store::ResultStore},
};

async fn load_exam(store: &dyn ExamStore, id: &str) -> Result<Exam, AppError> {
    store
        .get_exam(id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))
}

/// Lists every available exam.
pub async fn list_exams(
    State(exams): State<Arc<dyn ExamStore>>,
) -> Result<impl IntoResponse, AppError> {
    let list = exams.list_exams().await.map_err(|e| {
        tracing::error!("Error fetching exams: {}", e);
        AppError::from(e)
    })?;

    Ok(Json(list))
}

/// Returns one exam with every question tagged.
pub async fn get_exam(
    State(exams): State<Arc<dyn ExamStore>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(load_exam(exams.as_ref(), &id).await?))
}

/// Scores a finished attempt without storing anything.
///
/// Answers may come from any client version; they are paired with the
/// exam's questions by position.
pub async fn score_attempt(
    State(exams): State<Arc<dyn ExamStore>>,
    Path(id): Path<String>,
    Query(params): Query<ScoreExamParams>,
    Json(req): Json<ScoreExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let exam = load_exam(exams.as_ref(), &id).await?;
    let answers = normalize_answers(&exam.questions, &req.answers)?;
    let result = score_exam(&exam.questions, &answers, params.lang);

    Ok(Json(ScoredExamResponse {
        exam_title: exam.title.resolve(params.lang).to_string(),
        result,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptRequest {
    #[serde(default)]
    pub tester_name: Option<String>,
    pub answers: Vec<RawAnswer>,
}

/// Scores an attempt and records it.
///
/// Recording is best effort: when the result store fails the score is
/// still returned, with a null `recordId`.
pub async fn submit_attempt(
    State(exams): State<Arc<dyn ExamStore>>,
    State(results): State<Arc<dyn ResultStore>>,
    Path(id): Path<String>,
    Query(params): Query<ScoreExamParams>,
    Json(req): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let exam = load_exam(exams.as_ref(), &id).await?;
    let answers = normalize_answers(&exam.questions, &req.answers)?;

    let result = score_exam(&exam.questions, &answers, params.lang);

    // Stored records always group domains by their English names.
    let english =
        (params.lang != Locale::En).then(|| score_exam(&exam.questions, &answers, Locale::En));
    let record = build_record(
        req.tester_name.as_deref(),
        &exam,
        english.as_ref().unwrap_or(&result),
    );
    let saved = persist_best_effort(results.as_ref(), record).await;

    Ok(Json(serde_json::json!({
        "recordId": saved.map(|r| r.id),
        "examTitle": exam.title.resolve(params.lang),
        "result": result,
    })))
}
