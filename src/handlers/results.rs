// src/handlers/results.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::exam_record::{ListResultsParams, NewExamTestRecord, ResultsPage},
    storage::result_store::ResultStore,
};

/// Stores the summary of a submitted attempt.
///
/// Open to testers; the store assigns the id.
pub async fn save_result(
    State(results): State<Arc<dyn ResultStore>>,
    Json(payload): Json<NewExamTestRecord>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(|e| {
        tracing::warn!("Invalid result data: {}", e);
        AppError::BadRequest("Invalid result data".to_string())
    })?;

    let saved = results.save(payload).await?;

    Ok(Json(json!({
        "success": true,
        "recordId": saved.id,
    })))
}

/// Lists stored attempts, newest first.
/// Admin only.
pub async fn list_results(
    State(results): State<Arc<dyn ResultStore>>,
    Query(params): Query<ListResultsParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page();
    let page_size = params.page_size();

    let (records, total) = results.list(page, page_size).await.map_err(|e| {
        tracing::error!("Error fetching results: {}", e);
        AppError::from(e)
    })?;

    Ok(Json(ResultsPage {
        records,
        total,
        page,
        page_size,
    }))
}
