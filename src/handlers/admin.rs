// src/handlers/admin.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, StoreError},
    models::admin::{AdminLoginRequest, AdminStatus},
    storage::{admin_store::AdminStore, exam_store::ExamStore},
    upload::{UploadExamRequest, parse_upload},
    utils::{
        hash::verify_admin,
        jwt::{expired_session_cookie, session_claims, session_cookie, sign_jwt},
    },
};

/// Authenticates an admin and opens a cookie session.
pub async fn login(
    State(admins): State<AdminStore>,
    State(config): State<Config>,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let admin = admins.find(&payload.username).await.map_err(|e| {
        tracing::error!("Error reading admins file: {}", e);
        AppError::from(e)
    })?;

    if !verify_admin(admin.as_ref(), &payload.password)? {
        tracing::warn!(username = %payload.username, "Rejected admin login");
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }
    let admin = admin.ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    let token = sign_jwt(&admin.id, &admin.username, &config.session_secret, config.session_ttl)?;
    let cookie = session_cookie(&token, config.session_ttl)?;
    tracing::info!(username = %admin.username, "Admin logged in");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({
            "success": true,
            "username": admin.username,
        })),
    ))
}

/// Ends the admin session.
pub async fn logout() -> Result<impl IntoResponse, AppError> {
    Ok((
        [(header::SET_COOKIE, expired_session_cookie()?)],
        Json(json!({ "success": true })),
    ))
}

/// Reports whether the caller holds a valid admin session.
pub async fn status(State(config): State<Config>, headers: HeaderMap) -> impl IntoResponse {
    let claims = session_claims(&headers, &config.session_secret);
    Json(AdminStatus {
        is_authenticated: claims.is_some(),
        username: claims.map(|c| c.username),
    })
}

/// Accepts a CSV or JSON exam and writes it to the exam store.
/// Existing exams are never replaced. Admin only.
pub async fn upload_exam(
    State(exams): State<Arc<dyn ExamStore>>,
    Json(payload): Json<UploadExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let exam = parse_upload(payload, chrono::Utc::now().timestamp_millis()).map_err(|e| {
        tracing::warn!("Upload error: {}", e);
        AppError::from(e)
    })?;

    if exams.list_exams().await?.iter().any(|listed| listed.id == exam.id) {
        return Err(AppError::Conflict(format!("Exam '{}' already exists", exam.id)));
    }

    // The file name may be taken by an exam stored under a different id.
    let path = exams.save_exam(&exam).await.map_err(|e| match e {
        StoreError::AlreadyExists { .. } => {
            AppError::Conflict(format!("Exam '{}' already exists", exam.id))
        }
        other => AppError::from(other),
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Json(json!({
        "success": true,
        "examId": exam.id,
        "fileName": file_name,
        "questionCount": exam.questions.len(),
    })))
}
