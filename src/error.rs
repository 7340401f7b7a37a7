// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 500 with a structural report, for stored exams that fail validation
    InvalidExamData(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., uploading over an existing exam id)
    Conflict(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
            AppError::InvalidExamData(details) => {
                tracing::error!("Invalid exam structure: {}", details);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Invalid exam data structure", "details": details }),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
        };

        (status, Json(body)).into_response()
    }
}

/// Structural problems in exam, question or answer data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("exam id must not be empty")]
    EmptyExamId,

    #[error("exam '{0}' has an empty title")]
    EmptyTitle(String),

    #[error("exam '{0}' must have a positive duration")]
    InvalidDuration(String),

    #[error("question {id}: question text is empty")]
    EmptyQuestion { id: i64 },

    #[error("question {id}: expected 4 options, found {found}")]
    OptionCount { id: i64, found: usize },

    #[error("question {id}: missing correct answer")]
    MissingCorrectAnswer { id: i64 },

    #[error("question {id}: answer index {index} is outside 0..=3")]
    AnswerOutOfRange { id: i64, index: i64 },

    #[error("question {id}: multiple-answer questions need at least 2 distinct correct answers")]
    TooFewCorrectAnswers { id: i64 },

    #[error("question {id}: invalid selection limits ({detail})")]
    SelectionLimits { id: i64, detail: String },

    #[error("expected {expected} answers, received {found}")]
    AnswerCount { expected: usize, found: usize },
}

/// Failures of the file-backed stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed json in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} already exists")]
    AlreadyExists { path: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl StoreError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn json(path: impl AsRef<std::path::Path>, source: serde_json::Error) -> Self {
        StoreError::Json {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

/// Converts `ValidationError` into `AppError::BadRequest`.
impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Converts `StoreError` into the matching HTTP error.
/// Allows using `?` operator on store calls.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(e) => AppError::InvalidExamData(e.to_string()),
            StoreError::AlreadyExists { path } => {
                AppError::Conflict(format!("{} already exists", path))
            }
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Rejected session mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("the exam has already been submitted")]
    AlreadySubmitted,

    #[error("question index {index} is out of range for {len} questions")]
    QuestionOutOfRange { index: usize, len: usize },

    #[error("option {option} does not exist")]
    OptionOutOfRange { option: u8 },

    #[error("question {index} does not accept this kind of answer")]
    WrongAnswerKind { index: usize },
}
