// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{config::Config, error::AppError};

/// Name of the cookie carrying the admin session token.
pub const SESSION_COOKIE: &str = "exam_admin_session";

/// Admin session claims.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - the admin id.
    pub sub: String,
    pub username: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// Signs a session token for an admin.
pub fn sign_jwt(
    admin_id: &str,
    username: &str,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: admin_id.to_owned(),
        username: username.to_owned(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Finds the session token in the session cookie, falling back to an
/// `Authorization: Bearer` header for non-browser clients.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
    })
}

/// Claims of a valid session in `headers`, if any.
pub fn session_claims(headers: &HeaderMap, secret: &str) -> Option<Claims> {
    extract_token(headers).and_then(|token| verify_jwt(token, secret).ok())
}

/// `Set-Cookie` value establishing a session.
pub fn session_cookie(token: &str, max_age: u64) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age
    ))
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// `Set-Cookie` value removing the session.
pub fn expired_session_cookie() -> Result<HeaderValue, AppError> {
    session_cookie("", 0)
}

/// Axum Middleware: Admin Authentication.
///
/// Accepts the session cookie or a bearer token. If valid, injects `Claims`
/// into the request extensions for handlers to use; otherwise responds
/// 401 with a JSON error.
pub async fn admin_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match session_claims(req.headers(), &config.session_secret) {
        Some(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({ "error": "Unauthorized - Please login" })),
        )
            .into_response(),
    }
}
