// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{
    handlers::{admin, exams, results},
    state::AppState,
    utils::jwt::admin_middleware,
};

/// Assembles the main application router.
///
/// * Nests the exam, result and admin APIs under `/api`.
/// * Gates result listing and uploads behind the admin session.
/// * Serves the built client for every other path.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:5173"),
            HeaderValue::from_static("http://127.0.0.1:5173"),
        ])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    let admin_only = middleware::from_fn_with_state(state.clone(), admin_middleware);

    let exam_routes = Router::new()
        .route("/", get(exams::list_exams))
        .route("/{id}", get(exams::get_exam))
        .route("/{id}/score", post(exams::score_attempt))
        .route("/{id}/submit", post(exams::submit_attempt));

    // Layers on a method router only wrap the methods added before them.
    let result_routes = Router::new().route(
        "/",
        get(results::list_results)
            .route_layer(admin_only.clone())
            .post(results::save_result),
    );

    let admin_routes = Router::new()
        .route("/login", post(admin::login))
        .route("/logout", post(admin::logout))
        .route("/status", get(admin::status))
        .merge(
            Router::new()
                .route("/upload", post(admin::upload_exam))
                .route_layer(admin_only),
        );

    let index = state.config.static_dir.join("index.html");
    let client = ServeDir::new(&state.config.static_dir).not_found_service(ServeFile::new(index));

    Router::new()
        .nest("/api/exams", exam_routes)
        .nest("/api/results", result_routes)
        .nest("/api/admin", admin_routes)
        .fallback_service(client)
        // Global Middleware (applied from outside in)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
