// src/main.rs

use std::sync::Arc;

use exam_simulator::config::Config;
use exam_simulator::models::admin::Admin;
use exam_simulator::routes;
use exam_simulator::state::AppState;
use exam_simulator::storage::{
    admin_store::AdminStore, exam_store::FileExamStore, result_store::FileResultStore,
};
use exam_simulator::utils::hash::hash_password;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load configuration from environment (and .env, if present)
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    if let Err(e) = run(config).await {
        tracing::error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let exams = FileExamStore::open(&config.exams_dir).await?;
    let results = FileResultStore::open(&config.results_dir).await?;
    let admins = AdminStore::new(&config.admins_file);
    tracing::info!("Serving exams from {}", config.exams_dir.display());

    // Seed Admin User
    if let Err(e) = seed_admin_user(&admins, &config).await {
        tracing::error!("Failed to seed admin user: {}", e);
    }

    let state = AppState {
        exams: Arc::new(exams),
        results: Arc::new(results),
        admins,
        config: config.clone(),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Writes the default admin account when no admins file exists yet.
async fn seed_admin_user(
    admins: &AdminStore,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    if admins.exists().await {
        return Ok(());
    }

    tracing::info!("Seeding admin user: {}", config.admin_username);
    let hashed_password = hash_password(&config.admin_password)?;
    admins
        .write(&[Admin {
            id: "admin-1".to_string(),
            username: config.admin_username.clone(),
            password_hash: hashed_password,
        }])
        .await?;
    tracing::info!("Admin user created at {}", admins.path().display());
    Ok(())
}
