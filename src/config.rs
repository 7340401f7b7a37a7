// src/config.rs

use std::{env, net::SocketAddr, path::PathBuf, str::FromStr};

use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub exams_dir: PathBuf,
    pub results_dir: PathBuf,
    pub admins_file: PathBuf,
    pub static_dir: PathBuf,
    pub session_secret: String,
    /// Admin session lifetime in seconds.
    pub session_ttl: u64,
    pub admin_username: String,
    pub admin_password: String,
    pub max_upload_bytes: usize,
    pub rust_log: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let session_secret = env::var("SESSION_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("SESSION_SECRET"))?;

        Ok(Self {
            bind_addr: parsed("BIND_ADDR", "0.0.0.0:5000")?,
            exams_dir: PathBuf::from(var_or("EXAMS_DIR", "exams")),
            results_dir: PathBuf::from(var_or("RESULTS_DIR", "exams/results")),
            admins_file: PathBuf::from(var_or("ADMINS_FILE", "data/admins.json")),
            static_dir: PathBuf::from(var_or("STATIC_DIR", "client/dist")),
            session_secret,
            session_ttl: parsed("SESSION_TTL_SECS", "86400")?,
            admin_username: var_or("ADMIN_USERNAME", "admin"),
            admin_password: var_or("ADMIN_PASSWORD", "admin123"),
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES", "10485760")?,
            rust_log: var_or("RUST_LOG", "info"),
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed<T: FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = var_or(name, default);
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}
