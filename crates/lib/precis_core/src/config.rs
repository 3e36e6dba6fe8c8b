//! Application configuration.
//!
//! One explicit struct, read from the environment once at process start and
//! passed to components by reference. No global singletons.

use crate::auth::jwt::resolve_jwt_secret;

/// Configuration for the Precis backend.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3400").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    pub jwt_expiry_secs: i64,
    /// OTP validity window in seconds (registration and password recovery).
    pub otp_expiry_secs: i64,
    /// Shared secret for the worker notification callback.
    pub notify_key: String,
    /// URL the worker POSTs task outcomes to (the `/notify/task` endpoint).
    pub notify_url: String,
    /// Server-wide LLM API key, used when a user has no personal key.
    pub openai_api_key: String,
    /// Chat model used for summarisation.
    pub openai_model: String,
    /// Chat completions endpoint.
    pub openai_api_url: String,
    /// Page size (in characters) for summarisation slicing.
    pub page_size: usize,
    /// Free-trial quota (characters) granted to new users.
    pub free_trial_units: i64,
    /// Number of summarisation worker tasks.
    pub worker_count: usize,
}

impl AppConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable           | Default                                  |
    /// |--------------------|------------------------------------------|
    /// | `BIND_ADDR`        | `127.0.0.1:3400`                         |
    /// | `DATABASE_URL`     | `postgres://localhost:5432/precis`       |
    /// | `JWT_SECRET`       | generated & persisted to file            |
    /// | `JWT_EXPIRY_SECS`  | `3600`                                   |
    /// | `OTP_EXPIRY_SECS`  | `300`                                    |
    /// | `NOTIFY_KEY`       | generated per process                    |
    /// | `NOTIFY_URL`       | `http://{BIND_ADDR}/notify/task`         |
    /// | `OPENAI_API_KEY`   | empty (users must set a personal key)    |
    /// | `OPENAI_MODEL`     | `gpt-4o-mini`                            |
    /// | `OPENAI_API_URL`   | `https://api.openai.com/v1/chat/completions` |
    /// | `PAGE_SIZE`        | `1000`                                   |
    /// | `FREE_TRIAL_UNITS` | `10000`                                  |
    /// | `WORKER_COUNT`     | `2`                                      |
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3400".into());
        let notify_url = std::env::var("NOTIFY_URL")
            .unwrap_or_else(|_| format!("http://{bind_addr}/notify/task"));
        Self {
            bind_addr,
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/precis".into()),
            jwt_secret: resolve_jwt_secret(),
            jwt_expiry_secs: env_i64("JWT_EXPIRY_SECS", 3600),
            otp_expiry_secs: env_i64("OTP_EXPIRY_SECS", 300),
            notify_key: std::env::var("NOTIFY_KEY")
                .unwrap_or_else(|_| crate::auth::password::generate_salt(32)),
            notify_url,
            openai_api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".into()),
            openai_api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".into()),
            page_size: env_i64("PAGE_SIZE", 1000) as usize,
            free_trial_units: env_i64("FREE_TRIAL_UNITS", 10_000),
            worker_count: env_i64("WORKER_COUNT", 2) as usize,
        }
    }
}

fn env_i64(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
