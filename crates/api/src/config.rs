use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use reelworks_core::memory::DEFAULT_LOCK_WAIT;
use reelworks_core::WorkflowConfig;

use crate::auth::jwt::JwtConfig;

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("unknown log format '{other}'"),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except the database URL and JWT secret have defaults suitable
/// for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Parsed from the comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub database_url: String,
    pub jwt: JwtConfig,
    /// Bound on waiting for a project's row lock.
    pub lock_wait: Duration,
    pub workflow: WorkflowConfig,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `HOST`                      | `0.0.0.0`               |
    /// | `PORT`                      | `3000`                  |
    /// | `CORS_ORIGINS`              | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                    |
    /// | `DATABASE_URL`              | required                |
    /// | `JWT_SECRET`                | required                |
    /// | `WORKFLOW_LOCK_WAIT_MS`     | `2000`                  |
    /// | `WORKFLOW_MAX_ATTEMPTS`     | `3`                     |
    /// | `WORKFLOW_RETRY_BACKOFF_MS` | `50`                    |
    /// | `LOG_FORMAT`                | `pretty`                |
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env_or("HOST", "0.0.0.0".to_string())?;
        let port = env_or("PORT", 3000u16)?;

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = env_or("REQUEST_TIMEOUT_SECS", 30u64)?;
        let database_url = required("DATABASE_URL")?;
        let jwt = JwtConfig::new(required("JWT_SECRET")?);

        let defaults = WorkflowConfig::default();
        let lock_wait = Duration::from_millis(env_or(
            "WORKFLOW_LOCK_WAIT_MS",
            DEFAULT_LOCK_WAIT.as_millis() as u64,
        )?);
        let max_attempts = env_or("WORKFLOW_MAX_ATTEMPTS", defaults.max_attempts)?;
        anyhow::ensure!(max_attempts >= 1, "WORKFLOW_MAX_ATTEMPTS must be at least 1");
        let retry_backoff = Duration::from_millis(env_or(
            "WORKFLOW_RETRY_BACKOFF_MS",
            defaults.retry_backoff.as_millis() as u64,
        )?);

        let log_format = env_or("LOG_FORMAT", LogFormat::Pretty)?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            jwt,
            lock_wait,
            workflow: WorkflowConfig {
                max_attempts,
                retry_backoff,
            },
            log_format,
        })
    }
}

/// Parse `key` if set, otherwise use `default`.
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} is invalid ('{raw}'): {e}")),
        Err(_) => Ok(default),
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    let value = std::env::var(key).with_context(|| format!("{key} must be set"))?;
    anyhow::ensure!(!value.is_empty(), "{key} must not be empty");
    Ok(value)
}
