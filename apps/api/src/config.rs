use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Which backend holds job records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Redis,
    /// Process-local map; for running without Redis.
    Memory,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub redis_url: String,
    pub redis_tls_insecure: bool,
    pub store: StoreKind,
    pub port: u16,
    pub rust_log: String,
    /// Retention window of every job record.
    pub job_ttl: Duration,
    pub worker_concurrency: usize,
    pub job_queue_capacity: usize,
    /// `None` lets a generation run as long as the LLM client allows.
    pub generation_timeout: Option<Duration>,
    pub llm_max_attempts: u32,
    pub llm_http_timeout: Duration,
    pub shutdown_grace: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let store = match var("STORE_BACKEND", "redis").to_ascii_lowercase().as_str() {
            "redis" => StoreKind::Redis,
            "memory" => StoreKind::Memory,
            other => bail!("STORE_BACKEND must be 'redis' or 'memory', got '{other}'"),
        };

        Ok(Config {
            anthropic_api_key: lookup("ANTHROPIC_API_KEY").with_context(|| {
                "Required environment variable 'ANTHROPIC_API_KEY' is not set".to_string()
            })?,
            redis_url: var("REDIS_URL", "redis://localhost:6379"),
            redis_tls_insecure: parse(&var("REDIS_TLS_INSECURE", "true"), "REDIS_TLS_INSECURE")?,
            store,
            port: parse(&var("PORT", "5000"), "PORT")?,
            rust_log: var("RUST_LOG", "info"),
            job_ttl: secs(&var("JOB_TTL_SECS", "86400"), "JOB_TTL_SECS")?,
            worker_concurrency: parse(&var("WORKER_CONCURRENCY", "8"), "WORKER_CONCURRENCY")?,
            job_queue_capacity: parse(&var("JOB_QUEUE_CAPACITY", "256"), "JOB_QUEUE_CAPACITY")?,
            generation_timeout: lookup("GENERATION_TIMEOUT_SECS")
                .map(|v| secs(&v, "GENERATION_TIMEOUT_SECS"))
                .transpose()?,
            llm_max_attempts: parse(&var("LLM_MAX_ATTEMPTS", "1"), "LLM_MAX_ATTEMPTS")?,
            llm_http_timeout: secs(&var("LLM_HTTP_TIMEOUT_SECS", "600"), "LLM_HTTP_TIMEOUT_SECS")?,
            shutdown_grace: secs(&var("SHUTDOWN_GRACE_SECS", "30"), "SHUTDOWN_GRACE_SECS")?,
        })
    }
}

fn parse<T>(value: &str, key: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .with_context(|| format!("{key} has an invalid value '{value}'"))
}

fn secs(value: &str, key: &str) -> Result<Duration> {
    parse::<u64>(value, key).map(Duration::from_secs)
}
