use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;

/// Application configuration loaded from environment variables.
///
/// Nothing here is strictly required: a missing model key means every AI stage
/// takes its fallback path, and a missing database URL selects the in-memory
/// portfolio store.
#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: Option<String>,
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub stage_timeout: Duration,
    pub max_upload_bytes: usize,
    /// Sessions untouched for this long are evicted.
    pub session_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            google_api_key: optional_env("GOOGLE_GENERATIVE_AI_API_KEY"),
            database_url: optional_env("DATABASE_URL"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            stage_timeout: Duration::from_secs(parse_env(
                "STAGE_TIMEOUT_SECS",
                DEFAULT_STAGE_TIMEOUT_SECS,
            )?),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            session_ttl: Duration::from_secs(parse_env(
                "SESSION_TTL_SECS",
                DEFAULT_SESSION_TTL_SECS,
            )?),
        })
    }
}

/// Returns the variable's value, treating unset and blank the same way.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u64 = parse_env("FOLIO_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_optional_env_treats_blank_as_unset() {
        std::env::set_var("FOLIO_TEST_BLANK_VARIABLE", "   ");
        assert!(optional_env("FOLIO_TEST_BLANK_VARIABLE").is_none());
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("FOLIO_TEST_BAD_NUMBER", "sixty");
        let result: Result<u64> = parse_env("FOLIO_TEST_BAD_NUMBER", 1);
        assert!(result.is_err());
    }
}
