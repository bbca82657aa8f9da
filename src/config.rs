use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub poll_interval: Duration,
    pub event_buffer_size: usize,
    pub print_queue_size: usize,
    /// Remote order store base URL; an in-memory store is used when unset.
    pub order_store_url: Option<String>,
    pub order_store_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let poll_interval_ms: u64 = parse_or_default("POLL_INTERVAL_MS", 5_000)?;
        if poll_interval_ms == 0 {
            return Err(AppError::Internal(
                "invalid POLL_INTERVAL_MS: must be > 0".to_string(),
            ));
        }

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            poll_interval: Duration::from_millis(poll_interval_ms),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            print_queue_size: parse_or_default("PRINT_QUEUE_SIZE", 256)?,
            order_store_url: env::var("ORDER_STORE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            order_store_timeout: Duration::from_secs(parse_or_default(
                "ORDER_STORE_TIMEOUT_SECS",
                30,
            )?),
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
