//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono::{FixedOffset, Offset, Utc};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub cors_origin: String,
    pub http_timeout: Duration,

    // --- Catalog (TMDB) ---
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub tmdb_image_base_url: String,
    pub tmdb_language: String,

    // --- Document store (Firestore) ---
    pub firestore_project_id: String,
    pub firestore_base_url: String,
    pub firestore_auth_token: Option<String>,

    // --- Feed and onboarding tuning ---
    pub onboarding_auto_start: Duration,
    pub onboarding_idle_timeout: Duration,
    pub review_preview_count: usize,
    pub review_oversample: usize,
    pub feed_page_size: usize,
    pub trending_count: usize,
    pub display_utc_offset_hours: i32,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server Settings ---
        let bind_address = parse_var("BIND_ADDRESS", "0.0.0.0:3000")?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());
        let http_timeout = Duration::from_secs(parse_var("HTTP_TIMEOUT_SECS", "10")?);

        // --- Load Catalog Settings ---
        let tmdb_api_key = require_var("TMDB_API_KEY")?;
        let tmdb_base_url = std::env::var("TMDB_BASE_URL")
            .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string());
        let tmdb_image_base_url = std::env::var("TMDB_IMAGE_BASE_URL")
            .unwrap_or_else(|_| "https://image.tmdb.org/t/p/w500".to_string());
        let tmdb_language = std::env::var("TMDB_LANGUAGE").unwrap_or_else(|_| "ko-KR".to_string());

        // --- Load Document Store Settings ---
        let firestore_project_id = require_var("FIRESTORE_PROJECT_ID")?;
        let firestore_base_url = std::env::var("FIRESTORE_BASE_URL")
            .unwrap_or_else(|_| "https://firestore.googleapis.com/v1".to_string());
        let firestore_auth_token = std::env::var("FIRESTORE_AUTH_TOKEN").ok();

        // --- Load Feed and Onboarding Settings ---
        let onboarding_auto_start =
            Duration::from_millis(parse_var("ONBOARDING_AUTO_START_MS", "1000")?);
        let onboarding_idle_timeout =
            Duration::from_secs(parse_var("ONBOARDING_IDLE_SECS", "1800")?);
        let review_preview_count = parse_var("REVIEW_PREVIEW_COUNT", "5")?;
        let review_oversample = parse_var("REVIEW_OVERSAMPLE", "30")?;
        let feed_page_size = parse_var("FEED_PAGE_SIZE", "50")?;
        let trending_count = parse_var("TRENDING_COUNT", "20")?;
        let display_utc_offset_hours = parse_var("DISPLAY_UTC_OFFSET_HOURS", "9")?;
        if !(-23..=23).contains(&display_utc_offset_hours) {
            return Err(ConfigError::InvalidValue(
                "DISPLAY_UTC_OFFSET_HOURS".to_string(),
                format!("{} is outside -23..=23", display_utc_offset_hours),
            ));
        }

        Ok(Self {
            bind_address,
            log_level,
            cors_origin,
            http_timeout,
            tmdb_api_key,
            tmdb_base_url,
            tmdb_image_base_url,
            tmdb_language,
            firestore_project_id,
            firestore_base_url,
            firestore_auth_token,
            onboarding_auto_start,
            onboarding_idle_timeout,
            review_preview_count,
            review_oversample,
            feed_page_size,
            trending_count,
            display_utc_offset_hours,
        })
    }

    /// Offset used when formatting display dates.
    pub fn display_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.display_utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }
}

fn require_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

fn parse_var<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    parse_value(name, &raw)
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers_and_addresses() {
        let port: usize = parse_value("FEED_PAGE_SIZE", " 25 ").unwrap();
        assert_eq!(port, 25);
        let addr: SocketAddr = parse_value("BIND_ADDRESS", "127.0.0.1:8080").unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn invalid_value_names_the_variable() {
        let err = parse_value::<usize>("TRENDING_COUNT", "lots").unwrap_err();
        match err {
            ConfigError::InvalidValue(name, _) => assert_eq!(name, "TRENDING_COUNT"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
