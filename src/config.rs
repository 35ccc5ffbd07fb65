// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A local `.env` file is honored for development. Nothing downstream reads
//! the environment directly; the destination's connection string in
//! particular is handed to the store constructor from here.

use std::env;
use std::path::PathBuf;

/// Public OAuth client identifier used by the Peloton web client.
pub const DEFAULT_CLIENT_ID: &str = "WVoJxVDdPoFx4RNewvvg6ch2mZ7bwnsM";

/// Sent on every API call alongside the bearer token.
pub const USER_AGENT: &str = "peloton-client/1.0";

/// Refresh when the token expires within a day.
pub const DEFAULT_REFRESH_BUFFER_SECS: i64 = 86_400;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the persisted credential record
    pub tokens_file: PathBuf,
    /// Base URL of the workout API
    pub api_base: String,
    /// OAuth token exchange endpoint
    pub token_endpoint: String,
    /// OAuth client identifier sent with refresh requests
    pub client_id: String,
    /// Skip the `/api/me` lookup when set
    pub user_id: Option<String>,
    /// Destination connection string
    pub destination_url: String,
    /// Destination table name
    pub destination_table: String,
    /// Lookahead window before expiry that triggers a refresh
    pub refresh_buffer_secs: i64,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            tokens_file: PathBuf::from("peloton_tokens.json"),
            api_base: "http://127.0.0.1:0".to_string(),
            token_endpoint: "http://127.0.0.1:0/oauth/token".to_string(),
            client_id: "test_client_id".to_string(),
            user_id: None,
            destination_url: "sqlite::memory:".to_string(),
            destination_table: "workouts_raw".to_string(),
            refresh_buffer_secs: DEFAULT_REFRESH_BUFFER_SECS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let destination_table =
            env::var("DESTINATION_TABLE").unwrap_or_else(|_| "workouts_raw".to_string());
        if !is_plain_identifier(&destination_table) {
            return Err(ConfigError::Invalid {
                name: "DESTINATION_TABLE",
                value: destination_table,
            });
        }

        let refresh_buffer_secs = match env::var("REFRESH_BUFFER_SECS") {
            Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "REFRESH_BUFFER_SECS",
                value: raw.clone(),
            })?,
            Err(_) => DEFAULT_REFRESH_BUFFER_SECS,
        };

        Ok(Self {
            tokens_file: env::var("PELOTON_TOKENS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("peloton_tokens.json")),
            api_base: env::var("PELOTON_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://api.onepeloton.com".to_string()),
            token_endpoint: env::var("PELOTON_TOKEN_ENDPOINT")
                .unwrap_or_else(|_| "https://auth.onepeloton.com/oauth/token".to_string()),
            client_id: env::var("PELOTON_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|_| DEFAULT_CLIENT_ID.to_string()),
            user_id: env::var("PELOTON_USER_ID")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            destination_url: env::var("DESTINATION_URL")
                .unwrap_or_else(|_| "sqlite://peloton.db".to_string()),
            destination_table,
            refresh_buffer_secs,
        })
    }
}

/// Table names are interpolated into SQL, so only `[A-Za-z_][A-Za-z0-9_]*` is allowed.
fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
