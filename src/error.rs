// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types for the sync run.
//!
//! `SyncError` is what `run()` and the CLI see. Everything touching the
//! credential is fatal; per-page and per-item failures never reach this
//! type and are handled inside the fetcher.

use crate::config::ConfigError;
use reqwest::StatusCode;

/// Run-level error type.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Credential unavailable: {0}")]
    CredentialUnavailable(String),

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Destination connection failed: {0}")]
    DestinationConnectFailed(String),

    #[error("Destination error: {0}")]
    Destination(String),

    #[error("Peloton API error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl SyncError {
    /// Whether the failure came from loading or refreshing the credential.
    pub fn is_fatal_credential_error(&self) -> bool {
        matches!(
            self,
            SyncError::CredentialUnavailable(_) | SyncError::RefreshFailed(_)
        )
    }
}

/// Failure of a single remote API call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Decode(String),
}

impl From<ApiError> for SyncError {
    fn from(err: ApiError) -> Self {
        SyncError::Api(err.to_string())
    }
}

/// Failure of a destination store call.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connect failed: {0}")]
    Connect(String),

    #[error("Query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Decode failed: {0}")]
    Decode(String),
}

/// Result type alias for run-level operations.
pub type Result<T> = std::result::Result<T, SyncError>;
