// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth token lifecycle.
//!
//! Handles:
//! - Proactive refresh when the token is within the refresh buffer of expiry
//! - Merging rotated fields into the stored record
//! - Persisting the record before any header is handed out

use crate::config::{Config, USER_AGENT};
use crate::error::{Result, SyncError};
use crate::models::{CredentialRecord, TokenRefreshResponse};
use crate::services::CredentialStore;
use crate::time_utils::now_epoch_secs;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT as USER_AGENT_HEADER};
use serde::Serialize;
use std::time::Duration;

/// Timeout for the token exchange and validation calls.
pub const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Body bytes of a failed exchange that make it into the log.
const ERROR_BODY_LOG_LIMIT: usize = 500;

#[derive(Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    refresh_token: &'a str,
}

/// Client for the OAuth token endpoint.
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    token_endpoint: String,
    client_id: String,
}

impl AuthClient {
    pub fn new(token_endpoint: String, client_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_endpoint,
            client_id,
        }
    }

    /// Exchange a refresh token for a new access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenRefreshResponse> {
        tracing::info!("Attempting to refresh token");

        let response = self
            .http
            .post(&self.token_endpoint)
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .json(&RefreshRequest {
                grant_type: "refresh_token",
                client_id: &self.client_id,
                refresh_token,
            })
            .send()
            .await
            .map_err(|e| SyncError::RefreshFailed(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %truncate_utf8(&body, ERROR_BODY_LOG_LIMIT),
                "Token refresh rejected"
            );
            return Err(SyncError::RefreshFailed(format!(
                "token endpoint returned {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SyncError::RefreshFailed(format!("token response read failed: {}", e)))?;

        serde_json::from_str(&body)
            .map_err(|e| SyncError::RefreshFailed(format!("failed to parse token response: {}", e)))
    }
}

fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Build the headers attached to every API call.
pub fn auth_headers(record: &CredentialRecord) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let mut authorization = HeaderValue::from_str(&record.authorization_value()).map_err(|_| {
        SyncError::CredentialUnavailable("access token is not a valid header value".to_string())
    })?;
    authorization.set_sensitive(true);
    headers.insert(AUTHORIZATION, authorization);
    headers.insert(USER_AGENT_HEADER, HeaderValue::from_static(USER_AGENT));
    Ok(headers)
}

/// Keeps the stored credential usable across runs.
#[derive(Clone)]
pub struct TokenManager {
    auth: AuthClient,
    store: CredentialStore,
    refresh_buffer_secs: i64,
}

impl TokenManager {
    pub fn new(auth: AuthClient, store: CredentialStore, refresh_buffer_secs: i64) -> Self {
        Self {
            auth,
            store,
            refresh_buffer_secs,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            AuthClient::new(config.token_endpoint.clone(), config.client_id.clone()),
            CredentialStore::new(config.tokens_file.clone()),
            config.refresh_buffer_secs,
        )
    }

    /// Load the credential, refreshing and persisting it if stale.
    pub async fn ensure_valid_credential(&self) -> Result<(HeaderMap, CredentialRecord)> {
        self.ensure_valid_credential_at(now_epoch_secs()).await
    }

    /// Same as [`Self::ensure_valid_credential`] with an explicit clock.
    pub async fn ensure_valid_credential_at(
        &self,
        now: i64,
    ) -> Result<(HeaderMap, CredentialRecord)> {
        let record = self.store.load()?;

        let record = if record.is_stale(now, self.refresh_buffer_secs) {
            tracing::info!(
                expires_at = record.expires_at,
                "Token is expired or expiring soon, refreshing"
            );
            self.refresh_and_persist(record, now).await?
        } else {
            tracing::info!(expires_at = record.expires_at, "Current access token is valid");
            record
        };

        let headers = auth_headers(&record)?;
        Ok((headers, record))
    }

    /// Refresh regardless of expiry. Used by the manual refresh command.
    pub async fn force_refresh(&self) -> Result<CredentialRecord> {
        let record = self.store.load()?;
        self.refresh_and_persist(record, now_epoch_secs()).await
    }

    async fn refresh_and_persist(
        &self,
        mut record: CredentialRecord,
        now: i64,
    ) -> Result<CredentialRecord> {
        let refresh_token = record
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                SyncError::RefreshFailed("no refresh token available".to_string())
            })?;

        let response = self.auth.refresh_token(&refresh_token).await?;

        if record.apply_refresh(response, now) {
            tracing::info!("Received new refresh token (token rotation active)");
        } else {
            tracing::info!("No new refresh token received, keeping existing one");
        }

        self.store.save(&record).map_err(|e| {
            SyncError::RefreshFailed(format!("refreshed token could not be saved: {:#}", e))
        })?;

        tracing::info!(expires_at = record.expires_at, "Token refreshed and saved");
        Ok(record)
    }
}
