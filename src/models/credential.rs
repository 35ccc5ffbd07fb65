// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth credential record as persisted in the tokens file.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Persisted OAuth credential.
///
/// Keys this crate does not know about are kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Opaque bearer token
    pub access_token: String,
    /// Authorization scheme, almost always "Bearer"
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Refresh token; rotation is optional per refresh
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Granted scopes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Absolute expiry, epoch seconds. Missing means already expired.
    #[serde(default)]
    pub expires_at: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CredentialRecord {
    /// Whether the token is expired or expires within `buffer_secs` of `now`.
    pub fn is_stale(&self, now: i64, buffer_secs: i64) -> bool {
        now >= self.expires_at.saturating_sub(buffer_secs)
    }

    /// `Authorization` header value.
    pub fn authorization_value(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// Merge a successful refresh response into this record.
    ///
    /// Returns true when the server rotated the refresh token.
    pub fn apply_refresh(&mut self, response: TokenRefreshResponse, now: i64) -> bool {
        self.access_token = response.access_token;
        if let Some(token_type) = response.token_type {
            self.token_type = token_type;
        }
        if response.scope.is_some() {
            self.scope = response.scope;
        }
        // No lifetime means "expires now": the next run refreshes again.
        self.expires_at = match response.expires_in {
            Some(secs) if secs != 0 => now.saturating_add(secs),
            _ => now,
        };
        match response.refresh_token.filter(|t| !t.is_empty()) {
            Some(rotated) => {
                self.refresh_token = Some(rotated);
                true
            }
            None => false,
        }
    }
}

/// Token refresh response from the OAuth endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}
