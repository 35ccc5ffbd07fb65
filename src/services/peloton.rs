// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Peloton API client for the user profile, workout history and ride metadata.
//!
//! Only the profile validation call has a timeout; listing and detail calls
//! wait as long as the server takes.

use crate::error::{ApiError, SyncError};
use crate::models::{UserProfile, WorkoutPage};
use crate::services::token::TOKEN_REQUEST_TIMEOUT;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Authenticated Peloton API client.
#[derive(Clone)]
pub struct PelotonClient {
    http: reqwest::Client,
    base_url: String,
}

impl PelotonClient {
    /// Create a client that sends `headers` on every request.
    pub fn new(base_url: &str, headers: HeaderMap) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| SyncError::Internal(anyhow::anyhow!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the authenticated user.
    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        let url = format!("{}/api/me", self.base_url);
        self.get_json(&url, None).await
    }

    /// Check the current token against `/api/me` with a bounded wait.
    pub async fn validate(&self) -> Result<UserProfile, ApiError> {
        let url = format!("{}/api/me", self.base_url);
        self.get_json(&url, Some(TOKEN_REQUEST_TIMEOUT)).await
    }

    /// List one page of a user's workouts, newest first.
    pub async fn list_workouts(
        &self,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<WorkoutPage, ApiError> {
        let url = format!(
            "{}/api/user/{}/workouts?limit={}&page={}",
            self.base_url, user_id, limit, page
        );
        self.get_json(&url, None).await
    }

    /// Get a workout's detail document.
    ///
    /// When the workout references a ride, its ID is also copied to a
    /// top-level `ride_id` field.
    pub async fn workout_detail(&self, workout_id: &str) -> Result<Value, ApiError> {
        let url = format!("{}/api/workout/{}", self.base_url, workout_id);
        let mut details: Value = self.get_json(&url, None).await?;

        let ride_id = details.get("ride").and_then(|r| r.get("id")).cloned();
        if let (Some(ride_id), Some(obj)) = (ride_id, details.as_object_mut()) {
            obj.insert("ride_id".to_string(), ride_id);
        }
        Ok(details)
    }

    /// Get metadata for the ride (class) a workout was taken from.
    pub async fn ride_detail(&self, ride_id: &str) -> Result<Value, ApiError> {
        let url = format!("{}/api/ride/{}/details", self.base_url, ride_id);
        self.get_json(&url, None).await
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        timeout: Option<Duration>,
    ) -> Result<T, ApiError> {
        let mut request = self.http.get(url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;
        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 401 {
                tracing::warn!("Peloton API rejected the access token (401)");
            }
            return Err(ApiError::Http { status, body });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
