// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync orchestration.
//!
//! Handles the core workflow:
//! 1. Ensure a valid credential (refreshing and persisting if needed)
//! 2. Resolve the user ID
//! 3. Connect to the destination and resolve the watermark
//! 4. Fetch and enrich everything newer than the watermark
//! 5. Upsert the batch, then release the connection

use crate::config::Config;
use crate::db::{SqliteStore, WorkoutStore};
use crate::error::{Result, SyncError};
use crate::models::{UserProfile, WorkoutRow};
use crate::services::fetcher::{fetch_since, StopReason};
use crate::services::token::auth_headers;
use crate::services::watermark::resolve_watermark;
use crate::services::{PelotonClient, TokenManager};

/// What a completed run did.
#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub user_id: String,
    pub watermark: i64,
    pub fetched: usize,
    pub upserted: usize,
    pub enrichment_failures: usize,
    /// Fetched workouts that could not be turned into rows
    pub skipped: usize,
    pub stop: StopReason,
}

/// Run one sync against the configured API and destination.
pub async fn run(config: &Config) -> Result<SyncSummary> {
    let tokens = TokenManager::from_config(config);
    let (headers, _credential) = tokens.ensure_valid_credential().await?;

    let client = PelotonClient::new(&config.api_base, headers)?;
    let user_id = resolve_user_id(&client, config).await?;

    tracing::info!("Connecting to destination");
    let mut store = SqliteStore::connect(&config.destination_url, &config.destination_table)
        .await
        .map_err(|e| SyncError::DestinationConnectFailed(e.to_string()))?;

    let result = sync_into(&client, &user_id, &mut store).await;

    if let Err(e) = store.close().await {
        tracing::warn!(error = %e, "Failed to close destination connection");
    }
    result
}

/// Watermark, fetch and upsert against an already-open store.
///
/// Does not close `store`; the caller owns the connection.
pub async fn sync_into<S: WorkoutStore + ?Sized>(
    client: &PelotonClient,
    user_id: &str,
    store: &mut S,
) -> Result<SyncSummary> {
    let watermark = resolve_watermark(store).await;
    tracing::info!(watermark, "Fetching data newer than watermark");

    let outcome = fetch_since(client, user_id, watermark).await;
    let mut summary = SyncSummary {
        user_id: user_id.to_string(),
        watermark,
        fetched: outcome.workouts.len(),
        upserted: 0,
        enrichment_failures: outcome.enrichment_failures,
        skipped: 0,
        stop: outcome.stop,
    };

    if outcome.workouts.is_empty() {
        tracing::info!("No new workouts found");
        return Ok(summary);
    }

    tracing::info!(count = outcome.workouts.len(), "Transforming workouts");
    let rows: Vec<WorkoutRow> = outcome
        .workouts
        .iter()
        .filter_map(|record| match record.to_row() {
            Ok(row) => Some(row),
            Err(e) => {
                tracing::warn!(
                    workout_id = %record.id,
                    error = %e,
                    "Skipping unconvertible workout"
                );
                None
            }
        })
        .collect();
    summary.skipped = outcome.workouts.len() - rows.len();

    if rows.is_empty() {
        tracing::warn!(skipped = summary.skipped, "No convertible workouts to load");
        return Ok(summary);
    }

    tracing::info!("Performing upsert");
    summary.upserted = store.upsert(&rows).await.map_err(|e| {
        tracing::error!(error = %e, "Upsert failed");
        SyncError::Destination(e.to_string())
    })?;

    tracing::info!(records = summary.upserted, "Successfully loaded records");
    Ok(summary)
}

async fn resolve_user_id(client: &PelotonClient, config: &Config) -> Result<String> {
    if let Some(user_id) = &config.user_id {
        return Ok(user_id.clone());
    }
    let profile = client.me().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to get user info");
        SyncError::from(e)
    })?;
    tracing::info!(user_id = %profile.id, "Authenticated");
    Ok(profile.id)
}

/// Force a token refresh, persist it, and confirm the new token works.
pub async fn refresh_credential(config: &Config) -> Result<UserProfile> {
    let tokens = TokenManager::from_config(config);
    let record = tokens.force_refresh().await?;

    tracing::info!("Validating new token");
    let client = PelotonClient::new(&config.api_base, auth_headers(&record)?)?;
    client.validate().await.map_err(|e| {
        tracing::error!(error = %e, "Validation request failed");
        SyncError::from(e)
    })
}
