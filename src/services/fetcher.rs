// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Paginated, enriching walk of a user's workout history.
//!
//! The listing endpoint returns workouts newest first. The walk stops at the
//! first item at or before the watermark; an unsorted page would make it stop
//! early and miss newer items further down.

use crate::error::ApiError;
use crate::models::workout::{RIDE_DETAILS_KEY, WORKOUT_DETAILS_KEY};
use crate::models::WorkoutRecord;
use crate::services::PelotonClient;
use chrono::Utc;
use std::time::Instant;

/// Workouts requested per listing page.
pub const PAGE_SIZE: u32 = 100;

const PROGRESS_LOG_EVERY: usize = 10;

/// Why the walk ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Hit an item at or before the watermark
    WatermarkReached { start_time: i64 },
    /// Server said there are no further pages
    NoMorePages,
    /// A page came back with no items
    EmptyPage { page: u32 },
    /// A page request failed; earlier results are kept
    PageFetchTerminated { page: u32, reason: String },
}

/// Result of [`fetch_since`].
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Enriched workouts, newest first
    pub workouts: Vec<WorkoutRecord>,
    pub stop: StopReason,
    /// Items kept without some or all enrichment
    pub enrichment_failures: usize,
}

/// Fetch every workout strictly newer than `watermark`, newest first.
///
/// Page failures end the walk with the partial result; enrichment failures
/// keep the item without the missing detail.
pub async fn fetch_since(client: &PelotonClient, user_id: &str, watermark: i64) -> FetchOutcome {
    let started = Instant::now();
    let mut workouts = Vec::new();
    let mut enrichment_failures = 0;
    let mut page = 0;

    tracing::info!(user_id, watermark, "Fetching workouts");

    let stop = loop {
        tracing::info!(page, "Pulling page");

        let listing = match client.list_workouts(user_id, page, PAGE_SIZE).await {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!(page, error = %e, "Page fetch failed, keeping partial results");
                break StopReason::PageFetchTerminated {
                    page,
                    reason: e.to_string(),
                };
            }
        };

        if listing.data.is_empty() {
            break StopReason::EmptyPage { page };
        }

        let mut reached = None;
        for item in listing.data {
            let Some(mut record) = WorkoutRecord::from_listing(item, Utc::now()) else {
                tracing::warn!(page, "Skipping listing item without id or start_time");
                continue;
            };

            if !record.is_after(watermark) {
                tracing::info!(
                    start_time = record.start_time,
                    watermark,
                    "Reached watermark, stopping"
                );
                reached = Some(record.start_time);
                break;
            }

            if let Err(e) = enrich(client, &mut record).await {
                tracing::warn!(
                    workout_id = %record.id,
                    error = %e,
                    "Failed to fetch details for workout"
                );
                enrichment_failures += 1;
            }

            workouts.push(record);

            if workouts.len() % PROGRESS_LOG_EVERY == 0 {
                tracing::info!(
                    processed = workouts.len(),
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "Fetch progress"
                );
            }
        }

        if let Some(start_time) = reached {
            break StopReason::WatermarkReached { start_time };
        }
        if !listing.show_next {
            break StopReason::NoMorePages;
        }
        page += 1;
    };

    tracing::info!(
        fetched = workouts.len(),
        enrichment_failures,
        stop = ?stop,
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Fetch finished"
    );

    FetchOutcome {
        workouts,
        stop,
        enrichment_failures,
    }
}

/// Attach workout detail and, if referenced, ride detail.
///
/// Whatever was attached before a failure stays attached.
async fn enrich(client: &PelotonClient, record: &mut WorkoutRecord) -> Result<(), ApiError> {
    let details = client.workout_detail(&record.id).await?;
    record
        .payload
        .insert(WORKOUT_DETAILS_KEY.to_string(), details);

    if let Some(ride_id) = record.ride_id() {
        let ride = client.ride_detail(&ride_id).await?;
        record.payload.insert(RIDE_DETAILS_KEY.to_string(), ride);
    }
    Ok(())
}
