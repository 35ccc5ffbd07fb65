// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resume point for incremental sync.

use crate::db::{TableProbe, WorkoutStore};

/// Newest stored workout start time, in epoch seconds.
///
/// Never fails: a missing table, an empty table, or any destination error
/// yields 0, which means "fetch the whole history". Re-fetching is safe
/// because the upsert replaces by key.
pub async fn resolve_watermark<S: WorkoutStore + ?Sized>(store: &mut S) -> i64 {
    match store.probe_table().await {
        TableProbe::Exists => {}
        TableProbe::Absent => {
            tracing::info!("Destination table does not exist, defaulting to full history");
            return 0;
        }
        TableProbe::ProbeFailed(reason) => {
            tracing::warn!(
                error = %reason,
                "Could not check destination table, defaulting to full history"
            );
            return 0;
        }
    }

    match store.max_start_time().await {
        Ok(Some(stored)) => match stored.to_epoch_secs() {
            Ok(secs) => {
                tracing::info!(watermark = secs, "Most recent workout in destination");
                secs.max(0)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Could not read max start time, defaulting to full history"
                );
                0
            }
        },
        Ok(None) => {
            tracing::info!("Destination table is empty, defaulting to full history");
            0
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Could not fetch max start time, defaulting to full history"
            );
            0
        }
    }
}
