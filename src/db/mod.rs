// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Destination store layer.
//!
//! The sync only needs a narrow contract from the destination: probe for the
//! table, read the newest stored start time, and upsert a batch by key.

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::StoreError;
use crate::models::WorkoutRow;
use crate::time_utils::parse_timestamp_text;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Outcome of checking whether the destination table exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableProbe {
    Exists,
    Absent,
    /// The check itself failed; callers treat this like `Absent`.
    ProbeFailed(String),
}

/// `MAX(start_time)` as the driver handed it back.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredTimestamp {
    Native(DateTime<Utc>),
    Epoch(i64),
    Text(String),
}

impl StoredTimestamp {
    /// Normalize to epoch seconds.
    pub fn to_epoch_secs(&self) -> Result<i64, StoreError> {
        match self {
            StoredTimestamp::Native(dt) => Ok(dt.timestamp()),
            StoredTimestamp::Epoch(secs) => Ok(*secs),
            StoredTimestamp::Text(text) => parse_timestamp_text(text)
                .map(|dt| dt.timestamp())
                .ok_or_else(|| StoreError::Decode(format!("unrecognized timestamp {text:?}"))),
        }
    }
}

/// Read/write contract of the destination table.
///
/// Implementations own a single connection for the duration of a run.
#[async_trait]
pub trait WorkoutStore: Send {
    /// Check whether the destination table exists.
    async fn probe_table(&mut self) -> TableProbe;

    /// Newest stored start time, or `None` for an empty table.
    async fn max_start_time(&mut self) -> Result<Option<StoredTimestamp>, StoreError>;

    /// Replace-by-key write of `rows`. Returns the number of rows written.
    async fn upsert(&mut self, rows: &[WorkoutRow]) -> Result<usize, StoreError>;

    /// Release the connection. Further calls fail.
    async fn close(&mut self) -> Result<(), StoreError>;
}
