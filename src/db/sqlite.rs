// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite destination store.
//!
//! Schema:
//! ```sql
//! CREATE TABLE workouts_raw (
//!   workout_id TEXT PRIMARY KEY,
//!   start_time TIMESTAMP NOT NULL,  -- RFC3339 UTC text
//!   payload    TEXT NOT NULL,       -- compact JSON
//!   fetched_at TIMESTAMP NOT NULL
//! )
//! ```
//!
//! Timestamps are written as `YYYY-MM-DDTHH:MM:SSZ` so that `MAX()` over the
//! text column orders chronologically.

use crate::db::{StoredTimestamp, TableProbe, WorkoutStore};
use crate::error::StoreError;
use crate::models::WorkoutRow;
use crate::time_utils::format_utc_rfc3339;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{ConnectOptions, Connection, Row};
use std::str::FromStr;

const STAGE_TABLE: &str = "stage_raw";

/// Destination store backed by a single SQLite connection.
pub struct SqliteStore {
    conn: Option<SqliteConnection>,
    table: String,
}

impl SqliteStore {
    /// Open the database at `url`, creating the file if needed.
    ///
    /// `table` must already be validated as a plain identifier.
    pub async fn connect(url: &str, table: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Connect(e.to_string()))?
            .create_if_missing(true);

        let conn = options
            .connect()
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;

        tracing::info!(table, "Connected to destination");

        Ok(Self {
            conn: Some(conn),
            table: table.to_string(),
        })
    }

    fn conn(&mut self) -> Result<&mut SqliteConnection, StoreError> {
        self.conn
            .as_mut()
            .ok_or_else(|| StoreError::Connect("connection already closed".to_string()))
    }

    // ─── Inspection ──────────────────────────────────────────────
    //
    // Read-only helpers for checking what a run wrote. Not used by the sync
    // itself; public so integration tests and callers can inspect the table.

    /// Number of rows in the destination table.
    pub async fn count_rows(&mut self) -> Result<i64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(self.conn()?)
            .await?;
        Ok(count)
    }

    /// Fetch one row by workout ID.
    pub async fn get_row(&mut self, workout_id: &str) -> Result<Option<WorkoutRow>, StoreError> {
        let sql = format!(
            "SELECT workout_id, start_time, payload, fetched_at FROM {} WHERE workout_id = ?",
            self.table
        );
        let row = sqlx::query(&sql)
            .bind(workout_id)
            .fetch_optional(self.conn()?)
            .await?;
        row.map(|r| decode_row(&r)).transpose()
    }
}

fn decode_row(row: &SqliteRow) -> Result<WorkoutRow, StoreError> {
    Ok(WorkoutRow {
        workout_id: row.try_get("workout_id")?,
        start_time: row.try_get("start_time")?,
        payload: row.try_get("payload")?,
        fetched_at: row.try_get("fetched_at")?,
    })
}

/// Decode an aggregate timestamp whichever way the value was stored.
fn decode_timestamp(row: &SqliteRow) -> Result<Option<StoredTimestamp>, StoreError> {
    if let Ok(value) = row.try_get::<Option<DateTime<Utc>>, _>(0) {
        return Ok(value.map(StoredTimestamp::Native));
    }
    if let Ok(value) = row.try_get::<Option<String>, _>(0) {
        return Ok(value.map(StoredTimestamp::Text));
    }
    row.try_get::<Option<i64>, _>(0)
        .map(|v| v.map(StoredTimestamp::Epoch))
        .map_err(|e| StoreError::Decode(e.to_string()))
}

#[async_trait]
impl WorkoutStore for SqliteStore {
    async fn probe_table(&mut self) -> TableProbe {
        let table = self.table.clone();
        let conn = match self.conn() {
            Ok(c) => c,
            Err(e) => return TableProbe::ProbeFailed(e.to_string()),
        };
        let result = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(&table)
        .fetch_one(conn)
        .await;

        match result {
            Ok(n) if n > 0 => TableProbe::Exists,
            Ok(_) => TableProbe::Absent,
            Err(e) => TableProbe::ProbeFailed(e.to_string()),
        }
    }

    async fn max_start_time(&mut self) -> Result<Option<StoredTimestamp>, StoreError> {
        let sql = format!("SELECT MAX(start_time) FROM {}", self.table);
        let row = sqlx::query(&sql).fetch_one(self.conn()?).await?;
        decode_timestamp(&row)
    }

    async fn upsert(&mut self, rows: &[WorkoutRow]) -> Result<usize, StoreError> {
        let table = self.table.clone();
        let mut tx = self.conn()?.begin().await?;

        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                workout_id TEXT PRIMARY KEY,
                start_time TIMESTAMP NOT NULL,
                payload TEXT NOT NULL,
                fetched_at TIMESTAMP NOT NULL
            )"
        ))
        .execute(&mut *tx)
        .await?;

        sqlx::query(&format!("DROP TABLE IF EXISTS temp.{STAGE_TABLE}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(
            "CREATE TEMP TABLE {STAGE_TABLE} (
                workout_id TEXT NOT NULL,
                start_time TIMESTAMP NOT NULL,
                payload TEXT NOT NULL,
                fetched_at TIMESTAMP NOT NULL
            )"
        ))
        .execute(&mut *tx)
        .await?;

        let stage_insert = format!(
            "INSERT INTO temp.{STAGE_TABLE} (workout_id, start_time, payload, fetched_at)
             VALUES (?, ?, ?, ?)"
        );
        for row in rows {
            sqlx::query(&stage_insert)
                .bind(&row.workout_id)
                .bind(format_utc_rfc3339(row.start_time))
                .bind(&row.payload)
                .bind(format_utc_rfc3339(row.fetched_at))
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(&format!(
            "DELETE FROM {table}
             WHERE workout_id IN (SELECT workout_id FROM temp.{STAGE_TABLE})"
        ))
        .execute(&mut *tx)
        .await?;

        // A key repeated within one batch keeps its last staged copy.
        let inserted = sqlx::query(&format!(
            "INSERT INTO {table} (workout_id, start_time, payload, fetched_at)
             SELECT workout_id, start_time, payload, fetched_at
             FROM temp.{STAGE_TABLE}
             WHERE rowid IN (
                 SELECT MAX(rowid) FROM temp.{STAGE_TABLE} GROUP BY workout_id
             )"
        ))
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query(&format!("DROP TABLE temp.{STAGE_TABLE}"))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(table = %table, rows = inserted, "Upsert complete");
        Ok(inserted as usize)
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        if let Some(conn) = self.conn.take() {
            conn.close().await?;
            tracing::debug!(table = %self.table, "Destination connection closed");
        }
        Ok(())
    }
}
