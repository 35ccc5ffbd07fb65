// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout documents as returned by the API and as written to the destination.

use crate::time_utils::from_epoch_secs;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Payload key holding the primary workout detail document.
pub const WORKOUT_DETAILS_KEY: &str = "workout_details";
/// Payload key holding the ride detail document.
pub const RIDE_DETAILS_KEY: &str = "ride_details";

/// One page of `GET /api/user/{id}/workouts`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkoutPage {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub show_next: bool,
}

/// Authenticated user, from `GET /api/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// A workout pulled from the API, enriched in place.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutRecord {
    /// Remote workout ID (natural key at the destination)
    pub id: String,
    /// Start time, whole epoch seconds, as assigned by the API
    pub start_time: i64,
    /// Listing document plus `workout_details` / `ride_details`
    pub payload: Map<String, Value>,
    /// When this record was fetched
    pub fetched_at: DateTime<Utc>,
}

impl WorkoutRecord {
    /// Build a record from a listing item.
    ///
    /// Returns `None` if the item has no usable `id` or `start_time`.
    pub fn from_listing(item: Value, fetched_at: DateTime<Utc>) -> Option<Self> {
        let Value::Object(payload) = item else {
            return None;
        };
        let id = payload.get("id").and_then(value_as_id)?;
        let start_time = payload.get("start_time").and_then(value_as_epoch)?;
        Some(Self {
            id,
            start_time,
            payload,
            fetched_at,
        })
    }

    /// Whether this workout started strictly after `watermark`.
    ///
    /// Compares the listing's own value, so a fractional start time is never
    /// rounded down onto the watermark.
    pub fn is_after(&self, watermark: i64) -> bool {
        let exact = self
            .payload
            .get("start_time")
            .and_then(Value::as_f64)
            .unwrap_or(self.start_time as f64);
        exact > watermark as f64
    }

    pub fn workout_details(&self) -> Option<&Value> {
        self.payload.get(WORKOUT_DETAILS_KEY)
    }

    pub fn ride_details(&self) -> Option<&Value> {
        self.payload.get(RIDE_DETAILS_KEY)
    }

    /// Ride ID referenced by the attached workout detail, if any.
    pub fn ride_id(&self) -> Option<String> {
        self.workout_details()
            .and_then(|d| d.get("ride_id"))
            .and_then(value_as_id)
            .filter(|id| !id.is_empty())
    }

    /// Convert to a destination row.
    pub fn to_row(&self) -> Result<WorkoutRow, serde_json::Error> {
        let start_time = from_epoch_secs(self.start_time).ok_or_else(|| {
            <serde_json::Error as serde::ser::Error>::custom(format!(
                "start_time out of range: {}",
                self.start_time
            ))
        })?;
        Ok(WorkoutRow {
            workout_id: self.id.clone(),
            start_time,
            payload: serde_json::to_string(&self.payload)?,
            fetched_at: self.fetched_at,
        })
    }
}

/// Destination table row.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutRow {
    pub workout_id: String,
    pub start_time: DateTime<Utc>,
    /// Compact JSON of the enriched document
    pub payload: String,
    pub fetched_at: DateTime<Utc>,
}

/// IDs arrive as strings, but tolerate numbers.
fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_as_epoch(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.trunc() as i64))
}
