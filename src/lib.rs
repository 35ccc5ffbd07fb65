// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Peloton-Sync: incremental export of Peloton workouts
//!
//! This crate pulls workouts newer than the newest stored one, enriches each
//! with its workout and ride details, and upserts them into a destination
//! table. The OAuth credential is refreshed ahead of expiry and persisted
//! between runs.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;
