// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod credential;
pub mod workout;

pub use credential::{CredentialRecord, TokenRefreshResponse};
pub use workout::{UserProfile, WorkoutPage, WorkoutRecord, WorkoutRow};
