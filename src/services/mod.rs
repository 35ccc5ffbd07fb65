// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod credential_store;
pub mod fetcher;
pub mod peloton;
pub mod sync;
pub mod token;
pub mod watermark;

pub use credential_store::CredentialStore;
pub use fetcher::{fetch_since, FetchOutcome, StopReason};
pub use peloton::PelotonClient;
pub use sync::{refresh_credential, run, sync_into, SyncSummary};
pub use token::{AuthClient, TokenManager};
pub use watermark::resolve_watermark;
