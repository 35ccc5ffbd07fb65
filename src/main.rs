// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Peloton-Sync command line
//!
//! `sync` (the default) runs one incremental export and exits.
//! `refresh-token` forces a token refresh and validates the result.

use clap::{Parser, Subcommand};
use peloton_sync::config::Config;
use peloton_sync::services;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "peloton-sync", version, about = "Incremental Peloton workout export")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Fetch workouts newer than the destination's newest and upsert them
    Sync,
    /// Refresh the stored OAuth token now and validate it
    RefreshToken,
}

// One sync per process, every call awaited in order.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command.unwrap_or(Commands::Sync) {
        Commands::Sync => {
            tracing::info!("Initializing Peloton pipeline");
            match services::run(&config).await {
                Ok(summary) => {
                    tracing::info!(
                        user_id = %summary.user_id,
                        watermark = summary.watermark,
                        fetched = summary.fetched,
                        upserted = summary.upserted,
                        enrichment_failures = summary.enrichment_failures,
                        skipped = summary.skipped,
                        stop = ?summary.stop,
                        "Pipeline completed"
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        credential = e.is_fatal_credential_error(),
                        "Pipeline failed"
                    );
                    eprintln!("Error: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::RefreshToken => match services::refresh_credential(&config).await {
            Ok(profile) => {
                println!("Token refreshed and validated");
                println!("User ID: {}", profile.id);
                println!(
                    "Username: {}",
                    profile.username.as_deref().unwrap_or("Unknown")
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "Token refresh failed");
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
    }
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("peloton_sync=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
