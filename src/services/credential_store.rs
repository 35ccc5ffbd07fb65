// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON file persistence for the OAuth credential.

use crate::error::SyncError;
use crate::models::CredentialRecord;
use anyhow::Context;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Reads and writes the credential record at a fixed path.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Load the record. A missing or malformed file is fatal.
    pub fn load(&self) -> Result<CredentialRecord, SyncError> {
        let data = fs::read_to_string(&self.path).map_err(|e| {
            SyncError::CredentialUnavailable(format!(
                "cannot read tokens file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let record: CredentialRecord = serde_json::from_str(&data).map_err(|e| {
            SyncError::CredentialUnavailable(format!(
                "failed to parse tokens file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::info!(path = %self.path.display(), "Loaded existing tokens");
        Ok(record)
    }

    /// Write the record, replacing the file atomically.
    pub fn save(&self, record: &CredentialRecord) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(record).context("serialize tokens")?;

        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "tokens.json".into());
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        {
            let mut file = open_private(&tmp_path)
                .with_context(|| format!("create {}", tmp_path.display()))?;
            file.write_all(json.as_bytes())
                .and_then(|_| file.sync_all())
                .with_context(|| format!("write {}", tmp_path.display()))?;
        }

        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("replace {}", self.path.display()))?;

        tracing::info!(path = %self.path.display(), "Updated tokens file");
        Ok(())
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::File::create(path)
}
