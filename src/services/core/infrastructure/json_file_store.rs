// src/services/core/infrastructure/json_file_store.rs

//! One indented JSON file per guild, named `<guild_id>.json`.
//!
//! Each save writes a sibling temp file of its own (`<guild_id>.json.<pid>-<seq>.tmp`)
//! and renames it over the target, so readers see either the old or the new
//! record, never a torn one, and overlapping saves never share a temp file.

use super::record_store::{
    check_key, check_member_keys, RecordStore, StoreError, StoreResult,
};
use crate::types::{GuildId, GuildRecord};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

const INDENT: &[u8] = b"    ";

static SAVE_SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Creates the data directory if needed.
    pub async fn open(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self::new(data_dir);
        tokio::fs::create_dir_all(&store.data_dir).await?;
        Ok(store)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_for(&self, guild_id: GuildId) -> PathBuf {
        self.data_dir.join(format!("{}.json", guild_id))
    }

    fn temp_path_for(&self, guild_id: GuildId) -> PathBuf {
        let seq = SAVE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        self.data_dir
            .join(format!("{}.json.{}-{}.tmp", guild_id, std::process::id(), seq))
    }
}

/// Serializes with four-space indentation, fields in declaration order and
/// members in insertion order.
pub fn encode_record(record: &GuildRecord) -> StoreResult<Vec<u8>> {
    let mut bytes = Vec::new();
    let formatter = PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
    record.serialize(&mut serializer)?;
    Ok(bytes)
}

/// Parses a stored document and rejects members filed under another id's key.
pub fn decode_record(bytes: &[u8]) -> StoreResult<GuildRecord> {
    let record: GuildRecord = serde_json::from_slice(bytes)?;
    check_member_keys(&record)?;
    Ok(record)
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn load(&self, guild_id: GuildId) -> StoreResult<GuildRecord> {
        let path = self.path_for(guild_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(guild_id));
            }
            Err(e) => return Err(e.into()),
        };
        let record = decode_record(&bytes)?;
        check_key(guild_id, &record)?;
        log::debug!(
            "Loaded guild {} with {} members from {}",
            guild_id,
            record.member_count(),
            path.display()
        );
        Ok(record)
    }

    async fn save(&self, guild_id: GuildId, record: &GuildRecord) -> StoreResult<()> {
        check_key(guild_id, record)?;
        let bytes = encode_record(record)?;
        let path = self.path_for(guild_id);
        let temp_path = self.temp_path_for(guild_id);

        tokio::fs::create_dir_all(&self.data_dir).await?;
        let written = match tokio::fs::write(&temp_path, &bytes).await {
            Ok(()) => tokio::fs::rename(&temp_path, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            crate::log_warn!(
                "Failed to write guild record",
                serde_json::json!({
                    "guild_id": guild_id,
                    "temp_path": temp_path.display().to_string(),
                    "error": e.to_string(),
                })
            );
            tokio::fs::remove_file(&temp_path).await.ok();
            return Err(e.into());
        }
        log::debug!("Saved guild {} ({} bytes)", guild_id, bytes.len());
        Ok(())
    }

    async fn exists(&self, guild_id: GuildId) -> StoreResult<bool> {
        Ok(tokio::fs::try_exists(self.path_for(guild_id)).await?)
    }
}
