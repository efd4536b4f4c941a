// src/services/core/infrastructure/memory_store.rs

use super::json_file_store::{decode_record, encode_record};
use super::record_store::{check_key, RecordStore, StoreError, StoreResult};
use crate::types::{GuildId, GuildRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// In-process record store. Keeps the encoded JSON rather than the struct so
/// every load goes through the same serialization path as the file store.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    data: RwLock<HashMap<GuildId, Vec<u8>>>,
    load_count: AtomicU64,
    save_count: AtomicU64,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_count(&self) -> u64 {
        self.load_count.load(Ordering::Relaxed)
    }

    pub fn save_count(&self) -> u64 {
        self.save_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn load(&self, guild_id: GuildId) -> StoreResult<GuildRecord> {
        self.load_count.fetch_add(1, Ordering::Relaxed);
        let data = self.data.read().await;
        let bytes = data.get(&guild_id).ok_or(StoreError::NotFound(guild_id))?;
        decode_record(bytes)
    }

    async fn save(&self, guild_id: GuildId, record: &GuildRecord) -> StoreResult<()> {
        check_key(guild_id, record)?;
        let bytes = encode_record(record)?;
        self.data.write().await.insert(guild_id, bytes);
        self.save_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn exists(&self, guild_id: GuildId) -> StoreResult<bool> {
        Ok(self.data.read().await.contains_key(&guild_id))
    }
}
