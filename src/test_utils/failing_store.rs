// src/test_utils/failing_store.rs

use crate::services::core::infrastructure::{
    MemoryRecordStore, RecordStore, StoreError, StoreResult,
};
use crate::types::{GuildId, GuildRecord};
use async_trait::async_trait;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

/// Memory store whose saves can be made to fail, for exercising I/O error paths.
#[derive(Debug, Default)]
pub struct FailingRecordStore {
    pub inner: MemoryRecordStore,
    fail_saves: AtomicBool,
}

impl FailingRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn simulate_save_failure(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for FailingRecordStore {
    async fn load(&self, guild_id: GuildId) -> StoreResult<GuildRecord> {
        self.inner.load(guild_id).await
    }

    async fn save(&self, guild_id: GuildId, record: &GuildRecord) -> StoreResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::Other,
                "simulated disk failure",
            )));
        }
        self.inner.save(guild_id, record).await
    }

    async fn exists(&self, guild_id: GuildId) -> StoreResult<bool> {
        self.inner.exists(guild_id).await
    }
}
