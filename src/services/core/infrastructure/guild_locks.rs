// src/services/core/infrastructure/guild_locks.rs

//! Per-guild mutual exclusion.
//!
//! Each guild gets its own async mutex, created on first use. The table
//! itself sits behind one registry-wide mutex so that two first-time
//! acquirers for the same guild always end up sharing a single lock.

use crate::types::GuildId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of guild locks. Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct GuildLocks {
    table: Arc<Mutex<HashMap<GuildId, Arc<Mutex<()>>>>>,
}

/// Exclusive access to one guild's record; released on drop.
#[derive(Debug)]
pub struct GuildGuard {
    guild_id: GuildId,
    _guard: OwnedMutexGuard<()>,
}

impl GuildGuard {
    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }
}

impl GuildLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates locks for guilds known at startup.
    pub async fn preload(&self, guild_ids: impl IntoIterator<Item = GuildId>) {
        let mut table = self.table.lock().await;
        for guild_id in guild_ids {
            table.entry(guild_id).or_default();
        }
    }

    /// Waits until no one else holds `guild_id`. Other guilds are unaffected.
    pub async fn acquire(&self, guild_id: GuildId) -> GuildGuard {
        let lock = self.lock_for(guild_id).await;
        let guard = lock.lock_owned().await;
        log::trace!("Acquired lock for guild {}", guild_id);
        GuildGuard {
            guild_id,
            _guard: guard,
        }
    }

    /// Non-blocking variant of [`GuildLocks::acquire`].
    pub async fn try_acquire(&self, guild_id: GuildId) -> Option<GuildGuard> {
        let lock = self.lock_for(guild_id).await;
        lock.try_lock_owned().ok().map(|guard| GuildGuard {
            guild_id,
            _guard: guard,
        })
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.lock().await.is_empty()
    }

    async fn lock_for(&self, guild_id: GuildId) -> Arc<Mutex<()>> {
        let mut table = self.table.lock().await;
        table.entry(guild_id).or_default().clone()
    }
}
