// src/services/core/infrastructure/record_store.rs

use crate::types::{member_key, GuildId, GuildRecord, MemberId};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No record stored for guild {0}")]
    NotFound(GuildId),
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Record for guild {found} cannot be stored under guild {expected}")]
    Mismatch { expected: GuildId, found: GuildId },
    #[error("Member {found} of guild {guild_id} is filed under key {key:?}")]
    MemberKeyMismatch {
        guild_id: GuildId,
        key: String,
        found: MemberId,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence of one [`GuildRecord`] per guild.
///
/// Callers hold the guild's lock from `load` through `save`; implementations
/// only have to make a single `save` replace the previous version whole.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fails with [`StoreError::NotFound`] when the guild has never been stored.
    async fn load(&self, guild_id: GuildId) -> StoreResult<GuildRecord>;

    /// Overwrites the stored record. `record.guild_id` must equal `guild_id`.
    async fn save(&self, guild_id: GuildId, record: &GuildRecord) -> StoreResult<()>;

    async fn exists(&self, guild_id: GuildId) -> StoreResult<bool>;
}

/// Rejects a record whose embedded id disagrees with the key it is stored
/// under, or that holds a member keyed by something other than its own id.
pub(crate) fn check_key(expected: GuildId, record: &GuildRecord) -> StoreResult<()> {
    if record.guild_id != expected {
        return Err(StoreError::Mismatch {
            expected,
            found: record.guild_id,
        });
    }
    check_member_keys(record)
}

pub(crate) fn check_member_keys(record: &GuildRecord) -> StoreResult<()> {
    match record
        .members
        .iter()
        .find(|(key, member)| **key != member_key(member.id))
    {
        Some((key, member)) => Err(StoreError::MemberKeyMismatch {
            guild_id: record.guild_id,
            key: key.clone(),
            found: member.id,
        }),
        None => Ok(()),
    }
}
