// src/services/core/infrastructure/mod.rs

//! Infrastructure Services Module
//!
//! Persistence and coordination underneath the ledger:
//! - **Record stores** - `RecordStore` trait with JSON-file and in-memory backends
//! - **Guild locks** - per-guild async mutexes serializing load-mutate-save cycles

pub mod guild_locks;
pub mod json_file_store;
pub mod memory_store;
pub mod record_store;

pub use guild_locks::{GuildGuard, GuildLocks};
pub use json_file_store::JsonFileStore;
pub use memory_store::MemoryRecordStore;
pub use record_store::{RecordStore, StoreError, StoreResult};
