// src/services/mod.rs

// Core services organized by domain
pub mod core;

pub use core::economy::{EconomyConfig, EconomyService};
pub use core::infrastructure::{GuildLocks, JsonFileStore, MemoryRecordStore, RecordStore};
