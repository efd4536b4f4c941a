// src/lib.rs

//! Guild coin economy for chat bots.
//!
//! Each guild's ledger is one JSON record, loaded, mutated and saved under a
//! per-guild lock by [`EconomyService`]. The pure ledger operations live in
//! [`services::core::ledger`] and can be driven directly against a record.

pub mod services;
pub mod types;
pub mod utils;


pub use services::core::economy::{EconomyConfig, EconomyService, SyncReport};
pub use services::core::infrastructure::{
    GuildGuard, GuildLocks, JsonFileStore, MemoryRecordStore, RecordStore, StoreError,
};
pub use services::core::ledger::{LedgerError, LedgerResult};
pub use types::{Actor, GuildId, GuildMember, GuildRecord, MemberId, MemberRecord, Standing};
pub use utils::{EconomyError, EconomyResult, ErrorKind};
