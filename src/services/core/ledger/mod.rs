// src/services/core/ledger/mod.rs

//! Member ledger: pure, synchronous transformations of a loaded guild record.

pub mod amount;
pub mod errors;
pub mod operations;
pub mod outcome;
pub mod presence;
pub mod queries;

pub use amount::{parse_amount, AmountSpec};
pub use errors::{HistoryKind, LedgerError, LedgerResult};
pub use operations::{
    claim_reward, initialize_member, lookup_by_display_name, rename_member, transfer, wager,
    ClaimOutcome, ClaimPolicy, TransferOutcome, WagerOutcome,
};
pub use outcome::{FixedOutcomes, Flip, OutcomeSource, RandomOutcomes};
pub use presence::{Everyone, Presence, PresentIf};
pub use queries::{
    HeadToHead, LeaderboardEntry, LeaderboardKind, ScoreLine, TransferLine, TransferTotal,
};
