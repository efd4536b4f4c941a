// src/services/core/ledger/errors.rs

use crate::types::MemberId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which head-to-head history a query asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Score,
    Transfers,
}

impl HistoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryKind::Score => "score",
            HistoryKind::Transfers => "transfers",
        }
    }
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected, user-facing failures of ledger operations and queries.
///
/// Every operation returns one of these before touching the record, so a
/// failed call leaves the guild exactly as it was loaded. The `Display` text
/// is the reply the bot sends back to the channel.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerError {
    #[error("Please enter a valid amount")]
    InvalidAmount,

    #[error("Not enough coins. {name} only has {balance} coins")]
    InsufficientFunds { name: String, balance: i64 },

    #[error("Please enter a valid name")]
    InvalidName,

    /// Opponent name did not resolve to a present member other than the actor
    #[error("Please enter a valid name")]
    InvalidOpponent,

    /// Receiver name did not resolve to a present member other than the sender
    #[error("Please enter a valid name")]
    InvalidReceiver,

    #[error("Please enter a valid pair")]
    InvalidPair,

    #[error("Reward already claimed. Please wait another {}", format_minutes(.remaining_minutes))]
    OnCooldown { remaining_minutes: u64 },

    #[error("{first} has no {kind} yet with {second}")]
    NoSharedHistory {
        first: String,
        second: String,
        kind: HistoryKind,
    },

    #[error("Member {0} has no data in this guild")]
    MemberNotFound(MemberId),

    #[error("Member {0} already has data in this guild")]
    MemberExists(MemberId),
}

fn format_minutes(minutes: &u64) -> String {
    if *minutes == 1 {
        "1 min".to_string()
    } else {
        format!("{} mins", minutes)
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
