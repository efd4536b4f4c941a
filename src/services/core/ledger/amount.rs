// src/services/core/ledger/amount.rs

use super::errors::{LedgerError, LedgerResult};
use std::str::FromStr;

/// Bet size as typed by the user: a literal or the whole balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountSpec {
    All,
    Exact(i64),
}

impl AmountSpec {
    /// Resolves against the current balance. Only positive results are valid bets.
    pub fn resolve(&self, balance: i64) -> LedgerResult<i64> {
        let bet = match self {
            AmountSpec::All => balance,
            AmountSpec::Exact(value) => *value,
        };
        if bet <= 0 {
            return Err(LedgerError::InvalidAmount);
        }
        Ok(bet)
    }
}

impl FromStr for AmountSpec {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(AmountSpec::All);
        }
        parse_amount(trimmed).map(AmountSpec::Exact)
    }
}

/// Parses a literal coin amount; anything that is not an integer is `InvalidAmount`.
pub fn parse_amount(raw: &str) -> LedgerResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| LedgerError::InvalidAmount)
}
