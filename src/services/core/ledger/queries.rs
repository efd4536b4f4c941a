// src/services/core/ledger/queries.rs

//! Read-only projections behind the wallet, score, transfers and leaderboard
//! commands. Results are structured; rendering is left to the chat layer.

use super::errors::{HistoryKind, LedgerError, LedgerResult};
use super::operations::lookup_by_display_name;
use super::presence::Presence;
use crate::types::{GuildRecord, MemberId, MemberRecord, Standing};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Counterpart label used when a member has no history with anyone.
pub const OTHER_MEMBERS: &str = "other members";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLine {
    pub id: MemberId,
    pub display_name: String,
    pub wins: u64,
    pub losses: u64,
}

impl From<&MemberRecord> for ScoreLine {
    fn from(member: &MemberRecord) -> Self {
        Self {
            id: member.id,
            display_name: member.display_name.clone(),
            wins: member.wins,
            losses: member.losses,
        }
    }
}

/// `member`'s record against `opponent`: wins and losses from `member`'s side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHead {
    pub member_id: MemberId,
    pub member_name: String,
    pub opponent_id: MemberId,
    pub opponent_name: String,
    pub wins: u64,
    pub losses: u64,
}

/// Net coins a member has donated (positive) or received (negative).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTotal {
    pub id: MemberId,
    pub display_name: String,
    pub net: i64,
}

impl TransferTotal {
    pub fn donated(&self) -> Option<i64> {
        (self.net >= 0).then_some(self.net)
    }

    pub fn received(&self) -> Option<i64> {
        (self.net < 0).then_some(-self.net)
    }
}

/// Net transfer between `member` and one `counterpart`, from `member`'s side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLine {
    pub member_id: MemberId,
    pub member_name: String,
    pub counterpart_id: MemberId,
    pub counterpart_name: String,
    pub net: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardKind {
    Coins,
    Wins,
    Losses,
}

impl LeaderboardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardKind::Coins => "coins",
            LeaderboardKind::Wins => "wins",
            LeaderboardKind::Losses => "losses",
        }
    }

    fn value_of(&self, member: &MemberRecord) -> i64 {
        match self {
            LeaderboardKind::Coins => member.coins,
            LeaderboardKind::Wins => i64::try_from(member.wins).unwrap_or(i64::MAX),
            LeaderboardKind::Losses => i64::try_from(member.losses).unwrap_or(i64::MAX),
        }
    }
}

impl fmt::Display for LeaderboardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaderboardKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coins" | "wallet" | "balance" => Ok(LeaderboardKind::Coins),
            "wins" | "w" => Ok(LeaderboardKind::Wins),
            "losses" | "l" => Ok(LeaderboardKind::Losses),
            _ => Err(LedgerError::InvalidName),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub id: MemberId,
    pub display_name: String,
    pub value: i64,
}

/// Resolves the member a query is about: the named member if a name was
/// given, otherwise the actor.
pub fn resolve_member<'a, P>(
    record: &'a GuildRecord,
    actor_id: MemberId,
    name: Option<&str>,
    presence: &P,
) -> LedgerResult<&'a MemberRecord>
where
    P: Presence + ?Sized,
{
    match name {
        Some(name) => lookup_by_display_name(record, name, presence).ok_or(LedgerError::InvalidName),
        None => record
            .member(actor_id)
            .ok_or(LedgerError::MemberNotFound(actor_id)),
    }
}

pub fn wallet<P>(
    record: &GuildRecord,
    actor_id: MemberId,
    name: Option<&str>,
    presence: &P,
) -> LedgerResult<Standing>
where
    P: Presence + ?Sized,
{
    resolve_member(record, actor_id, name, presence).map(Standing::from)
}

/// Balances of every present member, in insertion order.
pub fn wallets<P>(record: &GuildRecord, presence: &P) -> Vec<Standing>
where
    P: Presence + ?Sized,
{
    present_members(record, presence).map(Standing::from).collect()
}

pub fn score<P>(
    record: &GuildRecord,
    actor_id: MemberId,
    name: Option<&str>,
    presence: &P,
) -> LedgerResult<ScoreLine>
where
    P: Presence + ?Sized,
{
    resolve_member(record, actor_id, name, presence).map(ScoreLine::from)
}

pub fn scores<P>(record: &GuildRecord, presence: &P) -> Vec<ScoreLine>
where
    P: Presence + ?Sized,
{
    present_members(record, presence).map(ScoreLine::from).collect()
}

/// Head-to-head score between the resolved member and `opponent_name`.
pub fn head_to_head<P>(
    record: &GuildRecord,
    actor_id: MemberId,
    name: Option<&str>,
    opponent_name: &str,
    presence: &P,
) -> LedgerResult<HeadToHead>
where
    P: Presence + ?Sized,
{
    let member = resolve_member(record, actor_id, name, presence)?;
    let opponent =
        lookup_by_display_name(record, opponent_name, presence).ok_or(LedgerError::InvalidName)?;
    if member.id == opponent.id {
        return Err(LedgerError::InvalidPair);
    }
    let key = opponent.key();
    if !member.wins_per_mem.contains_key(&key) && !member.losses_per_mem.contains_key(&key) {
        return Err(LedgerError::NoSharedHistory {
            first: member.display_name.clone(),
            second: opponent.display_name.clone(),
            kind: HistoryKind::Score,
        });
    }
    Ok(head_to_head_line(member, opponent))
}

/// One head-to-head line per member the resolved member has played against,
/// winners-map order first.
pub fn head_to_head_all<P>(
    record: &GuildRecord,
    actor_id: MemberId,
    name: Option<&str>,
    presence: &P,
) -> LedgerResult<Vec<HeadToHead>>
where
    P: Presence + ?Sized,
{
    let member = resolve_member(record, actor_id, name, presence)?;
    let counterparts = member.wins_per_mem.keys().chain(
        member
            .losses_per_mem
            .keys()
            .filter(|key| !member.wins_per_mem.contains_key(*key)),
    );
    let lines: Vec<HeadToHead> = counterparts
        .filter_map(|key| record.members.get(key))
        .map(|opponent| head_to_head_line(member, opponent))
        .collect();
    if lines.is_empty() {
        return Err(LedgerError::NoSharedHistory {
            first: member.display_name.clone(),
            second: OTHER_MEMBERS.to_string(),
            kind: HistoryKind::Score,
        });
    }
    Ok(lines)
}

pub fn transfer_total<P>(
    record: &GuildRecord,
    actor_id: MemberId,
    name: Option<&str>,
    presence: &P,
) -> LedgerResult<TransferTotal>
where
    P: Presence + ?Sized,
{
    resolve_member(record, actor_id, name, presence).map(transfer_total_of)
}

pub fn transfer_totals<P>(record: &GuildRecord, presence: &P) -> Vec<TransferTotal>
where
    P: Presence + ?Sized,
{
    present_members(record, presence)
        .map(transfer_total_of)
        .collect()
}

/// Net transfer between the resolved member and `counterpart_name`.
pub fn transfers_with<P>(
    record: &GuildRecord,
    actor_id: MemberId,
    name: Option<&str>,
    counterpart_name: &str,
    presence: &P,
) -> LedgerResult<TransferLine>
where
    P: Presence + ?Sized,
{
    let member = resolve_member(record, actor_id, name, presence)?;
    let counterpart = lookup_by_display_name(record, counterpart_name, presence)
        .ok_or(LedgerError::InvalidName)?;
    if member.id == counterpart.id {
        return Err(LedgerError::InvalidPair);
    }
    match member.transfers_per_mem.get(&counterpart.key()) {
        Some(net) => Ok(transfer_line(member, counterpart, *net)),
        None => Err(LedgerError::NoSharedHistory {
            first: member.display_name.clone(),
            second: counterpart.display_name.clone(),
            kind: HistoryKind::Transfers,
        }),
    }
}

/// Every counterpart the resolved member has exchanged coins with, in the
/// order the exchanges first happened.
pub fn transfer_history<P>(
    record: &GuildRecord,
    actor_id: MemberId,
    name: Option<&str>,
    presence: &P,
) -> LedgerResult<Vec<TransferLine>>
where
    P: Presence + ?Sized,
{
    let member = resolve_member(record, actor_id, name, presence)?;
    let lines: Vec<TransferLine> = member
        .transfers_per_mem
        .iter()
        .filter_map(|(key, net)| {
            record
                .members
                .get(key)
                .map(|counterpart| transfer_line(member, counterpart, *net))
        })
        .collect();
    if lines.is_empty() {
        return Err(LedgerError::NoSharedHistory {
            first: member.display_name.clone(),
            second: OTHER_MEMBERS.to_string(),
            kind: HistoryKind::Transfers,
        });
    }
    Ok(lines)
}

/// Present members ranked by `kind`, highest first; ties keep insertion order.
pub fn leaderboard<P>(
    record: &GuildRecord,
    kind: LeaderboardKind,
    limit: usize,
    presence: &P,
) -> Vec<LeaderboardEntry>
where
    P: Presence + ?Sized,
{
    let mut ranked: Vec<&MemberRecord> = present_members(record, presence).collect();
    // sort_by is stable
    ranked.sort_by(|a, b| kind.value_of(b).cmp(&kind.value_of(a)));
    ranked
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, member)| LeaderboardEntry {
            rank: index + 1,
            id: member.id,
            display_name: member.display_name.clone(),
            value: kind.value_of(member),
        })
        .collect()
}

fn present_members<'a, P>(
    record: &'a GuildRecord,
    presence: &'a P,
) -> impl Iterator<Item = &'a MemberRecord> + 'a
where
    P: Presence + ?Sized,
{
    record
        .iter_members()
        .filter(move |member| presence.is_present(member.id))
}

fn head_to_head_line(member: &MemberRecord, opponent: &MemberRecord) -> HeadToHead {
    HeadToHead {
        member_id: member.id,
        member_name: member.display_name.clone(),
        opponent_id: opponent.id,
        opponent_name: opponent.display_name.clone(),
        wins: member.wins_against(opponent.id),
        losses: member.losses_against(opponent.id),
    }
}

fn transfer_line(member: &MemberRecord, counterpart: &MemberRecord, net: i64) -> TransferLine {
    TransferLine {
        member_id: member.id,
        member_name: member.display_name.clone(),
        counterpart_id: counterpart.id,
        counterpart_name: counterpart.display_name.clone(),
        net,
    }
}

fn transfer_total_of(member: &MemberRecord) -> TransferTotal {
    TransferTotal {
        id: member.id,
        display_name: member.display_name.clone(),
        net: member.transfers,
    }
}
