// src/types.rs

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Chat-platform guild (server) identifier
pub type GuildId = u64;
/// Chat-platform user identifier
pub type MemberId = u64;

/// Members keyed by the string form of their id, in first-contact order
pub type MemberMap = IndexMap<String, MemberRecord>;
/// Head-to-head win or loss counts keyed by counterpart id
pub type PairwiseCounts = IndexMap<String, u64>;
/// Signed net transfer amounts keyed by counterpart id
pub type PairwiseAmounts = IndexMap<String, i64>;

/// Key under which a member is stored in [`GuildRecord::members`] and in the
/// pairwise maps.
pub fn member_key(member_id: MemberId) -> String {
    member_id.to_string()
}

/// Everything persisted for one guild. One record per guild, one file per record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildRecord {
    pub guild_id: GuildId,
    pub guild_name: String,
    #[serde(default)]
    pub members: MemberMap,
}

impl GuildRecord {
    pub fn new(guild_id: GuildId, guild_name: impl Into<String>) -> Self {
        Self {
            guild_id,
            guild_name: guild_name.into(),
            members: MemberMap::new(),
        }
    }

    pub fn member(&self, member_id: MemberId) -> Option<&MemberRecord> {
        self.members.get(&member_key(member_id))
    }

    pub fn member_mut(&mut self, member_id: MemberId) -> Option<&mut MemberRecord> {
        self.members.get_mut(&member_key(member_id))
    }

    pub fn contains_member(&self, member_id: MemberId) -> bool {
        self.members.contains_key(&member_key(member_id))
    }

    /// Members in insertion order.
    pub fn iter_members(&self) -> impl Iterator<Item = &MemberRecord> {
        self.members.values()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Sum of every member's balance. Conserved by wagers between two members
    /// and by transfers.
    pub fn total_coins(&self) -> i64 {
        self.members.values().map(|member| member.coins).sum()
    }
}

/// Per-guild state of a single member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub id: MemberId,
    pub display_name: String,
    pub coins: i64,
    pub wins: u64,
    pub losses: u64,
    /// Net coins donated minus coins received
    pub transfers: i64,
    #[serde(with = "crate::utils::time::claim_timestamp")]
    pub last_claimed: DateTime<Utc>,
    #[serde(default)]
    pub wins_per_mem: PairwiseCounts,
    #[serde(default)]
    pub losses_per_mem: PairwiseCounts,
    #[serde(default)]
    pub transfers_per_mem: PairwiseAmounts,
}

impl MemberRecord {
    pub fn new(
        id: MemberId,
        display_name: impl Into<String>,
        coins: i64,
        last_claimed: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            coins,
            wins: 0,
            losses: 0,
            transfers: 0,
            last_claimed,
            wins_per_mem: PairwiseCounts::new(),
            losses_per_mem: PairwiseCounts::new(),
            transfers_per_mem: PairwiseAmounts::new(),
        }
    }

    pub fn key(&self) -> String {
        member_key(self.id)
    }

    /// `transfers` recomputed from the pairwise map; always equal to
    /// `transfers` on a consistent record.
    pub fn pairwise_transfer_sum(&self) -> i64 {
        self.transfers_per_mem.values().sum()
    }

    pub fn wins_against(&self, other: MemberId) -> u64 {
        self.wins_per_mem
            .get(&member_key(other))
            .copied()
            .unwrap_or_default()
    }

    pub fn losses_against(&self, other: MemberId) -> u64 {
        self.losses_per_mem
            .get(&member_key(other))
            .copied()
            .unwrap_or_default()
    }

    pub fn net_transfer_with(&self, other: MemberId) -> i64 {
        self.transfers_per_mem
            .get(&member_key(other))
            .copied()
            .unwrap_or_default()
    }
}

/// A guild member as reported by the chat platform on sync and join events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildMember {
    pub id: MemberId,
    pub display_name: String,
    #[serde(default)]
    pub is_bot: bool,
}

impl GuildMember {
    pub fn new(id: MemberId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            is_bot: false,
        }
    }

    pub fn bot(id: MemberId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            is_bot: true,
        }
    }
}

/// The member invoking a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: MemberId,
    pub display_name: String,
}

impl Actor {
    pub fn new(id: MemberId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

impl From<&GuildMember> for Actor {
    fn from(member: &GuildMember) -> Self {
        Self::new(member.id, member.display_name.clone())
    }
}

/// A member's id, name and balance at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub id: MemberId,
    pub display_name: String,
    pub coins: i64,
}

impl From<&MemberRecord> for Standing {
    fn from(member: &MemberRecord) -> Self {
        Self {
            id: member.id,
            display_name: member.display_name.clone(),
            coins: member.coins,
        }
    }
}
