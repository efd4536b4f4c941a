// src/services/core/ledger/operations.rs

//! Ledger operations over a loaded [`GuildRecord`].
//!
//! The caller holds the guild lock and owns the record for the whole
//! load-mutate-save cycle. Each operation validates everything first and only
//! then applies its mutation, so an `Err` always leaves the record untouched.
//! No I/O and no logging happens here.

use super::amount::AmountSpec;
use super::errors::{LedgerError, LedgerResult};
use super::outcome::{Flip, OutcomeSource};
use super::presence::Presence;
use crate::types::{member_key, GuildRecord, MemberId, MemberRecord, Standing};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reward rules applied by [`claim_reward`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimPolicy {
    pub cooldown_minutes: u32,
    pub min_reward: i64,
    pub max_reward: i64,
}

/// What happened in a wager, with balances after settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WagerOutcome {
    pub bet: i64,
    /// Flip from the actor's side
    pub result: Flip,
    pub actor: Standing,
    pub opponent: Option<Standing>,
}

impl WagerOutcome {
    pub fn actor_won(&self) -> bool {
        self.result == Flip::Win
    }

    /// `None` for a solo wager the actor lost.
    pub fn winner(&self) -> Option<&Standing> {
        match (self.result, &self.opponent) {
            (Flip::Win, _) => Some(&self.actor),
            (Flip::Loss, Some(opponent)) => Some(opponent),
            (Flip::Loss, None) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimOutcome {
    pub reward: i64,
    pub member: Standing,
    pub claimed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub amount: i64,
    pub sender: Standing,
    pub receiver: Standing,
}

/// Inserts a fresh member with `starting_coins`, zeroed counters and empty
/// pairwise maps. `last_claimed` is set to `claim_anchor`; pass
/// `now - cooldown` to make the member eligible for a reward straight away.
pub fn initialize_member<'a>(
    record: &'a mut GuildRecord,
    member_id: MemberId,
    display_name: &str,
    starting_coins: i64,
    claim_anchor: DateTime<Utc>,
) -> LedgerResult<&'a MemberRecord> {
    if record.contains_member(member_id) {
        return Err(LedgerError::MemberExists(member_id));
    }
    if starting_coins < 0 {
        return Err(LedgerError::InvalidAmount);
    }

    let member = MemberRecord::new(member_id, display_name, starting_coins, claim_anchor);
    let (index, _) = record.members.insert_full(member.key(), member);
    record
        .members
        .get_index(index)
        .map(|(_, member)| member)
        .ok_or(LedgerError::MemberNotFound(member_id))
}

/// Updates the display name. Returns `false`, touching nothing, when the name
/// is unchanged.
pub fn rename_member(
    record: &mut GuildRecord,
    member_id: MemberId,
    new_display_name: &str,
) -> LedgerResult<bool> {
    let member = record
        .member_mut(member_id)
        .ok_or(LedgerError::MemberNotFound(member_id))?;
    if member.display_name == new_display_name {
        return Ok(false);
    }
    member.display_name = new_display_name.to_string();
    Ok(true)
}

/// First present member, in insertion order, whose display name is exactly
/// `name`. Duplicate names resolve to the earliest stored member.
pub fn lookup_by_display_name<'a, P>(
    record: &'a GuildRecord,
    name: &str,
    presence: &P,
) -> Option<&'a MemberRecord>
where
    P: Presence + ?Sized,
{
    record
        .iter_members()
        .find(|member| member.display_name == name && presence.is_present(member.id))
}

/// Bets `amount` coins on a coin flip, alone or against a named opponent.
///
/// Solo: win adds the bet, loss removes it. Against an opponent the winner
/// takes the bet from the loser and the pairwise win/loss counters of both
/// members move together.
pub fn wager<P, O>(
    record: &mut GuildRecord,
    actor_id: MemberId,
    amount: &AmountSpec,
    opponent_name: Option<&str>,
    presence: &P,
    outcomes: &mut O,
) -> LedgerResult<WagerOutcome>
where
    P: Presence + ?Sized,
    O: OutcomeSource + ?Sized,
{
    let actor = record
        .member(actor_id)
        .ok_or(LedgerError::MemberNotFound(actor_id))?;
    let bet = amount.resolve(actor.coins)?;
    if bet > actor.coins {
        return Err(LedgerError::InsufficientFunds {
            name: actor.display_name.clone(),
            balance: actor.coins,
        });
    }

    let opponent_id = match opponent_name {
        None => None,
        Some(name) => {
            let opponent = lookup_by_display_name(record, name, presence)
                .filter(|opponent| opponent.id != actor_id)
                .ok_or(LedgerError::InvalidOpponent)?;
            if bet > opponent.coins {
                return Err(LedgerError::InsufficientFunds {
                    name: opponent.display_name.clone(),
                    balance: opponent.coins,
                });
            }
            Some(opponent.id)
        }
    };

    // Either side may end up credited with the bet.
    ensure_can_credit(member_or_missing(record, actor_id)?, bet)?;
    if let Some(opponent_id) = opponent_id {
        ensure_can_credit(member_or_missing(record, opponent_id)?, bet)?;
    }

    let result = outcomes.flip();
    match opponent_id {
        None => {
            let actor = member_or_missing_mut(record, actor_id)?;
            match result {
                Flip::Win => {
                    actor.coins += bet;
                    actor.wins += 1;
                }
                Flip::Loss => {
                    actor.coins -= bet;
                    actor.losses += 1;
                }
            }
        }
        Some(opponent_id) => {
            let (winner_id, loser_id) = match result {
                Flip::Win => (actor_id, opponent_id),
                Flip::Loss => (opponent_id, actor_id),
            };
            settle_head_to_head(record, winner_id, loser_id, bet)?;
        }
    }

    let actor = Standing::from(member_or_missing(record, actor_id)?);
    let opponent = match opponent_id {
        Some(id) => Some(Standing::from(member_or_missing(record, id)?)),
        None => None,
    };
    Ok(WagerOutcome {
        bet,
        result,
        actor,
        opponent,
    })
}

/// Credits a random reward in `[min_reward, max_reward]` once the cooldown
/// since the last claim has passed, and restarts the cooldown at `now`.
pub fn claim_reward<O>(
    record: &mut GuildRecord,
    actor_id: MemberId,
    now: DateTime<Utc>,
    policy: &ClaimPolicy,
    outcomes: &mut O,
) -> LedgerResult<ClaimOutcome>
where
    O: OutcomeSource + ?Sized,
{
    let member = record
        .member(actor_id)
        .ok_or(LedgerError::MemberNotFound(actor_id))?;
    if let Some(remaining_minutes) =
        crate::utils::time::minutes_remaining(member.last_claimed, now, policy.cooldown_minutes)
    {
        return Err(LedgerError::OnCooldown { remaining_minutes });
    }
    if policy.min_reward < 0 || policy.min_reward > policy.max_reward {
        return Err(LedgerError::InvalidAmount);
    }

    let reward = outcomes.draw(policy.min_reward, policy.max_reward);
    let credited = member
        .coins
        .checked_add(reward)
        .ok_or(LedgerError::InvalidAmount)?;

    let member = member_or_missing_mut(record, actor_id)?;
    member.coins = credited;
    member.last_claimed = now;
    Ok(ClaimOutcome {
        reward,
        member: Standing::from(&*member),
        claimed_at: now,
    })
}

/// Moves `amount` coins from the sender to the member named `receiver_name`,
/// keeping the signed pairwise history reciprocal.
pub fn transfer<P>(
    record: &mut GuildRecord,
    sender_id: MemberId,
    receiver_name: &str,
    amount: i64,
    presence: &P,
) -> LedgerResult<TransferOutcome>
where
    P: Presence + ?Sized,
{
    if amount < 1 {
        return Err(LedgerError::InvalidAmount);
    }
    let sender = record
        .member(sender_id)
        .ok_or(LedgerError::MemberNotFound(sender_id))?;
    if sender.coins < amount {
        return Err(LedgerError::InsufficientFunds {
            name: sender.display_name.clone(),
            balance: sender.coins,
        });
    }
    let receiver = lookup_by_display_name(record, receiver_name, presence)
        .filter(|receiver| receiver.id != sender_id)
        .ok_or(LedgerError::InvalidReceiver)?;
    let receiver_id = receiver.id;

    let receiver_coins = receiver
        .coins
        .checked_add(amount)
        .ok_or(LedgerError::InvalidAmount)?;
    let receiver_transfers = receiver
        .transfers
        .checked_sub(amount)
        .ok_or(LedgerError::InvalidAmount)?;
    let receiver_pair = receiver
        .net_transfer_with(sender_id)
        .checked_sub(amount)
        .ok_or(LedgerError::InvalidAmount)?;
    let sender = member_or_missing(record, sender_id)?;
    let sender_transfers = sender
        .transfers
        .checked_add(amount)
        .ok_or(LedgerError::InvalidAmount)?;
    let sender_pair = sender
        .net_transfer_with(receiver_id)
        .checked_add(amount)
        .ok_or(LedgerError::InvalidAmount)?;

    let sender = member_or_missing_mut(record, sender_id)?;
    sender.coins -= amount;
    sender.transfers = sender_transfers;
    sender
        .transfers_per_mem
        .insert(member_key(receiver_id), sender_pair);

    let receiver = member_or_missing_mut(record, receiver_id)?;
    receiver.coins = receiver_coins;
    receiver.transfers = receiver_transfers;
    receiver
        .transfers_per_mem
        .insert(member_key(sender_id), receiver_pair);

    Ok(TransferOutcome {
        amount,
        sender: Standing::from(member_or_missing(record, sender_id)?),
        receiver: Standing::from(member_or_missing(record, receiver_id)?),
    })
}

fn settle_head_to_head(
    record: &mut GuildRecord,
    winner_id: MemberId,
    loser_id: MemberId,
    bet: i64,
) -> LedgerResult<()> {
    let winner = member_or_missing_mut(record, winner_id)?;
    winner.coins += bet;
    winner.wins += 1;
    *winner.wins_per_mem.entry(member_key(loser_id)).or_insert(0) += 1;

    let loser = member_or_missing_mut(record, loser_id)?;
    loser.coins -= bet;
    loser.losses += 1;
    *loser.losses_per_mem.entry(member_key(winner_id)).or_insert(0) += 1;
    Ok(())
}

fn ensure_can_credit(member: &MemberRecord, amount: i64) -> LedgerResult<()> {
    member
        .coins
        .checked_add(amount)
        .map(|_| ())
        .ok_or(LedgerError::InvalidAmount)
}

fn member_or_missing(record: &GuildRecord, member_id: MemberId) -> LedgerResult<&MemberRecord> {
    record
        .member(member_id)
        .ok_or(LedgerError::MemberNotFound(member_id))
}

fn member_or_missing_mut(
    record: &mut GuildRecord,
    member_id: MemberId,
) -> LedgerResult<&mut MemberRecord> {
    record
        .member_mut(member_id)
        .ok_or(LedgerError::MemberNotFound(member_id))
}
