// src/services/core/economy/mod.rs

//! Economy Service
//!
//! The entry point command and event handlers call. Every operation runs as
//! one critical section on the guild's lock:
//!
//! 1. acquire the guild lock
//! 2. load the record
//! 3. provision the invoking member if needed
//! 4. apply one ledger operation or query
//! 5. save if anything changed
//!
//! Nothing between the load and the save awaits, so a record is never read
//! for a mutation without the lock held across the full cycle. The save runs
//! on a spawned task that takes over the guard: once a mutation has been
//! applied, the guild stays locked until the write lands, even if the caller
//! drops the command future.

pub mod config;

pub use config::EconomyConfig;

use crate::services::core::infrastructure::{GuildGuard, GuildLocks, RecordStore};
use crate::services::core::ledger::{
    self, queries, AmountSpec, ClaimOutcome, HeadToHead, LeaderboardEntry, LeaderboardKind,
    LedgerError, LedgerResult, OutcomeSource, Presence, RandomOutcomes, ScoreLine, TransferLine,
    TransferOutcome, TransferTotal, WagerOutcome,
};
use crate::types::{Actor, GuildId, GuildMember, GuildRecord, MemberId, Standing};
use crate::utils::error::{EconomyError, EconomyResult};
use crate::utils::time::{Clock, SystemClock};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type SharedOutcomes = Arc<Mutex<Box<dyn OutcomeSource + Send>>>;

/// What a guild sync changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// The guild had no stored record before this sync
    pub created: bool,
    pub guild_renamed: bool,
    pub added: Vec<MemberId>,
    pub renamed: Vec<MemberId>,
}

impl SyncReport {
    pub fn changed(&self) -> bool {
        self.created || self.guild_renamed || !self.added.is_empty() || !self.renamed.is_empty()
    }
}

pub struct EconomyService<S> {
    store: Arc<S>,
    locks: GuildLocks,
    config: EconomyConfig,
    outcomes: SharedOutcomes,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for EconomyService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locks: self.locks.clone(),
            config: self.config.clone(),
            outcomes: Arc::clone(&self.outcomes),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: RecordStore + 'static> EconomyService<S> {
    pub fn new(store: Arc<S>, config: EconomyConfig) -> Self {
        Self {
            store,
            locks: GuildLocks::new(),
            config,
            outcomes: Arc::new(Mutex::new(Box::new(RandomOutcomes::from_entropy()))),
            clock: Arc::new(SystemClock::new()),
        }
    }

    /// Shares an existing lock registry, e.g. one preloaded at startup.
    pub fn with_locks(mut self, locks: GuildLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn with_outcomes<O>(mut self, outcomes: O) -> Self
    where
        O: OutcomeSource + Send + 'static,
    {
        self.outcomes = Arc::new(Mutex::new(Box::new(outcomes)));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn locks(&self) -> &GuildLocks {
        &self.locks
    }

    // ============= LOCKED RECORD ACCESS =============

    /// Exclusive access to one guild. Handlers composing their own
    /// load-mutate-save sequence hold this guard for the whole sequence.
    pub async fn acquire_guild_lock(&self, guild_id: GuildId) -> GuildGuard {
        self.locks.acquire(guild_id).await
    }

    pub async fn load_record(&self, guard: &GuildGuard) -> EconomyResult<GuildRecord> {
        Ok(self.store.load(guard.guild_id()).await?)
    }

    pub async fn save_record(&self, guard: &GuildGuard, record: &GuildRecord) -> EconomyResult<()> {
        Ok(self.store.save(guard.guild_id(), record).await?)
    }

    // ============= MEMBERSHIP =============

    /// Brings the stored record in line with the guild: creates it if absent,
    /// otherwise updates the guild name, adds unseen members and refreshes
    /// display names. Bots are skipped. Existing balances are never reset.
    pub async fn sync_guild(
        &self,
        guild_id: GuildId,
        guild_name: &str,
        members: &[GuildMember],
    ) -> EconomyResult<SyncReport> {
        let guard = self.acquire_guild_lock(guild_id).await;
        let mut report = SyncReport::default();
        let mut record = if self.store.exists(guild_id).await? {
            self.load_record(&guard).await?
        } else {
            report.created = true;
            GuildRecord::new(guild_id, guild_name)
        };

        if record.guild_name != guild_name {
            record.guild_name = guild_name.to_string();
            report.guild_renamed = true;
        }

        let anchor = self.claim_anchor();
        for member in members.iter().filter(|member| !member.is_bot) {
            if record.contains_member(member.id) {
                if ledger::rename_member(&mut record, member.id, &member.display_name)? {
                    report.renamed.push(member.id);
                }
            } else {
                ledger::initialize_member(
                    &mut record,
                    member.id,
                    &member.display_name,
                    self.config.initial_coins,
                    anchor,
                )?;
                report.added.push(member.id);
            }
        }

        let member_count = record.member_count();
        if report.changed() {
            self.persist(guard, record).await?;
        }
        if report.created {
            crate::log_info!(
                "Created guild record",
                serde_json::json!({
                    "guild_id": guild_id,
                    "guild_name": guild_name,
                    "members": member_count,
                })
            );
        } else {
            crate::log_debug!(
                "Synced guild record",
                serde_json::json!({
                    "guild_id": guild_id,
                    "added": report.added.len(),
                    "renamed": report.renamed.len(),
                })
            );
        }
        Ok(report)
    }

    /// Returns `false` when the stored name already matches.
    pub async fn rename_guild(&self, guild_id: GuildId, guild_name: &str) -> EconomyResult<bool> {
        self.run(guild_id, None, |record| {
            if record.guild_name == guild_name {
                return Ok((false, false));
            }
            record.guild_name = guild_name.to_string();
            Ok((true, true))
        })
        .await
    }

    /// Adds a joining member, or refreshes the display name of one who was
    /// here before. Returns `true` when a new ledger entry was created.
    pub async fn member_joined(&self, guild_id: GuildId, member: &GuildMember) -> EconomyResult<bool> {
        if member.is_bot {
            return Ok(false);
        }
        let anchor = self.claim_anchor();
        let initial_coins = self.config.initial_coins;
        let added = self
            .run(guild_id, None, |record| {
                if record.contains_member(member.id) {
                    let renamed = ledger::rename_member(record, member.id, &member.display_name)?;
                    return Ok((false, renamed));
                }
                ledger::initialize_member(
                    record,
                    member.id,
                    &member.display_name,
                    initial_coins,
                    anchor,
                )?;
                Ok((true, true))
            })
            .await?;
        if added {
            crate::log_info!(
                "Member joined the ledger",
                serde_json::json!({ "guild_id": guild_id, "member_id": member.id })
            );
        }
        Ok(added)
    }

    pub async fn member_renamed(
        &self,
        guild_id: GuildId,
        member_id: MemberId,
        display_name: &str,
    ) -> EconomyResult<bool> {
        self.run(guild_id, None, |record| {
            let renamed = ledger::rename_member(record, member_id, display_name)?;
            Ok((renamed, renamed))
        })
        .await
    }

    // ============= LEDGER COMMANDS =============

    /// Coin-flip wager. `amount` is an integer or `"all"`.
    pub async fn gamble<P>(
        &self,
        guild_id: GuildId,
        actor: &Actor,
        amount: &str,
        opponent_name: Option<&str>,
        presence: &P,
    ) -> EconomyResult<WagerOutcome>
    where
        P: Presence + Sync + ?Sized,
    {
        let amount: AmountSpec = amount.parse()?;
        self.place_wager(guild_id, actor, amount, opponent_name, presence)
            .await
    }

    /// Solo wager of the whole balance.
    pub async fn yolo(&self, guild_id: GuildId, actor: &Actor) -> EconomyResult<WagerOutcome> {
        self.place_wager(guild_id, actor, AmountSpec::All, None, &ledger::Everyone)
            .await
    }

    pub async fn claim(&self, guild_id: GuildId, actor: &Actor) -> EconomyResult<ClaimOutcome> {
        let policy = self.config.claim_policy();
        self.run(guild_id, Some(actor), |record| {
            let now = self.clock.now();
            let mut outcomes = self.lock_outcomes();
            ledger::claim_reward(record, actor.id, now, &policy, &mut **outcomes)
                .map(|outcome| (outcome, true))
        })
        .await
    }

    pub async fn send<P>(
        &self,
        guild_id: GuildId,
        actor: &Actor,
        amount: &str,
        receiver_name: &str,
        presence: &P,
    ) -> EconomyResult<TransferOutcome>
    where
        P: Presence + Sync + ?Sized,
    {
        let amount = ledger::parse_amount(amount)?;
        self.run(guild_id, Some(actor), |record| {
            ledger::transfer(record, actor.id, receiver_name, amount, presence)
                .map(|outcome| (outcome, true))
        })
        .await
    }

    // ============= QUERIES =============

    pub async fn wallet<P>(
        &self,
        guild_id: GuildId,
        actor: &Actor,
        name: Option<&str>,
        presence: &P,
    ) -> EconomyResult<Standing>
    where
        P: Presence + Sync + ?Sized,
    {
        self.query(guild_id, actor, |record| {
            queries::wallet(record, actor.id, name, presence)
        })
        .await
    }

    pub async fn wallets<P>(
        &self,
        guild_id: GuildId,
        actor: &Actor,
        presence: &P,
    ) -> EconomyResult<Vec<Standing>>
    where
        P: Presence + Sync + ?Sized,
    {
        self.query(guild_id, actor, |record| Ok(queries::wallets(record, presence)))
            .await
    }

    pub async fn score<P>(
        &self,
        guild_id: GuildId,
        actor: &Actor,
        name: Option<&str>,
        presence: &P,
    ) -> EconomyResult<ScoreLine>
    where
        P: Presence + Sync + ?Sized,
    {
        self.query(guild_id, actor, |record| {
            queries::score(record, actor.id, name, presence)
        })
        .await
    }

    pub async fn scores<P>(
        &self,
        guild_id: GuildId,
        actor: &Actor,
        presence: &P,
    ) -> EconomyResult<Vec<ScoreLine>>
    where
        P: Presence + Sync + ?Sized,
    {
        self.query(guild_id, actor, |record| Ok(queries::scores(record, presence)))
            .await
    }

    pub async fn head_to_head<P>(
        &self,
        guild_id: GuildId,
        actor: &Actor,
        name: Option<&str>,
        opponent_name: &str,
        presence: &P,
    ) -> EconomyResult<HeadToHead>
    where
        P: Presence + Sync + ?Sized,
    {
        self.query(guild_id, actor, |record| {
            queries::head_to_head(record, actor.id, name, opponent_name, presence)
        })
        .await
    }

    pub async fn head_to_head_all<P>(
        &self,
        guild_id: GuildId,
        actor: &Actor,
        name: Option<&str>,
        presence: &P,
    ) -> EconomyResult<Vec<HeadToHead>>
    where
        P: Presence + Sync + ?Sized,
    {
        self.query(guild_id, actor, |record| {
            queries::head_to_head_all(record, actor.id, name, presence)
        })
        .await
    }

    pub async fn transfer_total<P>(
        &self,
        guild_id: GuildId,
        actor: &Actor,
        name: Option<&str>,
        presence: &P,
    ) -> EconomyResult<TransferTotal>
    where
        P: Presence + Sync + ?Sized,
    {
        self.query(guild_id, actor, |record| {
            queries::transfer_total(record, actor.id, name, presence)
        })
        .await
    }

    pub async fn transfer_totals<P>(
        &self,
        guild_id: GuildId,
        actor: &Actor,
        presence: &P,
    ) -> EconomyResult<Vec<TransferTotal>>
    where
        P: Presence + Sync + ?Sized,
    {
        self.query(guild_id, actor, |record| {
            Ok(queries::transfer_totals(record, presence))
        })
        .await
    }

    pub async fn transfers_with<P>(
        &self,
        guild_id: GuildId,
        actor: &Actor,
        name: Option<&str>,
        counterpart_name: &str,
        presence: &P,
    ) -> EconomyResult<TransferLine>
    where
        P: Presence + Sync + ?Sized,
    {
        self.query(guild_id, actor, |record| {
            queries::transfers_with(record, actor.id, name, counterpart_name, presence)
        })
        .await
    }

    pub async fn transfer_history<P>(
        &self,
        guild_id: GuildId,
        actor: &Actor,
        name: Option<&str>,
        presence: &P,
    ) -> EconomyResult<Vec<TransferLine>>
    where
        P: Presence + Sync + ?Sized,
    {
        self.query(guild_id, actor, |record| {
            queries::transfer_history(record, actor.id, name, presence)
        })
        .await
    }

    pub async fn leaderboard<P>(
        &self,
        guild_id: GuildId,
        actor: &Actor,
        kind: LeaderboardKind,
        limit: usize,
        presence: &P,
    ) -> EconomyResult<Vec<LeaderboardEntry>>
    where
        P: Presence + Sync + ?Sized,
    {
        self.query(guild_id, actor, |record| {
            Ok(queries::leaderboard(record, kind, limit, presence))
        })
        .await
    }

    // ============= INTERNALS =============

    async fn place_wager<P>(
        &self,
        guild_id: GuildId,
        actor: &Actor,
        amount: AmountSpec,
        opponent_name: Option<&str>,
        presence: &P,
    ) -> EconomyResult<WagerOutcome>
    where
        P: Presence + Sync + ?Sized,
    {
        self.run(guild_id, Some(actor), |record| {
            let mut outcomes = self.lock_outcomes();
            ledger::wager(
                record,
                actor.id,
                &amount,
                opponent_name,
                presence,
                &mut **outcomes,
            )
            .map(|outcome| (outcome, true))
        })
        .await
    }

    async fn query<T, F>(&self, guild_id: GuildId, actor: &Actor, op: F) -> EconomyResult<T>
    where
        F: FnOnce(&GuildRecord) -> LedgerResult<T> + Send,
    {
        self.run(guild_id, Some(actor), |record| {
            op(record).map(|value| (value, false))
        })
        .await
    }

    /// Locked load, provision, apply, save. `op` reports whether it changed
    /// the record. A member provisioned here is saved even if `op` fails.
    async fn run<T, F>(&self, guild_id: GuildId, actor: Option<&Actor>, op: F) -> EconomyResult<T>
    where
        F: FnOnce(&mut GuildRecord) -> LedgerResult<(T, bool)> + Send,
    {
        let guard = self.acquire_guild_lock(guild_id).await;
        let mut record = self.load_record(&guard).await?;

        let provisioned = match actor {
            Some(actor) => self.provision(&mut record, actor)?,
            None => false,
        };
        let result = op(&mut record);
        let changed = matches!(result, Ok((_, true)));

        if provisioned || changed {
            if let Err(err) = self.persist(guard, record).await {
                crate::log_error!(
                    "Failed to save guild record",
                    serde_json::json!({ "guild_id": guild_id, "error": err.message })
                );
                return Err(err);
            }
        }
        if provisioned {
            if let Some(actor) = actor {
                crate::log_info!(
                    "Provisioned member on first command",
                    serde_json::json!({ "guild_id": guild_id, "member_id": actor.id })
                );
            }
        }
        Ok(result.map(|(value, _)| value)?)
    }

    /// Saves on a spawned task that owns `guard`. Dropping the returned future
    /// does not stop the write, and the guild is released only after it ends.
    async fn persist(&self, guard: GuildGuard, record: GuildRecord) -> EconomyResult<()> {
        let store = Arc::clone(&self.store);
        let save = tokio::spawn(async move {
            let result = store.save(guard.guild_id(), &record).await;
            drop(guard);
            result
        });
        match save.await {
            Ok(result) => Ok(result?),
            Err(e) => Err(EconomyError::internal_error(format!(
                "Save task did not complete: {}",
                e
            ))),
        }
    }

    fn provision(&self, record: &mut GuildRecord, actor: &Actor) -> LedgerResult<bool> {
        if record.contains_member(actor.id) {
            return Ok(false);
        }
        if !self.config.auto_provision {
            return Err(LedgerError::MemberNotFound(actor.id));
        }
        ledger::initialize_member(
            record,
            actor.id,
            &actor.display_name,
            self.config.initial_coins,
            self.claim_anchor(),
        )?;
        Ok(true)
    }

    /// New members start with their cooldown already elapsed.
    fn claim_anchor(&self) -> DateTime<Utc> {
        self.clock.now() - Duration::minutes(i64::from(self.config.claim_cooldown_minutes))
    }

    fn lock_outcomes(&self) -> MutexGuard<'_, Box<dyn OutcomeSource + Send>> {
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
