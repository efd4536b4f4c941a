// Economy Service Integration Tests
// Full command flows through the service against a JSON file store on disk

use chrono::{Duration, TimeZone, Utc};
use guild_economy::services::core::ledger::{
    Everyone, FixedOutcomes, Flip, LeaderboardKind, LedgerError,
};
use guild_economy::utils::error::DATA_NOT_FOUND_MESSAGE;
use guild_economy::utils::FixedClock;
use guild_economy::{
    Actor, EconomyConfig, EconomyService, ErrorKind, GuildMember, JsonFileStore, RecordStore,
};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_test::assert_ok;

const GUILD: u64 = 9001;

struct Harness {
    _dir: TempDir,
    store: Arc<JsonFileStore>,
    clock: Arc<FixedClock>,
    service: EconomyService<JsonFileStore>,
}

async fn harness(flip: Flip, reward: i64) -> anyhow::Result<Harness> {
    let dir = tempfile::tempdir()?;
    let config = EconomyConfig {
        data_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let store = Arc::new(JsonFileStore::open(&config.data_dir).await?);
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 20, 0, 0).unwrap(),
    ));
    let service = EconomyService::new(store.clone(), config)
        .with_outcomes(FixedOutcomes::always(flip).with_draw(reward))
        .with_clock(clock.clone());
    service
        .sync_guild(
            GUILD,
            "high rollers",
            &[
                GuildMember::new(1, "alice"),
                GuildMember::new(2, "bob"),
                GuildMember::bot(3, "croupier"),
            ],
        )
        .await?;
    Ok(Harness {
        _dir: dir,
        store,
        clock,
        service,
    })
}

fn alice() -> Actor {
    Actor::new(1, "alice")
}

fn bob() -> Actor {
    Actor::new(2, "bob")
}

#[tokio::test]
async fn test_sync_creates_file_without_bots() -> anyhow::Result<()> {
    let h = harness(Flip::Win, 100).await?;
    let record = h.store.load(GUILD).await?;

    assert_eq!(record.guild_name, "high rollers");
    assert_eq!(record.member_count(), 2);
    assert!(!record.contains_member(3));
    assert_eq!(record.member(1).unwrap().coins, 500);
    Ok(())
}

#[tokio::test]
async fn test_resync_adds_and_renames_without_resetting() -> anyhow::Result<()> {
    let h = harness(Flip::Win, 100).await?;
    h.service.send(GUILD, &alice(), "100", "bob", &Everyone).await?;

    let report = h
        .service
        .sync_guild(
            GUILD,
            "high rollers 2",
            &[
                GuildMember::new(1, "alice"),
                GuildMember::new(2, "bobby"),
                GuildMember::new(4, "dora"),
            ],
        )
        .await?;
    assert!(!report.created);
    assert!(report.guild_renamed);
    assert_eq!(report.added, vec![4]);
    assert_eq!(report.renamed, vec![2]);

    let record = h.store.load(GUILD).await?;
    assert_eq!(record.member(1).unwrap().coins, 400);
    assert_eq!(record.member(2).unwrap().coins, 600);
    assert_eq!(record.member(2).unwrap().display_name, "bobby");
    assert_eq!(record.member(4).unwrap().coins, 500);
    Ok(())
}

#[tokio::test]
async fn test_transfer_scenario_persists() -> anyhow::Result<()> {
    let h = harness(Flip::Win, 100).await?;
    let outcome = h.service.send(GUILD, &alice(), "100", "bob", &Everyone).await?;
    assert_eq!(outcome.sender.coins, 400);
    assert_eq!(outcome.receiver.coins, 600);

    let record = h.store.load(GUILD).await?;
    let a = record.member(1).unwrap();
    let b = record.member(2).unwrap();
    assert_eq!((a.transfers, b.transfers), (100, -100));
    assert_eq!(a.net_transfer_with(2), 100);
    assert_eq!(b.net_transfer_with(1), -100);

    let line = h
        .service
        .transfers_with(GUILD, &bob(), None, "alice", &Everyone)
        .await?;
    assert_eq!(line.net, -100);
    Ok(())
}

#[tokio::test]
async fn test_send_rejects_bad_amounts_with_user_messages() -> anyhow::Result<()> {
    let h = harness(Flip::Win, 100).await?;

    let err = h
        .service
        .send(GUILD, &alice(), "lots", "bob", &Everyone)
        .await
        .unwrap_err();
    assert_eq!(err.message, "Please enter a valid amount");

    let err = h
        .service
        .send(GUILD, &alice(), "900", "bob", &Everyone)
        .await
        .unwrap_err();
    assert_eq!(err.message, "Not enough coins. alice only has 500 coins");
    assert_eq!(err.kind, ErrorKind::ValidationError);
    Ok(())
}

#[tokio::test]
async fn test_yolo_loss_empties_wallet() -> anyhow::Result<()> {
    let h = harness(Flip::Loss, 100).await?;
    let outcome = h.service.yolo(GUILD, &alice()).await?;
    assert_eq!(outcome.bet, 500);
    assert_eq!(outcome.actor.coins, 0);

    let err = h.service.yolo(GUILD, &alice()).await.unwrap_err();
    assert_eq!(err.ledger_error(), Some(&LedgerError::InvalidAmount));
    Ok(())
}

#[tokio::test]
async fn test_gamble_against_member_who_left() -> anyhow::Result<()> {
    let h = harness(Flip::Win, 100).await?;
    let present: HashSet<u64> = [1].into_iter().collect();
    let err = h
        .service
        .gamble(GUILD, &alice(), "10", Some("bob"), &present)
        .await
        .unwrap_err();
    assert_eq!(err.message, "Please enter a valid name");
    assert_eq!(err.ledger_error(), Some(&LedgerError::InvalidOpponent));

    let outcome = h
        .service
        .gamble(GUILD, &alice(), "10", Some("bob"), &Everyone)
        .await?;
    assert_eq!(outcome.winner().unwrap().id, 1);
    let h2h = h
        .service
        .head_to_head(GUILD, &bob(), None, "alice", &Everyone)
        .await?;
    assert_eq!((h2h.wins, h2h.losses), (0, 1));
    Ok(())
}

#[tokio::test]
async fn test_claim_cooldown_cycle() -> anyhow::Result<()> {
    let h = harness(Flip::Win, 150).await?;

    // fresh members may claim straight away
    let outcome = h.service.claim(GUILD, &alice()).await?;
    assert_eq!(outcome.member.coins, 650);

    h.clock.advance(Duration::minutes(30));
    let err = h.service.claim(GUILD, &alice()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::RateLimitError);
    assert_eq!(
        err.ledger_error(),
        Some(&LedgerError::OnCooldown {
            remaining_minutes: 30
        })
    );

    h.clock.advance(Duration::minutes(30));
    assert_ok!(h.service.claim(GUILD, &alice()).await);
    let standing = h.service.wallet(GUILD, &alice(), None, &Everyone).await?;
    assert_eq!(standing.coins, 800);
    Ok(())
}

#[tokio::test]
async fn test_membership_events() -> anyhow::Result<()> {
    let h = harness(Flip::Win, 100).await?;

    assert!(h.service.member_joined(GUILD, &GuildMember::new(5, "eve")).await?);
    assert!(!h.service.member_joined(GUILD, &GuildMember::new(5, "evie")).await?);
    assert!(!h.service.member_joined(GUILD, &GuildMember::bot(6, "dealer")).await?);
    assert!(h.service.member_renamed(GUILD, 5, "eva").await?);
    assert!(!h.service.member_renamed(GUILD, 5, "eva").await?);
    assert!(h.service.rename_guild(GUILD, "new name").await?);
    assert!(!h.service.rename_guild(GUILD, "new name").await?);

    let record = h.store.load(GUILD).await?;
    assert_eq!(record.guild_name, "new name");
    assert_eq!(record.member(5).unwrap().display_name, "eva");
    assert!(!record.contains_member(6));

    let err = h.service.member_renamed(GUILD, 99, "ghost").await.unwrap_err();
    assert_eq!(err.message, DATA_NOT_FOUND_MESSAGE);
    Ok(())
}

#[tokio::test]
async fn test_unknown_guild_needs_refresh() -> anyhow::Result<()> {
    let h = harness(Flip::Win, 100).await?;
    let err = h
        .service
        .wallet(404, &alice(), None, &Everyone)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFoundError);
    assert_eq!(err.message, DATA_NOT_FOUND_MESSAGE);

    let err = h
        .service
        .member_joined(404, &GuildMember::new(1, "alice"))
        .await
        .unwrap_err();
    assert_eq!(err.message, DATA_NOT_FOUND_MESSAGE);
    Ok(())
}

#[tokio::test]
async fn test_leaderboard_and_listings() -> anyhow::Result<()> {
    let h = harness(Flip::Win, 100).await?;
    h.service
        .gamble(GUILD, &bob(), "50", Some("alice"), &Everyone)
        .await?;

    let board = h
        .service
        .leaderboard(GUILD, &alice(), LeaderboardKind::Coins, 5, &Everyone)
        .await?;
    assert_eq!(board[0].display_name, "bob");
    assert_eq!(board[0].value, 550);

    let scores = h.service.scores(GUILD, &alice(), &Everyone).await?;
    assert_eq!(scores.len(), 2);
    let wallets = h.service.wallets(GUILD, &alice(), &Everyone).await?;
    assert_eq!(wallets.iter().map(|w| w.coins).sum::<i64>(), 1000);

    let all = h
        .service
        .head_to_head_all(GUILD, &alice(), None, &Everyone)
        .await?;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].losses, 1);

    let totals = h.service.transfer_totals(GUILD, &alice(), &Everyone).await?;
    assert!(totals.iter().all(|total| total.net == 0));
    let err = h
        .service
        .transfer_history(GUILD, &alice(), None, &Everyone)
        .await
        .unwrap_err();
    assert_eq!(err.message, "alice has no transfers yet with other members");
    let total = h
        .service
        .transfer_total(GUILD, &alice(), Some("bob"), &Everyone)
        .await?;
    assert_eq!(total.net, 0);
    let score = h.service.score(GUILD, &alice(), None, &Everyone).await?;
    assert_eq!(score.losses, 1);
    Ok(())
}

#[tokio::test]
async fn test_manual_lock_sequence() -> anyhow::Result<()> {
    let h = harness(Flip::Win, 100).await?;
    let guard = h.service.acquire_guild_lock(GUILD).await;
    assert!(h.service.locks().try_acquire(GUILD).await.is_none());

    let mut record = h.service.load_record(&guard).await?;
    record.member_mut(2).unwrap().coins += 1;
    h.service.save_record(&guard, &record).await?;
    drop(guard);

    assert_eq!(h.store.load(GUILD).await?.member(2).unwrap().coins, 501);
    Ok(())
}
