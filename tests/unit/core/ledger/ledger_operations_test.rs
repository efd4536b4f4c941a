// Ledger Operations Unit Tests
// Wagers, reward claims, transfers, member setup and name lookup against in-memory records

use chrono::{DateTime, Duration, TimeZone, Utc};
use guild_economy::services::core::ledger::{
    claim_reward, initialize_member, lookup_by_display_name, rename_member, transfer, wager,
    AmountSpec, ClaimPolicy, Everyone, FixedOutcomes, Flip, LedgerError, PresentIf,
};
use guild_economy::types::{GuildRecord, MemberId, MemberRecord};
use std::collections::HashSet;

const ALICE: MemberId = 101;
const BOB: MemberId = 202;
const CAROL: MemberId = 303;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn policy() -> ClaimPolicy {
    ClaimPolicy {
        cooldown_minutes: 60,
        min_reward: 50,
        max_reward: 200,
    }
}

fn guild(members: &[(MemberId, &str, i64)]) -> GuildRecord {
    let mut record = GuildRecord::new(1, "casino");
    for (id, name, coins) in members {
        let member = MemberRecord::new(*id, *name, *coins, now() - Duration::days(1));
        record.members.insert(member.key(), member);
    }
    record
}

fn coins(record: &GuildRecord, id: MemberId) -> i64 {
    record.member(id).unwrap().coins
}

fn assert_reciprocal(record: &GuildRecord) {
    for member in record.iter_members() {
        assert_eq!(member.transfers, member.pairwise_transfer_sum());
        for other in record.iter_members().filter(|other| other.id != member.id) {
            assert_eq!(
                member.net_transfer_with(other.id),
                -other.net_transfer_with(member.id)
            );
            assert_eq!(member.wins_against(other.id), other.losses_against(member.id));
        }
    }
}

// ============= MEMBER SETUP =============

#[test]
fn test_initialize_member_starts_clean() {
    let mut record = guild(&[]);
    let member = initialize_member(&mut record, ALICE, "alice", 500, now()).unwrap();

    assert_eq!(member.coins, 500);
    assert_eq!((member.wins, member.losses, member.transfers), (0, 0, 0));
    assert!(member.wins_per_mem.is_empty());
    assert!(member.transfers_per_mem.is_empty());
    assert_eq!(member.last_claimed, now());
}

#[test]
fn test_initialize_member_rejects_existing_and_negative() {
    let mut record = guild(&[(ALICE, "alice", 10)]);
    assert_eq!(
        initialize_member(&mut record, ALICE, "alice", 500, now()).unwrap_err(),
        LedgerError::MemberExists(ALICE)
    );
    assert_eq!(
        initialize_member(&mut record, BOB, "bob", -1, now()).unwrap_err(),
        LedgerError::InvalidAmount
    );
    assert_eq!(coins(&record, ALICE), 10);
    assert_eq!(record.member_count(), 1);
}

#[test]
fn test_initialize_member_appends_in_order() {
    let mut record = guild(&[(ALICE, "alice", 10)]);
    initialize_member(&mut record, CAROL, "carol", 5, now()).unwrap();
    initialize_member(&mut record, BOB, "bob", 5, now()).unwrap();
    let order: Vec<MemberId> = record.iter_members().map(|m| m.id).collect();
    assert_eq!(order, vec![ALICE, CAROL, BOB]);
}

#[test]
fn test_rename_is_idempotent() {
    let mut record = guild(&[(ALICE, "alice", 10)]);
    assert!(rename_member(&mut record, ALICE, "Alicia").unwrap());
    let after_first = record.clone();
    assert!(!rename_member(&mut record, ALICE, "Alicia").unwrap());
    assert_eq!(record, after_first);
    assert_eq!(
        rename_member(&mut record, BOB, "bob").unwrap_err(),
        LedgerError::MemberNotFound(BOB)
    );
}

// ============= LOOKUP =============

#[test]
fn test_lookup_prefers_first_present_match() {
    let record = guild(&[(ALICE, "sam", 10), (BOB, "sam", 20), (CAROL, "carol", 30)]);

    assert_eq!(lookup_by_display_name(&record, "sam", &Everyone).unwrap().id, ALICE);

    let present: HashSet<MemberId> = [BOB, CAROL].into_iter().collect();
    assert_eq!(lookup_by_display_name(&record, "sam", &present).unwrap().id, BOB);

    assert!(lookup_by_display_name(&record, "Sam", &Everyone).is_none());
    assert!(lookup_by_display_name(&record, "carol", &PresentIf(|id: MemberId| id != CAROL)).is_none());
}

// ============= WAGER =============

#[test]
fn test_solo_win_and_loss() {
    let mut record = guild(&[(ALICE, "alice", 500)]);

    let outcome = wager(
        &mut record,
        ALICE,
        &AmountSpec::Exact(100),
        None,
        &Everyone,
        &mut FixedOutcomes::always(Flip::Win),
    )
    .unwrap();
    assert!(outcome.actor_won());
    assert_eq!(outcome.actor.coins, 600);
    assert_eq!(outcome.winner().unwrap().id, ALICE);

    let outcome = wager(
        &mut record,
        ALICE,
        &AmountSpec::Exact(250),
        None,
        &Everyone,
        &mut FixedOutcomes::always(Flip::Loss),
    )
    .unwrap();
    assert!(outcome.winner().is_none());
    let alice = record.member(ALICE).unwrap();
    assert_eq!((alice.coins, alice.wins, alice.losses), (350, 1, 1));
    assert!(alice.wins_per_mem.is_empty() && alice.losses_per_mem.is_empty());
}

#[test]
fn test_all_in_loss_empties_wallet() {
    let mut record = guild(&[(ALICE, "alice", 400), (BOB, "bob", 100)]);
    wager(
        &mut record,
        ALICE,
        &AmountSpec::All,
        None,
        &Everyone,
        &mut FixedOutcomes::always(Flip::Loss),
    )
    .unwrap();

    let alice = record.member(ALICE).unwrap();
    assert_eq!(alice.coins, 0);
    assert_eq!(alice.losses, 1);
    assert!(alice.losses_per_mem.is_empty());
    assert_eq!(coins(&record, BOB), 100);
}

#[test]
fn test_all_in_with_empty_wallet_is_invalid_amount() {
    let mut record = guild(&[(ALICE, "alice", 0)]);
    let err = wager(
        &mut record,
        ALICE,
        &AmountSpec::All,
        None,
        &Everyone,
        &mut FixedOutcomes::always(Flip::Win),
    )
    .unwrap_err();
    assert_eq!(err, LedgerError::InvalidAmount);
}

#[test]
fn test_head_to_head_conserves_and_mirrors_counters() {
    let mut record = guild(&[(ALICE, "alice", 500), (BOB, "bob", 300)]);
    let total = record.total_coins();

    let outcome = wager(
        &mut record,
        ALICE,
        &AmountSpec::Exact(200),
        Some("bob"),
        &Everyone,
        &mut FixedOutcomes::always(Flip::Loss),
    )
    .unwrap();
    assert_eq!(outcome.winner().unwrap().id, BOB);
    assert_eq!(outcome.opponent.as_ref().unwrap().coins, 500);

    wager(
        &mut record,
        ALICE,
        &AmountSpec::Exact(50),
        Some("bob"),
        &Everyone,
        &mut FixedOutcomes::always(Flip::Win),
    )
    .unwrap();

    assert_eq!(record.total_coins(), total);
    assert_eq!(coins(&record, ALICE), 350);
    assert_eq!(coins(&record, BOB), 450);
    let alice = record.member(ALICE).unwrap();
    let bob = record.member(BOB).unwrap();
    assert_eq!((alice.wins, alice.losses), (1, 1));
    assert_eq!((bob.wins, bob.losses), (1, 1));
    assert_eq!(alice.wins_against(BOB), 1);
    assert_eq!(bob.losses_against(ALICE), 1);
    assert_reciprocal(&record);
}

#[test]
fn test_wager_rejections_leave_record_untouched() {
    let mut record = guild(&[(ALICE, "alice", 100), (BOB, "bob", 40)]);
    let before = record.clone();
    let mut outcomes = FixedOutcomes::always(Flip::Win);

    let cases: Vec<(AmountSpec, Option<&str>, LedgerError)> = vec![
        (AmountSpec::Exact(0), None, LedgerError::InvalidAmount),
        (AmountSpec::Exact(-5), None, LedgerError::InvalidAmount),
        (
            AmountSpec::Exact(101),
            None,
            LedgerError::InsufficientFunds {
                name: "alice".to_string(),
                balance: 100,
            },
        ),
        (
            AmountSpec::Exact(50),
            Some("bob"),
            LedgerError::InsufficientFunds {
                name: "bob".to_string(),
                balance: 40,
            },
        ),
        (AmountSpec::Exact(10), Some("alice"), LedgerError::InvalidOpponent),
        (AmountSpec::Exact(10), Some("nobody"), LedgerError::InvalidOpponent),
    ];
    for (amount, opponent, expected) in cases {
        let err = wager(&mut record, ALICE, &amount, opponent, &Everyone, &mut outcomes).unwrap_err();
        assert_eq!(err, expected);
        assert_eq!(record, before);
    }
}

#[test]
fn test_absent_opponent_is_invalid() {
    let mut record = guild(&[(ALICE, "alice", 100), (BOB, "bob", 100)]);
    let present: HashSet<MemberId> = [ALICE].into_iter().collect();
    let err = wager(
        &mut record,
        ALICE,
        &AmountSpec::Exact(10),
        Some("bob"),
        &present,
        &mut FixedOutcomes::always(Flip::Win),
    )
    .unwrap_err();
    assert_eq!(err, LedgerError::InvalidOpponent);
}

// ============= CLAIM =============

#[test]
fn test_claim_credits_reward_and_restarts_cooldown() {
    let mut record = guild(&[(ALICE, "alice", 100)]);
    let outcome = claim_reward(
        &mut record,
        ALICE,
        now(),
        &policy(),
        &mut FixedOutcomes::always(Flip::Win).with_draw(120),
    )
    .unwrap();

    assert_eq!(outcome.reward, 120);
    assert_eq!(outcome.member.coins, 220);
    assert_eq!(record.member(ALICE).unwrap().last_claimed, now());
}

#[test]
fn test_claim_inside_cooldown_reports_remaining_minutes() {
    let mut record = guild(&[(ALICE, "alice", 100)]);
    record.member_mut(ALICE).unwrap().last_claimed = now();
    let before = record.clone();
    let mut outcomes = FixedOutcomes::always(Flip::Win).with_draw(100);

    let err = claim_reward(
        &mut record,
        ALICE,
        now() + Duration::minutes(30),
        &policy(),
        &mut outcomes,
    )
    .unwrap_err();
    assert_eq!(err, LedgerError::OnCooldown { remaining_minutes: 30 });
    assert_eq!(
        err.to_string(),
        "Reward already claimed. Please wait another 30 mins"
    );

    let err = claim_reward(
        &mut record,
        ALICE,
        now() + Duration::minutes(60) - Duration::seconds(1),
        &policy(),
        &mut outcomes,
    )
    .unwrap_err();
    assert_eq!(err, LedgerError::OnCooldown { remaining_minutes: 1 });
    assert_eq!(record, before);
}

#[test]
fn test_claim_exactly_at_cooldown_succeeds() {
    let mut record = guild(&[(ALICE, "alice", 100)]);
    record.member_mut(ALICE).unwrap().last_claimed = now();
    let at = now() + Duration::minutes(60);

    let outcome = claim_reward(
        &mut record,
        ALICE,
        at,
        &policy(),
        &mut FixedOutcomes::always(Flip::Win).with_draw(75),
    )
    .unwrap();
    assert_eq!(outcome.member.coins, 175);
    assert_eq!(outcome.claimed_at, at);
}

#[test]
fn test_claim_draw_is_clamped_to_policy() {
    let mut record = guild(&[(ALICE, "alice", 0)]);
    let outcome = claim_reward(
        &mut record,
        ALICE,
        now(),
        &policy(),
        &mut FixedOutcomes::always(Flip::Win).with_draw(10_000),
    )
    .unwrap();
    assert!((50..=200).contains(&outcome.reward));
}

// ============= TRANSFER =============

#[test]
fn test_transfer_moves_coins_and_history() {
    let mut record = guild(&[(ALICE, "alice", 500), (BOB, "bob", 500)]);
    let outcome = transfer(&mut record, ALICE, "bob", 100, &Everyone).unwrap();

    assert_eq!(outcome.sender.coins, 400);
    assert_eq!(outcome.receiver.coins, 600);
    let alice = record.member(ALICE).unwrap();
    let bob = record.member(BOB).unwrap();
    assert_eq!(alice.transfers, 100);
    assert_eq!(bob.transfers, -100);
    assert_eq!(alice.net_transfer_with(BOB), 100);
    assert_eq!(bob.net_transfer_with(ALICE), -100);
}

#[test]
fn test_transfers_stay_reciprocal_over_many_exchanges() {
    let mut record = guild(&[(ALICE, "alice", 1000), (BOB, "bob", 1000), (CAROL, "carol", 1000)]);
    let total = record.total_coins();
    let plan = [
        (ALICE, "bob", 120),
        (BOB, "alice", 20),
        (CAROL, "alice", 300),
        (BOB, "carol", 75),
        (ALICE, "carol", 5),
    ];
    for (sender, receiver, amount) in plan {
        transfer(&mut record, sender, receiver, amount, &Everyone).unwrap();
        assert_reciprocal(&record);
    }
    assert_eq!(record.total_coins(), total);
    assert_eq!(record.member(ALICE).unwrap().net_transfer_with(BOB), 100);
    assert_eq!(record.member(CAROL).unwrap().net_transfer_with(ALICE), 295);
}

#[test]
fn test_transfer_rejections_leave_record_untouched() {
    let mut record = guild(&[(ALICE, "alice", 100), (BOB, "bob", 100)]);
    let before = record.clone();

    assert_eq!(
        transfer(&mut record, ALICE, "bob", 0, &Everyone).unwrap_err(),
        LedgerError::InvalidAmount
    );
    assert_eq!(
        transfer(&mut record, ALICE, "bob", 101, &Everyone).unwrap_err(),
        LedgerError::InsufficientFunds {
            name: "alice".to_string(),
            balance: 100
        }
    );
    assert_eq!(
        transfer(&mut record, ALICE, "alice", 10, &Everyone).unwrap_err(),
        LedgerError::InvalidReceiver
    );
    assert_eq!(
        transfer(&mut record, ALICE, "ghost", 10, &Everyone).unwrap_err(),
        LedgerError::InvalidReceiver
    );
    assert_eq!(record, before);
}
