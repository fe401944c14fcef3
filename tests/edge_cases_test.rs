//! Edge case tests for the ledger engine's public API.
//!
//! Exercises the account/default/deletion flows end to end against an
//! in-memory store.

use chrono::Utc;
use finledger::{AccountRequest, Engine, LedgerError, Money, Store, TxKind};
use std::str::FromStr;
use uuid::Uuid;

const ALICE: &str = "idp|alice";

fn engine() -> Engine {
    let store = Store::open_in_memory().unwrap();
    store.insert_user(ALICE, "Alice").unwrap();
    Engine::new(store)
}

fn request(name: &str, kind: &str, balance: &str, is_default: bool) -> AccountRequest {
    AccountRequest {
        name: name.to_string(),
        kind: kind.to_string(),
        balance: balance.to_string(),
        is_default,
    }
}

fn create(engine: &mut Engine, name: &str, balance: &str, is_default: bool) -> Uuid {
    engine
        .create_account(Some(ALICE), &request(name, "current", balance, is_default))
        .unwrap()
        .id
}

fn post(engine: &mut Engine, account_id: Uuid, kind: TxKind, amount: &str) -> Uuid {
    engine
        .record_transaction(
            Some(ALICE),
            account_id,
            kind,
            Money::from_str(amount).unwrap(),
            Utc::now(),
        )
        .unwrap()
        .id
}

fn balance(engine: &Engine, account_id: Uuid) -> f64 {
    engine
        .account_statement(Some(ALICE), account_id)
        .unwrap()
        .0
        .balance
}

fn default_ids(engine: &Engine, session: &str) -> Vec<Uuid> {
    engine
        .account_overview(Some(session))
        .unwrap()
        .into_iter()
        .filter(|a| a.is_default)
        .map(|a| a.id)
        .collect()
}

// ==================== BULK DELETE EDGE CASES ====================

#[test]
fn test_mixed_kinds_on_one_account_net_out() {
    let mut engine = engine();
    let x = create(&mut engine, "X", "100.00", false);
    let expense = post(&mut engine, x, TxKind::Expense, "10.00");
    let income = post(&mut engine, x, TxKind::Income, "5.00");
    assert_eq!(balance(&engine, x), 95.0);

    let outcome = engine.bulk_delete_transactions(Some(ALICE), &[expense, income]);

    assert!(outcome.success);
    assert_eq!(outcome.stale_accounts, vec![x]);
    assert_eq!(balance(&engine, x), 100.0);
}

#[test]
fn test_deleting_every_posting_restores_opening_balance() {
    let mut engine = engine();
    let x = create(&mut engine, "X", "42.00", false);
    let ids: Vec<Uuid> = vec![
        post(&mut engine, x, TxKind::Income, "100.00"),
        post(&mut engine, x, TxKind::Expense, "33.33"),
        post(&mut engine, x, TxKind::Income, "0.01"),
    ];

    let outcome = engine.bulk_delete_transactions(Some(ALICE), &ids);

    assert!(outcome.success);
    assert_eq!(balance(&engine, x), 42.0);
    let (_, remaining) = engine.account_statement(Some(ALICE), x).unwrap();
    assert!(remaining.is_empty());
}

#[test]
fn test_small_amounts_carry_no_float_drift() {
    let mut engine = engine();
    let x = create(&mut engine, "X", "0.00", false);
    for _ in 0..10 {
        post(&mut engine, x, TxKind::Income, "0.10");
    }

    // 10 × 0.10 must be exactly 1.00, not 0.9999999999999999.
    assert_eq!(balance(&engine, x), 1.0);
}

#[test]
fn test_deletion_leaves_default_flags_alone() {
    let mut engine = engine();
    let a = create(&mut engine, "A", "0.00", false);
    let b = create(&mut engine, "B", "0.00", false);
    let tx = post(&mut engine, b, TxKind::Income, "5.00");

    let outcome = engine.bulk_delete_transactions(Some(ALICE), &[tx]);

    assert!(outcome.success);
    assert_eq!(default_ids(&engine, ALICE), vec![a]);
    assert_eq!(balance(&engine, b), 0.0);
}

// ==================== DEFAULT ACCOUNT EDGE CASES ====================

#[test]
fn test_exactly_one_default_across_call_sequences() {
    let mut engine = engine();
    let a = create(&mut engine, "A", "0.00", false);
    let b = create(&mut engine, "B", "0.00", true);
    let c = create(&mut engine, "C", "0.00", false);

    assert_eq!(default_ids(&engine, ALICE), vec![b]);

    assert!(engine.set_default_account(Some(ALICE), c).success);
    assert_eq!(default_ids(&engine, ALICE), vec![c]);

    assert!(engine.set_default_account(Some(ALICE), a).success);
    assert!(engine.set_default_account(Some(ALICE), a).success);
    assert_eq!(default_ids(&engine, ALICE), vec![a]);
}

#[test]
fn test_switching_default_demotes_previous_holder() {
    let mut engine = engine();
    let a = create(&mut engine, "A", "0.00", false);
    let b = create(&mut engine, "B", "0.00", false);
    assert_eq!(default_ids(&engine, ALICE), vec![a]);

    let outcome = engine.set_default_account(Some(ALICE), b);

    assert!(outcome.success);
    let accounts = engine.account_overview(Some(ALICE)).unwrap();
    let a_row = accounts.iter().find(|row| row.id == a).unwrap();
    let b_row = accounts.iter().find(|row| row.id == b).unwrap();
    assert!(!a_row.is_default);
    assert!(b_row.is_default);
}

#[test]
fn test_users_hold_independent_defaults() {
    let mut engine = engine();
    let mine = create(&mut engine, "Mine", "0.00", false);

    let bob = engine.add_user("idp|bob", "Bob").unwrap();
    let theirs = engine
        .create_account(
            Some(bob.external_id.as_str()),
            &request("Theirs", "savings", "0.00", false),
        )
        .unwrap()
        .id;

    assert_eq!(default_ids(&engine, ALICE), vec![mine]);
    assert_eq!(default_ids(&engine, &bob.external_id), vec![theirs]);
}

#[test]
fn test_unknown_account_reports_failure_payload() {
    let mut engine = engine();
    create(&mut engine, "A", "0.00", false);

    let outcome = engine.set_default_account(Some(ALICE), Uuid::new_v4());

    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("account not found"));
    assert!(outcome.stale_accounts.is_empty());
}

// ==================== ACCOUNT CREATION EDGE CASES ====================

#[test]
fn test_first_account_ignores_requested_false_flag() {
    let mut engine = engine();
    let account = engine
        .create_account(Some(ALICE), &request("First", "savings", "10.00", false))
        .unwrap();

    assert!(account.is_default);
    assert_eq!(account.balance, 10.0);
}

#[test]
fn test_invalid_requests_raise_before_any_write() {
    let mut engine = engine();

    let err = engine
        .create_account(Some(ALICE), &request("X", "current", "ten", false))
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InvalidArgument { field: "balance", .. }
    ));

    let err = engine
        .create_account(Some(ALICE), &request("X", "brokerage", "0.00", false))
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InvalidArgument { field: "kind", .. }
    ));

    assert!(engine.account_overview(Some(ALICE)).unwrap().is_empty());
}

// ==================== IDENTITY EDGE CASES ====================

#[test]
fn test_reads_require_a_session() {
    let engine = engine();

    assert!(matches!(
        engine.account_overview(None).unwrap_err(),
        LedgerError::Unauthenticated
    ));
    assert!(matches!(
        engine.account_statement(None, Uuid::new_v4()).unwrap_err(),
        LedgerError::Unauthenticated
    ));
}

#[test]
fn test_statement_is_owner_scoped() {
    let mut engine = engine();
    let mine = create(&mut engine, "Mine", "0.00", false);
    engine.add_user("idp|bob", "Bob").unwrap();

    let err = engine
        .account_statement(Some("idp|bob"), mine)
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound("account")));
}

// ==================== STATEMENT EDGE CASES ====================

#[test]
fn test_statement_lists_newest_first() {
    let mut engine = engine();
    let x = create(&mut engine, "X", "0.00", false);

    let early = Utc::now() - chrono::Duration::days(2);
    let late = Utc::now();
    engine
        .record_transaction(
            Some(ALICE),
            x,
            TxKind::Income,
            Money::from_str("1.00").unwrap(),
            early,
        )
        .unwrap();
    let newest = engine
        .record_transaction(
            Some(ALICE),
            x,
            TxKind::Expense,
            Money::from_str("2.00").unwrap(),
            late,
        )
        .unwrap();

    let (_, transactions) = engine.account_statement(Some(ALICE), x).unwrap();
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0].id, newest.id);
}
