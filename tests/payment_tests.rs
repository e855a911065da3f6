// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use panelpay::error::PanelError;
use panelpay::models::{DateRange, TransactionKind};
use panelpay::notify::{AlertKind, MemoryNotifier};
use panelpay::payments::{
    MatchOptions, PaymentRequest, execute_payment, load_and_calculate, pay_site, track_pending,
};
use panelpay::store::{SqliteStore, Store};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn window() -> DateRange {
    DateRange::new(d("2024-01-01"), d("2024-01-14"))
}

/// Company 1, site 1 "Merkez" (50%), site 2 "Plaza" (25%), agreement 10
/// with 4 panels on Merkez and 2 on Plaza at 300/week, agreement 11 with
/// 1 panel on Merkez at 100/week.
fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    panelpay::db::init_schema(&conn).unwrap();
    conn.execute("INSERT INTO companies(id,name) VALUES (1,'Reklam')", [])
        .unwrap();
    conn.execute(
        "INSERT INTO sites(id,name,agreement_percentage,advance_balance) VALUES (1,'Merkez','50','0'),(2,'Plaza','25','0')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO agreements(id,company_id,weekly_rate_per_panel,status) VALUES (10,1,'300','active'),(11,1,'100','active')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO agreement_sites(agreement_id,position,site_id,panel_count) VALUES (10,0,1,4),(10,1,2,2),(11,0,1,1)",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO agreement_ranges(agreement_id,start_date,end_date) VALUES (10,'2024-01-01','2024-06-30'),(11,'2023-12-01','2024-01-31')",
        [],
    )
    .unwrap();
    conn
}

fn calc(store: &SqliteStore) -> panelpay::payments::Calculation {
    let req = PaymentRequest::new(Some(window().start), Some(window().end), None).unwrap();
    load_and_calculate(store, &req, MatchOptions::default()).unwrap()
}

fn set_advance(conn: &Connection, site: i64, amount: &str) {
    conn.execute(
        "UPDATE sites SET advance_balance=?1 WHERE id=?2",
        params![amount, site],
    )
    .unwrap();
}

#[test]
fn store_loads_what_was_written() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let agreements = store.agreements().unwrap();
    assert_eq!(agreements.len(), 2);
    assert_eq!(agreements[0].site_ids, vec![1, 2]);
    assert_eq!(agreements[0].panel_count(2), 2);
    assert_eq!(agreements[1].ranges, vec![DateRange::new(d("2023-12-01"), d("2024-01-31"))]);
    let sites = store.sites().unwrap();
    assert_eq!(sites[0].agreement_percentage, dec("50"));
}

#[test]
fn paying_a_site_clears_its_pending_amount() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let notifier = MemoryNotifier::answering(true);

    let before = calc(&store);
    let merkez = before.result_for(1).unwrap().clone();
    // 4*300*2*0.5 + 1*100*2*0.5
    assert_eq!(merkez.total_amount, dec("1300"));

    let receipt = execute_payment(&store, &notifier, &merkez, window(), d("2024-01-15")).unwrap();
    assert_eq!(receipt.cash_paid, dec("1300"));
    assert_eq!(receipt.advance_used, Decimal::ZERO);

    let after = calc(&store);
    assert!(after.result_for(1).is_none());
    // Plaza is untouched
    assert_eq!(
        after.result_for(2).unwrap().total_amount,
        before.result_for(2).unwrap().total_amount
    );

    let tx = store
        .transactions()
        .unwrap()
        .into_iter()
        .find(|t| t.id == receipt.transaction_id)
        .unwrap();
    assert_eq!(tx.kind, TransactionKind::Expense);
    assert_eq!(tx.amount, dec("-1300"));
    assert_eq!(tx.site_id.as_deref(), Some("1"));
    assert_eq!(tx.agreement_ids, vec![10, 11]);
    assert_eq!(tx.payment_period, Some(window()));
    assert!(tx.source.starts_with("Site Ödemesi"));
    assert!(
        notifier
            .alerts()
            .iter()
            .any(|(_, _, kind)| *kind == AlertKind::Success)
    );
}

#[test]
fn partial_prior_payment_is_respected_after_paying() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    conn.execute(
        "INSERT INTO transactions(date,kind,amount,site_id,agreement_ids,period_from,period_to,source)
         VALUES ('2024-01-05','expense','-700','1','[10]','2024-01-01','2024-01-14','Kasa')",
        [],
    )
    .unwrap();
    let merkez = calc(&store).result_for(1).unwrap().clone();
    assert_eq!(merkez.total_amount, dec("600"));
    assert_eq!(merkez.payments[0].amount, dec("500"));

    execute_payment(
        &store,
        &MemoryNotifier::answering(true),
        &merkez,
        window(),
        d("2024-01-15"),
    )
    .unwrap();
    assert!(calc(&store).result_for(1).is_none());
}

#[test]
fn advance_is_drawn_before_cash() {
    let conn = setup();
    set_advance(&conn, 1, "1000");
    let store = SqliteStore::new(&conn);
    let merkez = calc(&store).result_for(1).unwrap().clone();

    let receipt = execute_payment(
        &store,
        &MemoryNotifier::answering(true),
        &merkez,
        window(),
        d("2024-01-15"),
    )
    .unwrap();
    assert_eq!(receipt.advance_used, dec("1000"));
    assert_eq!(receipt.cash_paid, dec("300"));
    assert_eq!(receipt.remaining_advance, Decimal::ZERO);

    let site = store.sites().unwrap().into_iter().find(|s| s.id == 1).unwrap();
    assert_eq!(site.advance_balance, Decimal::ZERO);
    // advance-covered part still counts as paid
    assert!(calc(&store).result_for(1).is_none());
}

#[test]
fn advance_larger_than_total_leaves_remainder() {
    let conn = setup();
    set_advance(&conn, 2, "500");
    let store = SqliteStore::new(&conn);
    let plaza = calc(&store).result_for(2).unwrap().clone();
    // 2*300*2*0.25
    assert_eq!(plaza.total_amount, dec("300"));

    let receipt = execute_payment(
        &store,
        &MemoryNotifier::answering(true),
        &plaza,
        window(),
        d("2024-01-15"),
    )
    .unwrap();
    assert_eq!(receipt.cash_paid, Decimal::ZERO);
    assert_eq!(receipt.remaining_advance, dec("200"));
    let tx = store.transactions().unwrap().pop().unwrap();
    assert_eq!(tx.amount, Decimal::ZERO);
    assert_eq!(tx.advance_used, dec("300"));
    assert!(calc(&store).result_for(2).is_none());
}

#[test]
fn tracked_entries_are_reconciled_on_payment() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let first = calc(&store);
    assert_eq!(track_pending(&store, &first).unwrap(), 3);
    // tracking twice replaces rather than duplicates
    assert_eq!(track_pending(&store, &first).unwrap(), 3);
    let merkez_site = store.sites().unwrap().into_iter().find(|s| s.id == 1).unwrap();
    assert_eq!(merkez_site.pending_payments.len(), 2);

    let merkez = first.result_for(1).unwrap().clone();
    let receipt = execute_payment(
        &store,
        &MemoryNotifier::answering(true),
        &merkez,
        window(),
        d("2024-01-15"),
    )
    .unwrap();
    assert_eq!(receipt.reconciled_entries, 2);
    let merkez_site = store.sites().unwrap().into_iter().find(|s| s.id == 1).unwrap();
    assert!(merkez_site.pending_payments.is_empty());
    let plaza_site = store.sites().unwrap().into_iter().find(|s| s.id == 2).unwrap();
    assert_eq!(plaza_site.pending_payments.len(), 1);
}

#[test]
fn declined_confirmation_writes_nothing() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let notifier = MemoryNotifier::answering(false);
    let out = pay_site(&store, &notifier, 1, window(), MatchOptions::default(), d("2024-01-15"))
        .unwrap();
    assert!(out.is_none());
    assert!(store.transactions().unwrap().is_empty());
}

#[test]
fn pay_site_confirms_and_pays() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let notifier = MemoryNotifier::answering(true);
    let receipt = pay_site(&store, &notifier, 2, window(), MatchOptions::default(), d("2024-01-15"))
        .unwrap()
        .unwrap();
    assert_eq!(receipt.total_amount, dec("300"));
    assert!(calc(&store).result_for(2).is_none());
}

#[test]
fn nothing_pending_is_a_validation_error() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let notifier = MemoryNotifier::answering(true);
    pay_site(&store, &notifier, 2, window(), MatchOptions::default(), d("2024-01-15"))
        .unwrap()
        .unwrap();

    let err = pay_site(&store, &notifier, 2, window(), MatchOptions::default(), d("2024-01-16"))
        .unwrap_err();
    assert!(matches!(err, PanelError::Validation(_)));
    assert!(
        notifier
            .alerts()
            .iter()
            .any(|(title, _, kind)| title == "Validation" && *kind == AlertKind::Error)
    );
    assert_eq!(store.transactions().unwrap().len(), 1);
}

#[test]
fn unknown_site_is_not_found() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let mut row = calc(&store).result_for(1).unwrap().clone();
    row.site_id = 404;
    let err = execute_payment(
        &store,
        &MemoryNotifier::answering(true),
        &row,
        window(),
        d("2024-01-15"),
    )
    .unwrap_err();
    assert!(matches!(err, PanelError::NotFound(_)));
    assert!(store.transactions().unwrap().is_empty());
}
