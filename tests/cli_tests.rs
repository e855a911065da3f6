// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use panelpay::cli;
use panelpay::commands::{
    agreements, companies, doctor, exporter, payments, settings, sites, transactions,
};
use panelpay::config::Settings;
use panelpay::error::{PanelError, Reported};
use panelpay::models::AgreementStatus;
use panelpay::store::{SqliteStore, Store};
use rusqlite::Connection;
use rust_decimal::Decimal;
use tempfile::tempdir;

fn conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    panelpay::db::init_schema(&conn).unwrap();
    conn
}

/// Parses `args` and hands the first-level subcommand matches to `f`.
fn run<F>(args: &[&str], f: F) -> anyhow::Result<()>
where
    F: FnOnce(&clap::ArgMatches) -> anyhow::Result<()>,
{
    let mut full = vec!["panelpay"];
    full.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(full);
    match matches.subcommand() {
        Some((_, sub)) => f(sub),
        None => panic!("no subcommand parsed"),
    }
}

fn seed(conn: &Connection) {
    run(&["company", "add", "--name", "Reklam"], |m| companies::handle(conn, m)).unwrap();
    run(
        &["site", "add", "--name", "Merkez", "--percentage", "50", "--code", "MRK"],
        |m| sites::handle(conn, m),
    )
    .unwrap();
    run(&["site", "add", "--name", "Plaza", "--percentage", "25"], |m| {
        sites::handle(conn, m)
    })
    .unwrap();
}

#[test]
fn agreement_add_stores_ranges_and_panels() {
    let conn = conn();
    seed(&conn);
    run(
        &[
            "agreement", "add", "--company", "Reklam", "--rate", "300", "--range",
            "2024-01-01:2024-01-14", "--range", "2024-03-01:2024-03-31", "--panels", "Merkez=4",
            "--panels", "2=2",
        ],
        |m| agreements::handle(&conn, m),
    )
    .unwrap();

    let all = SqliteStore::new(&conn).agreements().unwrap();
    assert_eq!(all.len(), 1);
    let a = &all[0];
    assert_eq!(a.site_ids, vec![1, 2]);
    assert_eq!(a.panel_count(1), 4);
    assert_eq!(a.panel_count(2), 2);
    assert_eq!(a.ranges.len(), 2);
    assert_eq!(a.weekly_rate_per_panel, Decimal::from(300));
    assert_eq!(a.status, AgreementStatus::Active);

    run(&["agreement", "archive", "--id", "1"], |m| {
        agreements::handle(&conn, m)
    })
    .unwrap();
    let all = SqliteStore::new(&conn).agreements().unwrap();
    assert!(all[0].is_archived());
}

#[test]
fn agreement_add_rejects_bad_input() {
    let conn = conn();
    seed(&conn);
    let inverted = run(
        &[
            "agreement", "add", "--company", "Reklam", "--rate", "300", "--range",
            "2024-02-01:2024-01-01", "--panels", "Merkez=4",
        ],
        |m| agreements::handle(&conn, m),
    );
    assert!(inverted.is_err());
    let unknown_site = run(
        &[
            "agreement", "add", "--company", "Reklam", "--rate", "300", "--range",
            "2024-01-01:2024-01-31", "--panels", "Nowhere=4",
        ],
        |m| agreements::handle(&conn, m),
    );
    assert!(unknown_site.is_err());
    assert!(SqliteStore::new(&conn).agreements().unwrap().is_empty());
}

#[test]
fn expense_sign_follows_kind_and_list_limit() {
    let conn = conn();
    seed(&conn);
    for (date, kind, amount) in [
        ("2024-01-02", "income", "-100"),
        ("2024-01-03", "expense", "40"),
        ("2024-01-04", "expense", "-60"),
    ] {
        run(
            &[
                "tx", "add", "--date", date, "--kind", kind, "--amount", amount, "--source",
                "Kasa", "--site", "Merkez", "--agreement", "1",
            ],
            |m| transactions::handle(&conn, m),
        )
        .unwrap();
    }
    let txs = SqliteStore::new(&conn).transactions().unwrap();
    let amounts: Vec<String> = txs.iter().map(|t| t.amount.to_string()).collect();
    assert_eq!(amounts, vec!["100", "-40", "-60"]);
    assert_eq!(txs[0].site_id.as_deref(), Some("1"));
    assert_eq!(txs[0].agreement_ids, vec![1]);

    let matches =
        cli::build_cli().get_matches_from(["panelpay", "tx", "list", "--limit", "2", "--kind", "expense"]);
    let Some(("tx", tx_m)) = matches.subcommand() else {
        panic!("no tx subcommand");
    };
    let Some(("list", list_m)) = tx_m.subcommand() else {
        panic!("no list subcommand");
    };
    let rows = transactions::query_rows(&conn, list_m).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, "2024-01-04");
    assert!(rows.iter().all(|r| r.kind == "expense"));
}

#[test]
fn advance_raises_balance_and_records_expense() {
    let conn = conn();
    seed(&conn);
    run(
        &["site", "advance", "--site", "Plaza", "--amount", "150", "--date", "2024-01-05"],
        |m| sites::handle(&conn, m),
    )
    .unwrap();
    let store = SqliteStore::new(&conn);
    let plaza = store.sites().unwrap().into_iter().find(|s| s.name == "Plaza").unwrap();
    assert_eq!(plaza.advance_balance, Decimal::from(150));
    let txs = store.transactions().unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].amount, Decimal::from(-150));
    assert!(txs[0].agreement_ids.is_empty());
}

#[test]
fn config_set_and_load() {
    let conn = conn();
    assert!(!Settings::load(&conn).unwrap().legacy_text_match);
    run(&["config", "set", "legacy_text_match", "yes"], |m| {
        settings::handle(&conn, m)
    })
    .unwrap();
    run(&["config", "set", "currency", "usd"], |m| settings::handle(&conn, m)).unwrap();
    let s = Settings::load(&conn).unwrap();
    assert!(s.legacy_text_match);
    assert!(!s.strict_payment_period);
    assert_eq!(s.currency, "USD");

    let bad = run(&["config", "set", "colour", "blue"], |m| {
        settings::handle(&conn, m)
    });
    assert!(bad.is_err());
}

#[test]
fn export_payments_writes_csv() {
    let conn = conn();
    seed(&conn);
    run(
        &[
            "agreement", "add", "--company", "1", "--rate", "300", "--range",
            "2024-01-01:2024-06-30", "--panels", "Merkez=4",
        ],
        |m| agreements::handle(&conn, m),
    )
    .unwrap();

    let dir = tempdir().unwrap();
    let out = dir.path().join("payments.csv");
    let out_str = out.to_string_lossy().to_string();
    run(
        &[
            "export", "payments", "--from", "2024-01-01", "--to", "2024-01-14", "--out", &out_str,
        ],
        |m| exporter::handle(&conn, m),
    )
    .unwrap();

    let mut rdr = csv::Reader::from_path(&out).unwrap();
    let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(&records[0][1], "Merkez");
    assert_eq!(&records[0][5], "2");
    assert_eq!(records[0][10].parse::<Decimal>().unwrap(), Decimal::from(1200));
}

#[test]
fn export_rejects_unknown_format() {
    let conn = conn();
    let dir = tempdir().unwrap();
    let out = dir.path().join("sites.xml");
    let out_str = out.to_string_lossy().to_string();
    let res = run(
        &["export", "sites", "--format", "xml", "--out", &out_str],
        |m| exporter::handle(&conn, m),
    );
    assert!(res.is_err());
    assert!(!out.exists());
}

#[test]
fn doctor_reports_broken_agreements() {
    let conn = conn();
    seed(&conn);
    assert!(doctor::check(&conn).unwrap().is_empty());
    conn.execute_batch(
        "INSERT INTO agreements(id, company_id, weekly_rate_per_panel) VALUES (5, 99, '100');
         INSERT INTO agreement_sites(agreement_id, position, site_id, panel_count) VALUES (5, 0, 1, 0), (5, 1, 42, 3);",
    )
    .unwrap();
    let issues: Vec<String> = doctor::check(&conn)
        .unwrap()
        .into_iter()
        .map(|(issue, _)| issue)
        .collect();
    assert_eq!(
        issues,
        vec![
            "agreement_missing_company",
            "agreement_without_range",
            "zero_panels",
            "agreement_missing_site",
        ]
    );
}

#[test]
fn site_codes_cannot_shadow_ids_or_repeat() {
    let conn = conn();
    seed(&conn);
    let numeric = run(
        &["site", "add", "--name", "Kule", "--percentage", "30", "--code", "1"],
        |m| sites::handle(&conn, m),
    );
    assert!(numeric.unwrap_err().to_string().contains("reads as a site id"));
    let repeated = run(
        &["site", "add", "--name", "Kule", "--percentage", "30", "--code", "MRK"],
        |m| sites::handle(&conn, m),
    );
    assert!(repeated.unwrap_err().to_string().contains("already used"));
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM sites", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn panel_counts_are_bounded() {
    let conn = conn();
    seed(&conn);
    let res = run(
        &[
            "agreement", "add", "--company", "Reklam", "--rate", "300", "--range",
            "2024-01-01:2024-01-31", "--panels", "Merkez=1000000000000000000",
        ],
        |m| agreements::handle(&conn, m),
    );
    assert!(res.is_err());
    assert!(SqliteStore::new(&conn).agreements().unwrap().is_empty());
}

fn seed_agreement(conn: &Connection) {
    run(
        &[
            "agreement", "add", "--company", "Reklam", "--rate", "300", "--range",
            "2024-01-01:2024-06-30", "--panels", "Merkez=4",
        ],
        |m| agreements::handle(conn, m),
    )
    .unwrap();
}

#[test]
fn tracked_calculation_is_committed() {
    let conn = conn();
    seed(&conn);
    seed_agreement(&conn);
    run(
        &["payment", "calc", "--from", "2024-01-01", "--to", "2024-01-14", "--track"],
        |m| payments::handle(&conn, m),
    )
    .unwrap();
    let merkez = SqliteStore::new(&conn)
        .sites()
        .unwrap()
        .into_iter()
        .find(|s| s.name == "Merkez")
        .unwrap();
    assert_eq!(merkez.pending_payments.len(), 1);
    assert_eq!(merkez.pending_payments[0].amount, Decimal::from(1200));
}

#[test]
fn pay_commits_and_failures_are_marked_reported() {
    let conn = conn();
    seed(&conn);
    seed_agreement(&conn);
    let pay = |site: &str| {
        run(
            &[
                "payment", "pay", "--from", "2024-01-01", "--to", "2024-01-14", "--site", site,
                "--date", "2024-01-15", "--yes",
            ],
            |m| payments::handle(&conn, m),
        )
    };
    pay("Merkez").unwrap();
    let txs = SqliteStore::new(&conn).transactions().unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].amount, Decimal::from(-1200));

    let err = pay("Merkez").unwrap_err();
    let reported = err.downcast_ref::<Reported>().unwrap();
    assert!(matches!(reported.0, PanelError::Validation(_)));
    assert_eq!(SqliteStore::new(&conn).transactions().unwrap().len(), 1);
}
