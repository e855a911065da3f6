// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Settings;
use crate::error::Reported;
use crate::models::DateRange;
use crate::notify::{AlertKind, ConsoleNotifier, Notifier};
use crate::payments::{
    Calculation, MatchOptions, PaymentRequest, load_and_calculate, pay_site, track_pending,
};
use crate::store::{SqliteStore, Store};
use crate::utils::{fmt_money, id_for_site, maybe_print_json, parse_date, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("calc", sub)) => calc(conn, sub)?,
        Some(("pay", sub)) => pay(conn, sub)?,
        Some(("pending", sub)) => pending(conn, sub)?,
        _ => {}
    }
    Ok(())
}

pub fn window_from(sub: &clap::ArgMatches) -> Result<DateRange> {
    let from = parse_date(sub.get_one::<String>("from").unwrap())?;
    let to = parse_date(sub.get_one::<String>("to").unwrap())?;
    let req = PaymentRequest::new(Some(from), Some(to), None)?;
    Ok(req.window)
}

/// Runs the calculator for the `--from/--to/--site` arguments.
pub fn calculate_for(conn: &Connection, sub: &clap::ArgMatches) -> Result<Calculation> {
    let settings = Settings::load(conn)?;
    let window = window_from(sub)?;
    let site_ids = match sub.try_get_many::<String>("site").ok().flatten() {
        Some(keys) => Some(
            keys.map(|k| id_for_site(conn, k))
                .collect::<Result<Vec<i64>>>()?,
        ),
        None => None,
    };
    let req = PaymentRequest::new(Some(window.start), Some(window.end), site_ids)?;
    let store = SqliteStore::new(conn);
    Ok(load_and_calculate(&store, &req, MatchOptions::from(&settings))?)
}

fn calc(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let calc = calculate_for(conn, sub)?;
    if sub.get_flag("track") {
        let tx = conn.unchecked_transaction()?;
        let n = track_pending(&SqliteStore::new(&tx), &calc)?;
        tx.commit()?;
        eprintln!("Tracked {} pending entr{}", n, if n == 1 { "y" } else { "ies" });
    }
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &calc)? {
        return Ok(());
    }
    let ccy = Settings::load(conn)?.currency;
    let mut rows = Vec::new();
    for r in &calc.results {
        for p in &r.payments {
            rows.push(vec![
                r.site_name.clone(),
                format!("#{}", p.agreement_id),
                p.company_name.clone().unwrap_or_else(|| format!("#{}", p.company_id)),
                p.panel_count.to_string(),
                p.weeks_in_range.to_string(),
                format!("{:.2}", p.weekly_rate_per_panel),
                format!("{}%", p.agreement_percentage),
                format!("{:.2}", p.total_amount),
                format!("{:.2}", p.paid_amount),
                format!("{:.2}", p.amount),
            ]);
        }
        rows.push(vec![
            format!("{} total", r.site_name),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            fmt_money(&r.total_amount, &ccy),
        ]);
    }
    println!("Window {}", calc.window);
    println!(
        "{}",
        pretty_table(
            &[
                "Site", "Agreement", "Company", "Panels", "Weeks", "Rate", "Share", "Amount",
                "Paid", "Pending"
            ],
            rows
        )
    );
    println!("Grand total: {}", fmt_money(&calc.grand_total(), &ccy));
    if sub.get_flag("skipped") && !calc.skipped.is_empty() {
        let rows = calc
            .skipped
            .iter()
            .map(|s| {
                vec![
                    format!("#{}", s.agreement_id),
                    s.site_id.map(|i| i.to_string()).unwrap_or_default(),
                    serde_json::to_value(s.reason)
                        .ok()
                        .and_then(|v| v.as_str().map(str::to_string))
                        .unwrap_or_default(),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Agreement", "Site", "Reason"], rows));
    }
    Ok(())
}

fn pay(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let notifier = ConsoleNotifier::new(sub.get_flag("yes"));
    let settings = Settings::load(conn)?;
    let window = window_from(sub)?;
    let site_id = id_for_site(conn, sub.get_one::<String>("site").unwrap())?;
    let today = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().date_naive(),
    };

    let tx = conn.unchecked_transaction()?;
    let store = SqliteStore::new(&tx);
    // the notifier has already shown any failure
    let receipt = pay_site(
        &store,
        &notifier,
        site_id,
        window,
        MatchOptions::from(&settings),
        today,
    )
    .map_err(Reported)?;
    match receipt {
        Some(r) => {
            tx.commit()?;
            println!(
                "Paid {} (cash {}, advance {}) to site {}; transaction {}",
                fmt_money(&r.total_amount, &settings.currency),
                r.cash_paid,
                r.advance_used,
                r.site_id,
                r.transaction_id
            );
        }
        None => notifier.alert("Payment", "cancelled", AlertKind::Info),
    }
    Ok(())
}

fn pending(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let filter = match sub.get_one::<String>("site") {
        Some(s) => Some(id_for_site(conn, s)?),
        None => None,
    };
    let sites = SqliteStore::new(conn).sites()?;
    let mut data = Vec::new();
    for s in sites.iter().filter(|s| filter.is_none_or(|f| f == s.id)) {
        for e in &s.pending_payments {
            data.push(serde_json::json!({
                "site_id": s.id,
                "site_name": s.name,
                "agreement_id": e.agreement_id,
                "amount": e.amount,
                "date_from": e.date_from,
                "date_to": e.date_to,
            }));
        }
    }
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|v| {
                ["site_name", "agreement_id", "amount", "date_from", "date_to"]
                    .iter()
                    .map(|k| match &v[*k] {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Site", "Agreement", "Amount", "From", "To"], rows)
        );
    }
    Ok(())
}
