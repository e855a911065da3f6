// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{DateRange, NewTransaction, TransactionKind};
use crate::store::{SqliteStore, Store};
use crate::utils::{id_for_site, maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let kind = TransactionKind::parse(sub.get_one::<String>("kind").unwrap())
        .ok_or_else(|| anyhow!("Kind must be income or expense"))?;
    let raw = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    // sign follows the kind, whatever the operator typed
    let amount = match kind {
        TransactionKind::Income => raw.abs(),
        TransactionKind::Expense => -raw.abs(),
    };
    let source = sub.get_one::<String>("source").unwrap().trim().to_string();
    let description = sub
        .get_one::<String>("description")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let site_id = match sub.get_one::<String>("site") {
        Some(s) => Some(id_for_site(conn, s)?.to_string()),
        None => None,
    };
    let agreement_ids: Vec<i64> = sub
        .get_many::<i64>("agreement")
        .map(|v| v.copied().collect())
        .unwrap_or_default();
    let payment_period = match (
        sub.get_one::<String>("period_from"),
        sub.get_one::<String>("period_to"),
    ) {
        (Some(f), Some(t)) => {
            let p = DateRange::new(parse_date(f)?, parse_date(t)?);
            if p.start > p.end {
                return Err(anyhow!("Payment period ends before it starts"));
            }
            Some(p)
        }
        _ => None,
    };

    let store = SqliteStore::new(conn);
    let id = store.create_transaction(&NewTransaction {
        date,
        kind,
        amount,
        site_id,
        agreement_ids,
        payment_period,
        source: source.clone(),
        description,
        advance_used: Decimal::ZERO,
        cash_paid: amount.abs(),
    })?;
    println!("Recorded {} {} on {} '{}' (id {})", kind.as_str(), amount, date, source, id);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.kind.clone(),
                    r.amount.clone(),
                    r.site.clone(),
                    r.agreements.clone(),
                    r.period.clone(),
                    r.source.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Kind", "Amount", "Site", "Agreements", "Period", "Source"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub kind: String,
    pub amount: String,
    pub site: String,
    pub agreements: String,
    pub period: String,
    pub source: String,
    pub description: String,
}

/// Ledger rows newest first, filtered by `--site`, `--kind` and `--limit`.
pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let site_filter = match sub.get_one::<String>("site") {
        Some(s) => Some(id_for_site(conn, s)?.to_string()),
        None => None,
    };
    let kind_filter = sub
        .get_one::<String>("kind")
        .and_then(|k| TransactionKind::parse(k));

    let mut txs = SqliteStore::new(conn).transactions()?;
    txs.reverse();
    let limit = sub.get_one::<usize>("limit").copied().unwrap_or(usize::MAX);
    let data = txs
        .into_iter()
        .filter(|t| site_filter.is_none() || t.site_id == site_filter)
        .filter(|t| kind_filter.is_none_or(|k| t.kind == k))
        .take(limit)
        .map(|t| TransactionRow {
            id: t.id,
            date: t.date.to_string(),
            kind: t.kind.as_str().to_string(),
            amount: t.amount.to_string(),
            site: t.site_id.clone().unwrap_or_default(),
            agreements: t
                .agreement_ids
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(","),
            period: t.payment_period.map(|p| p.to_string()).unwrap_or_default(),
            source: t.source.clone(),
            description: t.description.clone().unwrap_or_default(),
        })
        .collect();
    Ok(data)
}
