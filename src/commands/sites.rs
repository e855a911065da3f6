// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{NewTransaction, SiteUpdate, TransactionKind};
use crate::store::{SqliteStore, Store};
use crate::utils::{
    id_for_site, maybe_print_json, parse_date, parse_decimal, parse_percentage, pretty_table,
    validate_site_code,
};
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = id_for_site(conn, sub.get_one::<String>("site").unwrap())?;
            conn.execute("DELETE FROM sites WHERE id=?1", params![id])?;
            println!("Removed site {}", id);
        }
        Some(("advance", sub)) => advance(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim();
    let pct = parse_percentage(sub.get_one::<String>("percentage").unwrap())?;
    let code = sub
        .get_one::<String>("code")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());
    if let Some(c) = code {
        validate_site_code(c)?;
        let taken: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sites WHERE code=?1",
            params![c],
            |r| r.get(0),
        )?;
        if taken > 0 {
            return Err(anyhow!("Site code '{}' is already used", c));
        }
    }
    let address = sub
        .get_one::<String>("address")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());
    conn.execute(
        "INSERT INTO sites(name, agreement_percentage, code, address) VALUES (?1, ?2, ?3, ?4)",
        params![name, pct.to_string(), code, address],
    )
    .with_context(|| format!("Add site '{}'", name))?;
    println!(
        "Added site '{}' (id {}, share {}%)",
        name,
        conn.last_insert_rowid(),
        pct
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mut sites = SqliteStore::new(conn).sites()?;
    sites.sort_by(|a, b| crate::utils::turkish_cmp(&a.name, &b.name));
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &sites)? {
        let rows = sites
            .into_iter()
            .map(|s| {
                let pending: Decimal = s.pending_payments.iter().map(|p| p.amount).sum();
                vec![
                    s.id.to_string(),
                    s.name,
                    format!("{}%", s.agreement_percentage),
                    s.code.unwrap_or_default(),
                    format!("{:.2}", s.advance_balance),
                    format!("{:.2}", pending),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Name", "Share", "Code", "Advance", "Pending"], rows)
        );
    }
    Ok(())
}

/// Advances leave the till as an expense without agreements, so they never
/// match a site payment window.
fn advance(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let site_id = id_for_site(conn, sub.get_one::<String>("site").unwrap())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    if amount <= Decimal::ZERO {
        return Err(anyhow!("Advance amount must be positive"));
    }
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().date_naive(),
    };

    let tx = conn.unchecked_transaction()?;
    let store = SqliteStore::new(&tx);
    let site = store
        .sites()?
        .into_iter()
        .find(|s| s.id == site_id)
        .ok_or_else(|| anyhow!("Site {} not found", site_id))?;
    store.create_transaction(&NewTransaction {
        date,
        kind: TransactionKind::Expense,
        amount: -amount,
        site_id: None,
        agreement_ids: Vec::new(),
        payment_period: None,
        source: format!("Avans - {}", site.name),
        description: Some(format!("advance for site {}", site.id)),
        advance_used: Decimal::ZERO,
        cash_paid: amount,
    })?;
    let balance = site.advance_balance + amount;
    store.update_site(
        site.id,
        &SiteUpdate {
            advance_balance: Some(balance),
            pending_payments: None,
        },
    )?;
    tx.commit()?;
    tracing::info!(site = site.id, %amount, %balance, "advance paid");
    println!("Advanced {} to '{}', balance now {:.2}", amount, site.name, balance);
    Ok(())
}
