// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::DateRange;
use crate::store::{SqliteStore, Store};
use crate::utils::{
    id_for_company, id_for_site, maybe_print_json, parse_decimal, parse_range, pretty_table,
};
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("archive", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let n = conn.execute(
                "UPDATE agreements SET status='archived' WHERE id=?1",
                params![id],
            )?;
            if n == 0 {
                return Err(anyhow!("Agreement {} not found", id));
            }
            println!("Archived agreement {}", id);
        }
        _ => {}
    }
    Ok(())
}

pub const MAX_PANELS_PER_SITE: i64 = 100_000;

/// Parses `SITE=COUNT`.
pub fn parse_panels(conn: &Connection, raw: &str) -> Result<(i64, i64)> {
    let (site, count) = raw
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("Invalid panels '{}', expected SITE=COUNT", raw))?;
    let site_id = id_for_site(conn, site)?;
    let count = count
        .trim()
        .parse::<i64>()
        .with_context(|| format!("Invalid panel count in '{}'", raw))?;
    if !(0..=MAX_PANELS_PER_SITE).contains(&count) {
        return Err(anyhow!(
            "Panel count in '{}' must be between 0 and {}",
            raw,
            MAX_PANELS_PER_SITE
        ));
    }
    Ok((site_id, count))
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let company_id = id_for_company(conn, sub.get_one::<String>("company").unwrap())?;
    let rate = parse_decimal(sub.get_one::<String>("rate").unwrap())?;
    if rate < Decimal::ZERO {
        return Err(anyhow!("Weekly rate must not be negative"));
    }
    let ranges = sub
        .get_many::<String>("range")
        .unwrap()
        .map(|r| parse_range(r))
        .collect::<Result<Vec<DateRange>>>()?;
    let panels = sub
        .get_many::<String>("panels")
        .unwrap()
        .map(|p| parse_panels(conn, p))
        .collect::<Result<Vec<(i64, i64)>>>()?;

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO agreements(company_id, weekly_rate_per_panel, status) VALUES (?1, ?2, 'active')",
        params![company_id, rate.to_string()],
    )?;
    let id = tx.last_insert_rowid();
    for (pos, (site_id, count)) in panels.iter().enumerate() {
        tx.execute(
            "INSERT INTO agreement_sites(agreement_id, position, site_id, panel_count) VALUES (?1,?2,?3,?4)",
            params![id, pos as i64, site_id, count],
        )?;
    }
    for r in &ranges {
        tx.execute(
            "INSERT INTO agreement_ranges(agreement_id, start_date, end_date) VALUES (?1,?2,?3)",
            params![id, r.start.to_string(), r.end.to_string()],
        )?;
    }
    tx.commit()?;
    println!(
        "Added agreement {} for company {}: {} site(s), {} range(s) at {}/panel/week",
        id,
        company_id,
        panels.len(),
        ranges.len(),
        rate
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let store = SqliteStore::new(conn);
    let include_archived = sub.get_flag("all");
    let agreements: Vec<_> = store
        .agreements()?
        .into_iter()
        .filter(|a| include_archived || !a.is_archived())
        .collect();
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &agreements)? {
        return Ok(());
    }
    let companies: HashMap<i64, String> = store
        .companies()?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let sites: HashMap<i64, String> = store
        .sites()?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();
    let rows = agreements
        .into_iter()
        .map(|a| {
            let panels = a
                .site_ids
                .iter()
                .map(|sid| {
                    let name = sites.get(sid).cloned().unwrap_or_else(|| format!("#{}", sid));
                    format!("{}={}", name, a.panel_count(*sid))
                })
                .collect::<Vec<_>>()
                .join(", ");
            let ranges = a
                .ranges
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            vec![
                a.id.to_string(),
                companies
                    .get(&a.company_id)
                    .cloned()
                    .unwrap_or_else(|| format!("#{}", a.company_id)),
                panels,
                format!("{}", a.weekly_rate_per_panel),
                ranges,
                a.status.as_str().to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Company", "Panels", "Rate/Week", "Ranges", "Status"],
            rows
        )
    );
    Ok(())
}
