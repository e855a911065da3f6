// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::payments::calculate_for;
use crate::store::{SqliteStore, Store};
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("sites", sub)) => export_sites(conn, sub),
        Some(("payments", sub)) => export_payments(conn, sub),
        _ => Ok(()),
    }
}

fn format_of(sub: &clap::ArgMatches) -> Result<String> {
    let fmt = sub.get_one::<String>("format").unwrap().trim().to_lowercase();
    match fmt.as_str() {
        "csv" | "json" => Ok(fmt),
        _ => Err(anyhow!("Unknown format: {} (use csv|json)", fmt)),
    }
}

fn export_sites(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = format_of(sub)?;
    let out = sub.get_one::<String>("out").unwrap();
    let sites = SqliteStore::new(conn).sites()?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["name", "percentage", "code", "address", "advance"])?;
            for s in &sites {
                wtr.write_record([
                    s.name.clone(),
                    s.agreement_percentage.to_string(),
                    s.code.clone().unwrap_or_default(),
                    s.address.clone().unwrap_or_default(),
                    s.advance_balance.to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        _ => {
            let items: Vec<_> = sites
                .iter()
                .map(|s| {
                    json!({
                        "id": s.id, "name": s.name, "percentage": s.agreement_percentage,
                        "code": s.code, "address": s.address, "advance": s.advance_balance
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
    }
    println!("Exported {} site(s) to {}", sites.len(), out);
    Ok(())
}

/// One line per site/agreement pair still owed in the window.
fn export_payments(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = format_of(sub)?;
    let out = sub.get_one::<String>("out").unwrap();
    let calc = calculate_for(conn, sub)?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "site_id",
                "site",
                "agreement_id",
                "company",
                "panels",
                "weeks",
                "rate",
                "percentage",
                "amount",
                "paid",
                "pending",
                "date_from",
                "date_to",
            ])?;
            for r in &calc.results {
                for p in &r.payments {
                    wtr.write_record([
                        r.site_id.to_string(),
                        r.site_name.clone(),
                        p.agreement_id.to_string(),
                        p.company_name.clone().unwrap_or_default(),
                        p.panel_count.to_string(),
                        p.weeks_in_range.to_string(),
                        p.weekly_rate_per_panel.to_string(),
                        p.agreement_percentage.to_string(),
                        p.total_amount.to_string(),
                        p.paid_amount.to_string(),
                        p.amount.to_string(),
                        calc.window.start.to_string(),
                        calc.window.end.to_string(),
                    ])?;
                }
            }
            wtr.flush()?;
        }
        _ => {
            std::fs::write(out, serde_json::to_string_pretty(&calc.results)?)?;
        }
    }
    println!("Exported payments for {} to {}", calc.window, out);
    Ok(())
}
