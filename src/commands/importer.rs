// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{parse_decimal, validate_site_code};
use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::collections::HashSet;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("sites", sub)) => import_sites(conn, sub),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteRow {
    pub name: String,
    pub agreement_percentage: Decimal,
    pub code: Option<String>,
    pub address: Option<String>,
    pub advance_balance: Decimal,
}

fn optional(rec: &csv::StringRecord, idx: usize) -> Option<String> {
    rec.get(idx)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Validates every row of a `name,percentage,code,address,advance` file.
/// Returns all problems at once, one message per line, so the operator can
/// fix the file in a single pass.
pub fn validate_sites(
    conn: &Connection,
    rdr: &mut csv::Reader<impl std::io::Read>,
) -> Result<Vec<SiteRow>, Vec<String>> {
    let names_and_codes = (existing_site_names(conn), existing_site_codes(conn));
    let (existing, existing_codes) = match names_and_codes {
        (Ok(names), Ok(codes)) => (names, codes),
        (Err(e), _) | (_, Err(e)) => return Err(vec![e.to_string()]),
    };
    let mut seen = HashSet::new();
    let mut seen_codes = HashSet::new();
    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        // header is line 1
        let line = i + 2;
        let rec = match result {
            Ok(r) => r,
            Err(e) => {
                errors.push(format!("line {}: {}", line, e));
                continue;
            }
        };
        let name = rec.get(0).unwrap_or("").trim().to_string();
        if name.is_empty() {
            errors.push(format!("line {}: name is required", line));
            continue;
        }
        if existing.contains(&name) {
            errors.push(format!("line {}: site '{}' already exists", line, name));
        }
        if !seen.insert(name.clone()) {
            errors.push(format!("line {}: site '{}' appears twice in file", line, name));
        }

        let pct_raw = rec.get(1).unwrap_or("").trim();
        let pct = match parse_decimal(pct_raw) {
            Ok(p) if p >= Decimal::ZERO && p <= Decimal::ONE_HUNDRED => Some(p),
            Ok(p) => {
                errors.push(format!("line {}: percentage {} is not within 0-100", line, p));
                None
            }
            Err(_) => {
                errors.push(format!("line {}: invalid percentage '{}'", line, pct_raw));
                None
            }
        };

        let code = optional(&rec, 2);
        if let Some(c) = &code {
            if let Err(e) = validate_site_code(c) {
                errors.push(format!("line {}: {}", line, e));
            } else if existing_codes.contains(c) {
                errors.push(format!("line {}: code '{}' is already used", line, c));
            } else if !seen_codes.insert(c.clone()) {
                errors.push(format!("line {}: code '{}' appears twice in file", line, c));
            }
        }

        let advance = match optional(&rec, 4) {
            None => Some(Decimal::ZERO),
            Some(raw) => match parse_decimal(&raw) {
                Ok(a) if a >= Decimal::ZERO => Some(a),
                _ => {
                    errors.push(format!("line {}: invalid advance '{}'", line, raw));
                    None
                }
            },
        };

        if let (Some(agreement_percentage), Some(advance_balance)) = (pct, advance) {
            rows.push(SiteRow {
                name,
                agreement_percentage,
                code,
                address: optional(&rec, 3),
                advance_balance,
            });
        }
    }

    if errors.is_empty() {
        Ok(rows)
    } else {
        Err(errors)
    }
}

fn existing_site_names(conn: &Connection) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sites")?;
    let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
    let mut out = HashSet::new();
    for row in rows {
        out.insert(row?);
    }
    Ok(out)
}

fn existing_site_codes(conn: &Connection) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT code FROM sites WHERE code IS NOT NULL")?;
    let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
    let mut out = HashSet::new();
    for row in rows {
        out.insert(row?);
    }
    Ok(out)
}

fn import_sites(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("path").unwrap().trim();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;

    let rows = match validate_sites(conn, &mut rdr) {
        Ok(rows) => rows,
        Err(errors) => {
            for e in &errors {
                tracing::warn!(path, "{}", e);
            }
            return Err(anyhow!(
                "{} problem(s) in {}, nothing imported:\n{}",
                errors.len(),
                path,
                errors.join("\n")
            ));
        }
    };

    let tx = conn.transaction()?;
    for r in &rows {
        tx.execute(
            "INSERT INTO sites(name, agreement_percentage, code, address, advance_balance) VALUES (?1,?2,?3,?4,?5)",
            params![
                r.name,
                r.agreement_percentage.to_string(),
                r.code,
                r.address,
                r.advance_balance.to_string()
            ],
        )?;
    }
    tx.commit()?;
    println!("Imported {} site(s) from {}", rows.len(), path);
    Ok(())
}
