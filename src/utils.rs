// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::DateRange;
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use std::cmp::Ordering;

static SITE_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Parses `YYYY-MM-DD:YYYY-MM-DD`.
pub fn parse_range(s: &str) -> Result<DateRange> {
    let (a, b) = s
        .split_once(':')
        .ok_or_else(|| anyhow!("Invalid range '{}', expected FROM:TO", s))?;
    let range = DateRange::new(parse_date(a)?, parse_date(b)?);
    if range.start > range.end {
        return Err(anyhow!("Range '{}' ends before it starts", s));
    }
    Ok(range)
}

pub fn parse_percentage(s: &str) -> Result<Decimal> {
    let p = parse_decimal(s)?;
    if p < Decimal::ZERO || p > Decimal::ONE_HUNDRED {
        return Err(anyhow!("Percentage {} must be between 0 and 100", p));
    }
    Ok(p)
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {:.2}", ccy, d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

/// Ledger entries reference a site by numeric id or by code, so a code that
/// reads as an integer is refused.
pub fn validate_site_code(code: &str) -> Result<()> {
    if !SITE_CODE_RE.is_match(code) {
        return Err(anyhow!(
            "invalid code '{}', use letters, digits, '_' or '-'",
            code
        ));
    }
    if code.parse::<i64>().is_ok() {
        return Err(anyhow!("code '{}' reads as a site id", code));
    }
    Ok(())
}

/// Resolves a site given either its numeric id or its exact name.
pub fn id_for_site(conn: &Connection, key: &str) -> Result<i64> {
    let key = key.trim();
    if let Ok(id) = key.parse::<i64>() {
        let found: Option<i64> = conn
            .query_row("SELECT id FROM sites WHERE id=?1", params![id], |r| r.get(0))
            .optional()?;
        if let Some(id) = found {
            return Ok(id);
        }
    }
    let mut stmt = conn.prepare("SELECT id FROM sites WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![key], |r| r.get(0))
        .with_context(|| format!("Site '{}' not found", key))?;
    Ok(id)
}

pub fn id_for_company(conn: &Connection, key: &str) -> Result<i64> {
    let key = key.trim();
    if let Ok(id) = key.parse::<i64>() {
        let found: Option<i64> = conn
            .query_row("SELECT id FROM companies WHERE id=?1", params![id], |r| {
                r.get(0)
            })
            .optional()?;
        if let Some(id) = found {
            return Ok(id);
        }
    }
    let mut stmt = conn.prepare("SELECT id FROM companies WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![key], |r| r.get(0))
        .with_context(|| format!("Company '{}' not found", key))?;
    Ok(id)
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

const TURKISH_ALPHABET: &str = "abcçdefgğhıijklmnoöprsştuüvwxyz";

fn turkish_lower(c: char) -> char {
    match c {
        'I' => 'ı',
        'İ' => 'i',
        _ => c.to_lowercase().next().unwrap_or(c),
    }
}

fn turkish_rank(c: char) -> (u8, u32) {
    if !c.is_alphabetic() {
        return (0, c as u32);
    }
    match TURKISH_ALPHABET.chars().position(|a| a == c) {
        Some(pos) => (1, pos as u32),
        None => (2, c as u32),
    }
}

/// Orders names the way a Turkish reader expects: `ç` after `c`, dotless
/// `ı` before `i`, case folded with Turkish rules.
pub fn turkish_cmp(a: &str, b: &str) -> Ordering {
    let key = |s: &str| -> Vec<(u8, u32)> {
        s.chars().map(|c| turkish_rank(turkish_lower(c))).collect()
    };
    key(a).cmp(&key(b)).then_with(|| a.cmp(b))
}
