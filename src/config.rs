// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

pub const KEYS: &[&str] = &["currency", "legacy_text_match", "strict_payment_period"];

/// Settings persisted in the `settings` table.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub currency: String,
    /// Also match ledger entries by their free text ("Site Ödemesi" + site name).
    pub legacy_text_match: bool,
    /// Ledger entries without a payment period never match a window.
    pub strict_payment_period: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: "TRY".to_string(),
            legacy_text_match: false,
            strict_payment_period: false,
        }
    }
}

impl Settings {
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut s = Settings::default();
        if let Some(v) = get(conn, "currency")? {
            s.currency = v;
        }
        if let Some(v) = get(conn, "legacy_text_match")? {
            s.legacy_text_match = parse_bool(&v)?;
        }
        if let Some(v) = get(conn, "strict_payment_period")? {
            s.strict_payment_period = parse_bool(&v)?;
        }
        Ok(s)
    }
}

pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    if !KEYS.contains(&key) {
        return Err(anyhow!(
            "Unknown setting '{}' (expected one of: {})",
            key,
            KEYS.join(", ")
        ));
    }
    let value = value.trim();
    let stored = match key {
        "currency" => value.to_uppercase(),
        _ => parse_bool(value)?.to_string(),
    };
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, stored],
    )?;
    Ok(())
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("Invalid boolean '{}'", other)),
    }
}
