// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::{SqliteStore, Store};
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::HashSet;

/// Returns `(issue, detail)` pairs for data the calculator would skip or
/// misprice.
pub fn check(conn: &Connection) -> Result<Vec<(String, String)>> {
    let store = SqliteStore::new(conn);
    let sites = store.sites()?;
    let site_ids: HashSet<i64> = sites.iter().map(|s| s.id).collect();
    let company_ids: HashSet<i64> = store.companies()?.iter().map(|c| c.id).collect();
    let mut issues = Vec::new();

    for a in store.agreements()?.iter().filter(|a| !a.is_archived()) {
        if !company_ids.contains(&a.company_id) {
            issues.push((
                "agreement_missing_company".into(),
                format!("#{} -> company {}", a.id, a.company_id),
            ));
        }
        if a.ranges.is_empty() {
            issues.push(("agreement_without_range".into(), format!("#{}", a.id)));
        }
        for r in a.ranges.iter().filter(|r| r.start > r.end) {
            issues.push(("inverted_range".into(), format!("#{} {}", a.id, r)));
        }
        for sid in &a.site_ids {
            if !site_ids.contains(sid) {
                issues.push((
                    "agreement_missing_site".into(),
                    format!("#{} -> site {}", a.id, sid),
                ));
            } else if a.panel_count(*sid) <= 0 {
                issues.push((
                    "zero_panels".into(),
                    format!("#{} site {}", a.id, sid),
                ));
            }
        }
    }

    for s in &sites {
        if s.agreement_percentage < Decimal::ZERO || s.agreement_percentage > Decimal::ONE_HUNDRED {
            issues.push((
                "percentage_out_of_range".into(),
                format!("{} ({}%)", s.name, s.agreement_percentage),
            ));
        }
        if s.advance_balance < Decimal::ZERO {
            issues.push(("negative_advance".into(), format!("{} ({})", s.name, s.advance_balance)));
        }
    }
    Ok(issues)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let issues = check(conn)?;
    if issues.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        let rows = issues.into_iter().map(|(i, d)| vec![i, d]).collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
