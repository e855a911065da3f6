// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Data access for the payment calculator and executor.

use crate::error::{PanelError, Result};
use crate::models::{
    Agreement, AgreementStatus, Company, DateRange, NewTransaction, PendingEntry, Site,
    SiteUpdate, Transaction, TransactionKind,
};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

pub trait Store {
    fn agreements(&self) -> Result<Vec<Agreement>>;
    fn sites(&self) -> Result<Vec<Site>>;
    fn companies(&self) -> Result<Vec<Company>>;
    fn transactions(&self) -> Result<Vec<Transaction>>;
    fn create_transaction(&self, tx: &NewTransaction) -> Result<i64>;
    fn update_site(&self, id: i64, update: &SiteUpdate) -> Result<()>;
}

pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        self.conn
    }
}

fn dec(s: &str, what: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|_| PanelError::InvalidData(format!("invalid {} '{}'", what, s)))
}

fn date(s: &str, what: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| PanelError::InvalidData(format!("invalid {} '{}'", what, s)))
}

impl Store for SqliteStore<'_> {
    fn agreements(&self) -> Result<Vec<Agreement>> {
        let mut site_rows: HashMap<i64, Vec<(i64, i64)>> = HashMap::new();
        {
            let mut stmt = self.conn.prepare(
                "SELECT agreement_id, site_id, panel_count FROM agreement_sites ORDER BY agreement_id, position",
            )?;
            let rows = stmt.query_map([], |r| {
                Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?, r.get::<_, i64>(2)?))
            })?;
            for row in rows {
                let (aid, sid, count) = row?;
                site_rows.entry(aid).or_default().push((sid, count));
            }
        }

        let mut ranges: HashMap<i64, Vec<DateRange>> = HashMap::new();
        {
            let mut stmt = self.conn.prepare(
                "SELECT agreement_id, start_date, end_date FROM agreement_ranges ORDER BY agreement_id, start_date, id",
            )?;
            let rows = stmt.query_map([], |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                ))
            })?;
            for row in rows {
                let (aid, s, e) = row?;
                ranges.entry(aid).or_default().push(DateRange::new(
                    date(&s, "agreement start date")?,
                    date(&e, "agreement end date")?,
                ));
            }
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, weekly_rate_per_panel, status FROM agreements ORDER BY id",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, i64>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, company_id, rate, status) = row?;
            let mut site_ids = Vec::new();
            let mut panel_counts = BTreeMap::new();
            for (sid, count) in site_rows.remove(&id).unwrap_or_default() {
                site_ids.push(sid);
                panel_counts.insert(sid, count);
            }
            out.push(Agreement {
                id,
                company_id,
                site_ids,
                panel_counts,
                weekly_rate_per_panel: dec(&rate, "weekly rate")?,
                ranges: ranges.remove(&id).unwrap_or_default(),
                status: AgreementStatus::parse(&status),
            });
        }
        Ok(out)
    }

    fn sites(&self) -> Result<Vec<Site>> {
        let mut pending: HashMap<i64, Vec<PendingEntry>> = HashMap::new();
        {
            let mut stmt = self.conn.prepare(
                "SELECT site_id, agreement_id, amount, date_from, date_to FROM site_pending_payments ORDER BY id",
            )?;
            let rows = stmt.query_map([], |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, String>(4)?,
                ))
            })?;
            for row in rows {
                let (sid, aid, amt, from, to) = row?;
                pending.entry(sid).or_default().push(PendingEntry {
                    agreement_id: aid,
                    amount: dec(&amt, "pending amount")?,
                    date_from: date(&from, "pending date")?,
                    date_to: date(&to, "pending date")?,
                });
            }
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, name, agreement_percentage, code, address, advance_balance FROM sites ORDER BY id",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, Option<String>>(3)?,
                r.get::<_, Option<String>>(4)?,
                r.get::<_, String>(5)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, name, pct, code, address, advance) = row?;
            out.push(Site {
                id,
                agreement_percentage: dec(&pct, &format!("percentage for site {}", name))?,
                advance_balance: dec(&advance, &format!("advance for site {}", name))?,
                name,
                code,
                address,
                pending_payments: pending.remove(&id).unwrap_or_default(),
            });
        }
        Ok(out)
    }

    fn companies(&self) -> Result<Vec<Company>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, contact FROM companies ORDER BY id")?;
        let rows = stmt.query_map([], |r| {
            Ok(Company {
                id: r.get(0)?,
                name: r.get(1)?,
                contact: r.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn transactions(&self) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, kind, amount, site_id, agreement_ids, period_from, period_to, source, description, advance_used, cash_paid
             FROM transactions ORDER BY date, id",
        )?;
        let mut cur = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(r) = cur.next()? {
            let id: i64 = r.get(0)?;
            let d: String = r.get(1)?;
            let kind_s: String = r.get(2)?;
            let amount: String = r.get(3)?;
            let site_id: Option<String> = r.get(4)?;
            let agreement_ids: String = r.get(5)?;
            let period_from: Option<String> = r.get(6)?;
            let period_to: Option<String> = r.get(7)?;
            let source: String = r.get(8)?;
            let description: Option<String> = r.get(9)?;
            let advance_used: String = r.get(10)?;
            let cash_paid: String = r.get(11)?;

            let kind = TransactionKind::parse(&kind_s).ok_or_else(|| {
                PanelError::InvalidData(format!("unknown kind '{}' on transaction {}", kind_s, id))
            })?;
            let payment_period = match (period_from, period_to) {
                (Some(f), Some(t)) => Some(DateRange::new(
                    date(&f, "payment period")?,
                    date(&t, "payment period")?,
                )),
                _ => None,
            };
            out.push(Transaction {
                id,
                date: date(&d, "transaction date")?,
                kind,
                amount: dec(&amount, "transaction amount")?,
                site_id: site_id
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
                agreement_ids: serde_json::from_str(&agreement_ids)?,
                payment_period,
                source,
                description,
                advance_used: dec(&advance_used, "advance used")?,
                cash_paid: dec(&cash_paid, "cash paid")?,
            });
        }
        Ok(out)
    }

    fn create_transaction(&self, tx: &NewTransaction) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO transactions(date, kind, amount, site_id, agreement_ids, period_from, period_to, source, description, advance_used, cash_paid)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
            params![
                tx.date.to_string(),
                tx.kind.as_str(),
                tx.amount.to_string(),
                tx.site_id.as_deref().map(str::trim),
                serde_json::to_string(&tx.agreement_ids)?,
                tx.payment_period.map(|p| p.start.to_string()),
                tx.payment_period.map(|p| p.end.to_string()),
                tx.source,
                tx.description,
                tx.advance_used.to_string(),
                tx.cash_paid.to_string(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, amount = %tx.amount, "transaction created");
        Ok(id)
    }

    fn update_site(&self, id: i64, update: &SiteUpdate) -> Result<()> {
        let exists: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sites WHERE id=?1", params![id], |r| {
                r.get(0)
            })?;
        if exists == 0 {
            return Err(PanelError::NotFound(format!("site {}", id)));
        }
        if let Some(advance) = update.advance_balance {
            self.conn.execute(
                "UPDATE sites SET advance_balance=?1 WHERE id=?2",
                params![advance.to_string(), id],
            )?;
        }
        if let Some(entries) = &update.pending_payments {
            self.conn.execute(
                "DELETE FROM site_pending_payments WHERE site_id=?1",
                params![id],
            )?;
            for e in entries {
                self.conn.execute(
                    "INSERT INTO site_pending_payments(site_id, agreement_id, amount, date_from, date_to)
                     VALUES (?1,?2,?3,?4,?5)",
                    params![
                        id,
                        e.agreement_id,
                        e.amount.to_string(),
                        e.date_from.to_string(),
                        e.date_to.to_string()
                    ],
                )?;
            }
        }
        Ok(())
    }
}
