// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: i64,
    pub name: String,
    /// Share of panel revenue owed to the site, 0-100.
    pub agreement_percentage: Decimal,
    /// Legacy external id; ledger entries may reference the site by it.
    pub code: Option<String>,
    pub address: Option<String>,
    pub advance_balance: Decimal,
    pub pending_payments: Vec<PendingEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEntry {
    pub agreement_id: i64,
    pub amount: Decimal,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgreementStatus {
    Active,
    Archived,
    Other(String),
}

impl AgreementStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "active" => Self::Active,
            "archived" => Self::Archived,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
            Self::Other(s) => s.as_str(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agreement {
    pub id: i64,
    pub company_id: i64,
    /// Referenced sites in the order they were entered; may repeat.
    pub site_ids: Vec<i64>,
    pub panel_counts: BTreeMap<i64, i64>,
    pub weekly_rate_per_panel: Decimal,
    pub ranges: Vec<DateRange>,
    pub status: AgreementStatus,
}

impl Agreement {
    pub fn panel_count(&self, site_id: i64) -> i64 {
        self.panel_counts.get(&site_id).copied().unwrap_or(0)
    }

    pub fn is_archived(&self) -> bool {
        self.status == AgreementStatus::Archived
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub site_id: Option<String>,
    pub agreement_ids: Vec<i64>,
    pub payment_period: Option<DateRange>,
    pub source: String,
    pub description: Option<String>,
    pub advance_used: Decimal,
    pub cash_paid: Decimal,
}

impl Transaction {
    /// Value this entry covers when matched against a computed site amount.
    pub fn covered_amount(&self) -> Decimal {
        self.amount.abs().saturating_add(self.advance_used)
    }

    pub fn free_text(&self) -> String {
        match self.description.as_deref() {
            Some(d) => format!("{} {}", self.source, d),
            None => self.source.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub site_id: Option<String>,
    pub agreement_ids: Vec<i64>,
    pub payment_period: Option<DateRange>,
    pub source: String,
    pub description: Option<String>,
    pub advance_used: Decimal,
    pub cash_paid: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct SiteUpdate {
    pub advance_balance: Option<Decimal>,
    pub pending_payments: Option<Vec<PendingEntry>>,
}
