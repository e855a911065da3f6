// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Finds ledger entries that already paid a (site, agreement, window).

use crate::config::Settings;
use crate::models::{DateRange, Site, Transaction, TransactionKind};
use rust_decimal::Decimal;

/// Marker the cashier screen writes into the source of site payouts.
pub const SITE_PAYMENT_MARKER: &str = "Site Ödemesi";

#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    pub legacy_text_match: bool,
    pub strict_payment_period: bool,
}

impl From<&Settings> for MatchOptions {
    fn from(s: &Settings) -> Self {
        Self {
            legacy_text_match: s.legacy_text_match,
            strict_payment_period: s.strict_payment_period,
        }
    }
}

/// Resolves the site reference written on a ledger entry. A numeric id
/// always wins over a code; a code shared by several sites resolves to none.
pub fn resolve_site(reference: &str, sites: &[Site]) -> Option<i64> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    if let Ok(id) = reference.parse::<i64>() {
        if sites.iter().any(|s| s.id == id) {
            return Some(id);
        }
    }
    let mut by_code = sites
        .iter()
        .filter(|s| s.code.as_deref().map(str::trim) == Some(reference));
    match (by_code.next(), by_code.next()) {
        (Some(s), None) => Some(s.id),
        (Some(_), Some(_)) => {
            tracing::warn!(reference, "site code is shared by several sites");
            None
        }
        _ => None,
    }
}

/// `resolved` is the site the entry's `site_id` points at, if any. Text
/// matching only applies to entries without a usable site reference.
pub fn matches_site(
    tx: &Transaction,
    resolved: Option<i64>,
    site: &Site,
    opts: MatchOptions,
) -> bool {
    if let Some(id) = resolved {
        return id == site.id;
    }
    if opts.legacy_text_match {
        let text = tx.free_text();
        return text.contains(SITE_PAYMENT_MARKER) && text.contains(site.name.as_str());
    }
    false
}

pub fn matches_agreement(tx: &Transaction, agreement_id: i64, opts: MatchOptions) -> bool {
    if tx.agreement_ids.contains(&agreement_id) {
        return true;
    }
    if opts.legacy_text_match {
        return contains_id_token(&tx.free_text(), agreement_id);
    }
    false
}

pub fn matches_window(tx: &Transaction, window: &DateRange, opts: MatchOptions) -> bool {
    match &tx.payment_period {
        Some(p) => p == window || p.overlaps(window),
        None => !opts.strict_payment_period,
    }
}

pub fn is_match(
    tx: &Transaction,
    resolved: Option<i64>,
    site: &Site,
    agreement_id: i64,
    window: &DateRange,
    opts: MatchOptions,
) -> bool {
    tx.kind == TransactionKind::Expense
        && matches_site(tx, resolved, site, opts)
        && matches_agreement(tx, agreement_id, opts)
        && matches_window(tx, window, opts)
}

// "12" must not match inside "112" or "2024-12".
fn contains_id_token(text: &str, id: i64) -> bool {
    let id = id.to_string();
    text.split(|c: char| !(c.is_ascii_digit() || c == '-'))
        .any(|token| token == id)
}

struct Entry<'a> {
    tx: &'a Transaction,
    site: Option<i64>,
    remaining: Decimal,
}

/// Ledger entries with the amount each one still has available for matching.
/// An entry's value is spent by the first pairs that match it and is never
/// counted again.
pub struct Ledger<'a> {
    entries: Vec<Entry<'a>>,
}

impl<'a> Ledger<'a> {
    pub fn new(transactions: &'a [Transaction], sites: &[Site]) -> Self {
        let mut entries: Vec<Entry<'a>> = transactions
            .iter()
            .filter(|t| t.kind == TransactionKind::Expense)
            .map(|t| Entry {
                tx: t,
                site: t.site_id.as_deref().and_then(|r| resolve_site(r, sites)),
                remaining: t.covered_amount(),
            })
            .collect();
        entries.sort_by(|a, b| a.tx.date.cmp(&b.tx.date).then(a.tx.id.cmp(&b.tx.id)));
        Self { entries }
    }

    /// Draws up to `wanted` from matching entries and returns what was drawn.
    pub fn draw(
        &mut self,
        site: &Site,
        agreement_id: i64,
        window: &DateRange,
        wanted: Decimal,
        opts: MatchOptions,
    ) -> Decimal {
        let mut paid = Decimal::ZERO;
        for entry in self.entries.iter_mut() {
            if paid >= wanted {
                break;
            }
            if entry.remaining.is_zero()
                || !is_match(entry.tx, entry.site, site, agreement_id, window, opts)
            {
                continue;
            }
            let take = entry.remaining.min(wanted - paid);
            entry.remaining -= take;
            paid += take;
            tracing::trace!(tx = entry.tx.id, site = site.id, agreement_id, %take, "ledger match");
        }
        paid
    }
}
