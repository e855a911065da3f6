// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::matching::{Ledger, MatchOptions};
use super::overlap::weeks_in_range;
use crate::error::{PanelError, Result};
use crate::models::{Agreement, Company, DateRange, Site, Transaction};
use crate::utils::turkish_cmp;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub window: DateRange,
    /// `None` means every site.
    pub site_ids: Option<Vec<i64>>,
}

impl PaymentRequest {
    pub fn new(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        site_ids: Option<Vec<i64>>,
    ) -> Result<Self> {
        let (Some(from), Some(to)) = (from, to) else {
            return Err(PanelError::Validation(
                "a start and end date are required".into(),
            ));
        };
        if from > to {
            return Err(PanelError::Validation(format!(
                "start date {} is after end date {}",
                from, to
            )));
        }
        if matches!(&site_ids, Some(ids) if ids.is_empty()) {
            return Err(PanelError::Validation("no sites selected".into()));
        }
        Ok(Self {
            window: DateRange::new(from, to),
            site_ids,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentBreakdown {
    pub agreement_id: i64,
    pub company_id: i64,
    pub company_name: Option<String>,
    pub panel_count: i64,
    pub weeks_in_range: i64,
    pub weekly_rate_per_panel: Decimal,
    pub agreement_percentage: Decimal,
    /// Still owed after matching the ledger.
    pub amount: Decimal,
    /// Owed for the window before matching the ledger.
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub is_paid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentResult {
    pub site_id: i64,
    pub site_name: String,
    pub total_amount: Decimal,
    pub payments: Vec<PaymentBreakdown>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Archived,
    NoOverlap,
    MissingSite,
    NoPanels,
    NonPositiveAmount,
    /// The amount does not fit in a decimal.
    AmountOverflow,
    FullyPaid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Skipped {
    pub agreement_id: i64,
    pub site_id: Option<i64>,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Calculation {
    pub window: DateRange,
    pub results: Vec<PaymentResult>,
    pub skipped: Vec<Skipped>,
}

impl Calculation {
    pub fn result_for(&self, site_id: i64) -> Option<&PaymentResult> {
        self.results.iter().find(|r| r.site_id == site_id)
    }

    pub fn grand_total(&self) -> Decimal {
        self.results
            .iter()
            .fold(Decimal::ZERO, |acc, r| acc.saturating_add(r.total_amount))
    }
}

/// `panels x rate x weeks x percentage / 100` rounded to cents, or `None`
/// when an intermediate product overflows.
pub fn share_of(
    panel_count: i64,
    weekly_rate: Decimal,
    weeks: i64,
    percentage: Decimal,
) -> Option<Decimal> {
    Decimal::from(panel_count)
        .checked_mul(weekly_rate)?
        .checked_mul(Decimal::from(weeks))?
        .checked_mul(percentage)?
        .checked_div(Decimal::ONE_HUNDRED)
        .map(|v| v.round_dp(2))
}

/// Computes what every site is owed for the requested window.
///
/// Agreements are visited by id and sites in the order the agreement lists
/// them, which fixes the order in which ledger entries are consumed. Inputs
/// are not modified, so the same inputs always give the same result.
pub fn calculate(
    req: &PaymentRequest,
    agreements: &[Agreement],
    sites: &[Site],
    companies: &[Company],
    transactions: &[Transaction],
    opts: MatchOptions,
) -> Calculation {
    let window = req.window;
    let site_by_id: HashMap<i64, &Site> = sites.iter().map(|s| (s.id, s)).collect();
    let company_by_id: HashMap<i64, &Company> = companies.iter().map(|c| (c.id, c)).collect();
    let wanted: Option<HashSet<i64>> = req
        .site_ids
        .as_ref()
        .map(|ids| ids.iter().copied().collect());

    let mut ordered: Vec<&Agreement> = agreements.iter().collect();
    ordered.sort_by_key(|a| a.id);

    let mut ledger = Ledger::new(transactions, sites);
    let mut by_site: BTreeMap<i64, PaymentResult> = BTreeMap::new();
    let mut skipped = Vec::new();
    let mut skip = |agreement_id: i64, site_id: Option<i64>, reason: SkipReason| {
        skipped.push(Skipped {
            agreement_id,
            site_id,
            reason,
        })
    };

    for agreement in ordered {
        if agreement.is_archived() {
            skip(agreement.id, None, SkipReason::Archived);
            continue;
        }
        let weeks = weeks_in_range(&agreement.ranges, &window);
        if weeks == 0 {
            skip(agreement.id, None, SkipReason::NoOverlap);
            continue;
        }
        let company_name = match company_by_id.get(&agreement.company_id) {
            Some(c) => Some(c.name.clone()),
            None => {
                tracing::warn!(
                    agreement = agreement.id,
                    company = agreement.company_id,
                    "agreement references unknown company"
                );
                None
            }
        };

        let mut seen = HashSet::new();
        for &site_id in &agreement.site_ids {
            if !seen.insert(site_id) {
                continue;
            }
            if wanted.as_ref().is_some_and(|w| !w.contains(&site_id)) {
                continue;
            }
            let Some(site) = site_by_id.get(&site_id).copied() else {
                tracing::warn!(agreement = agreement.id, site = site_id, "site not found");
                skip(agreement.id, Some(site_id), SkipReason::MissingSite);
                continue;
            };
            let panel_count = agreement.panel_count(site_id);
            if panel_count <= 0 {
                skip(agreement.id, Some(site_id), SkipReason::NoPanels);
                continue;
            }

            let Some(raw) = share_of(
                panel_count,
                agreement.weekly_rate_per_panel,
                weeks,
                site.agreement_percentage,
            ) else {
                tracing::warn!(agreement = agreement.id, site = site_id, "amount overflows");
                skip(agreement.id, Some(site_id), SkipReason::AmountOverflow);
                continue;
            };
            if raw <= Decimal::ZERO {
                skip(agreement.id, Some(site_id), SkipReason::NonPositiveAmount);
                continue;
            }

            let paid = ledger.draw(site, agreement.id, &window, raw, opts);
            let pending = (raw - paid).max(Decimal::ZERO);
            if pending <= Decimal::ZERO {
                skip(agreement.id, Some(site_id), SkipReason::FullyPaid);
                continue;
            }

            let so_far = by_site
                .get(&site_id)
                .map_or(Decimal::ZERO, |r| r.total_amount);
            let Some(total) = so_far.checked_add(pending) else {
                tracing::warn!(agreement = agreement.id, site = site_id, "site total overflows");
                skip(agreement.id, Some(site_id), SkipReason::AmountOverflow);
                continue;
            };
            let entry = by_site.entry(site_id).or_insert_with(|| PaymentResult {
                site_id,
                site_name: site.name.clone(),
                total_amount: Decimal::ZERO,
                payments: Vec::new(),
            });
            entry.total_amount = total;
            entry.payments.push(PaymentBreakdown {
                agreement_id: agreement.id,
                company_id: agreement.company_id,
                company_name: company_name.clone(),
                panel_count,
                weeks_in_range: weeks,
                weekly_rate_per_panel: agreement.weekly_rate_per_panel,
                agreement_percentage: site.agreement_percentage,
                amount: pending,
                total_amount: raw,
                paid_amount: paid,
                is_paid: paid >= raw,
            });
        }
    }

    let mut results: Vec<PaymentResult> = by_site.into_values().collect();
    results.sort_by(|a, b| turkish_cmp(&a.site_name, &b.site_name).then(a.site_id.cmp(&b.site_id)));
    tracing::debug!(
        window = %window,
        sites = results.len(),
        skipped = skipped.len(),
        "payment calculation finished"
    );
    Calculation {
        window,
        results,
        skipped,
    }
}
