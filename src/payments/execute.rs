// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::calculator::{Calculation, PaymentRequest, PaymentResult, calculate};
use super::matching::{MatchOptions, SITE_PAYMENT_MARKER};
use crate::error::{PanelError, Result};
use crate::models::{DateRange, NewTransaction, PendingEntry, SiteUpdate, TransactionKind};
use crate::notify::{AlertKind, Notifier};
use crate::store::Store;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Pending entries within this distance of a paid amount are settled by it.
pub const RECONCILE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentReceipt {
    pub transaction_id: i64,
    pub site_id: i64,
    pub total_amount: Decimal,
    pub cash_paid: Decimal,
    pub advance_used: Decimal,
    pub remaining_advance: Decimal,
    pub reconciled_entries: usize,
}

fn report(notifier: &dyn Notifier, err: PanelError) -> PanelError {
    match &err {
        PanelError::Validation(_) | PanelError::NotFound(_) => {
            tracing::warn!(error = %err, "payment rejected")
        }
        _ => tracing::error!(error = %err, "payment failed"),
    }
    notifier.alert(err.title(), &err.to_string(), AlertKind::Error);
    err
}

/// Records one payment for a calculated site row, drawing from the site's
/// advance balance before cash.
///
/// The ledger entry is written first; the site is only touched once it
/// exists.
pub fn execute_payment(
    store: &dyn Store,
    notifier: &dyn Notifier,
    result: &PaymentResult,
    window: DateRange,
    today: NaiveDate,
) -> Result<PaymentReceipt> {
    if result.total_amount <= Decimal::ZERO || result.payments.is_empty() {
        return Err(report(
            notifier,
            PanelError::Validation(format!("nothing to pay for {}", result.site_name)),
        ));
    }
    let site = store
        .sites()
        .map_err(|e| report(notifier, e))?
        .into_iter()
        .find(|s| s.id == result.site_id)
        .ok_or_else(|| report(notifier, PanelError::NotFound(format!("site {}", result.site_id))))?;

    let total = result.total_amount;
    let advance = site.advance_balance.max(Decimal::ZERO);
    let amount_to_pay = (total - advance).max(Decimal::ZERO);
    let remaining_advance = (advance - total).max(Decimal::ZERO);
    let advance_used = total - amount_to_pay;

    let agreement_ids: Vec<i64> = result.payments.iter().map(|p| p.agreement_id).collect();
    let description = result
        .payments
        .iter()
        .map(|p| format!("#{} {}w x{} = {}", p.agreement_id, p.weeks_in_range, p.panel_count, p.amount))
        .collect::<Vec<_>>()
        .join(", ");
    let new_tx = NewTransaction {
        date: today,
        kind: TransactionKind::Expense,
        amount: if amount_to_pay.is_zero() {
            Decimal::ZERO
        } else {
            -amount_to_pay
        },
        site_id: Some(site.id.to_string()),
        agreement_ids,
        payment_period: Some(window),
        source: format!("{} - {}", SITE_PAYMENT_MARKER, site.name),
        description: Some(format!("{} ({})", description, window)),
        advance_used,
        cash_paid: amount_to_pay,
    };
    let transaction_id = store
        .create_transaction(&new_tx)
        .map_err(|e| report(notifier, e))?;

    let mut remaining_entries = site.pending_payments.clone();
    let mut reconciled = 0;
    for p in &result.payments {
        let hit = remaining_entries.iter().position(|e| {
            e.agreement_id == p.agreement_id && (e.amount - p.amount).abs() <= RECONCILE_TOLERANCE
        });
        if let Some(i) = hit {
            remaining_entries.remove(i);
            reconciled += 1;
        }
    }
    let update = SiteUpdate {
        advance_balance: Some(remaining_advance),
        pending_payments: (reconciled > 0).then_some(remaining_entries),
    };
    store
        .update_site(site.id, &update)
        .map_err(|e| report(notifier, e))?;

    tracing::info!(
        site = site.id,
        transaction_id,
        %total,
        cash = %amount_to_pay,
        advance = %advance_used,
        "site payment recorded"
    );
    notifier.alert(
        "Payment recorded",
        &format!(
            "{}: {} paid ({} cash, {} from advance)",
            site.name, total, amount_to_pay, advance_used
        ),
        AlertKind::Success,
    );
    Ok(PaymentReceipt {
        transaction_id,
        site_id: site.id,
        total_amount: total,
        cash_paid: amount_to_pay,
        advance_used,
        remaining_advance,
        reconciled_entries: reconciled,
    })
}

/// Calculates one site's amount for the window, asks for confirmation and
/// pays it. Returns `None` when the operator declines.
pub fn pay_site(
    store: &dyn Store,
    notifier: &dyn Notifier,
    site_id: i64,
    window: DateRange,
    opts: MatchOptions,
    today: NaiveDate,
) -> Result<Option<PaymentReceipt>> {
    let req = PaymentRequest::new(Some(window.start), Some(window.end), Some(vec![site_id]))
        .map_err(|e| report(notifier, e))?;
    let calc = load_and_calculate(store, &req, opts).map_err(|e| report(notifier, e))?;
    let Some(result) = calc.result_for(site_id) else {
        return Err(report(
            notifier,
            PanelError::Validation(format!("site {} has nothing pending for {}", site_id, window)),
        ));
    };
    let question = format!(
        "Pay {} to {} for {} agreement(s) in {}?",
        result.total_amount,
        result.site_name,
        result.payments.len(),
        window
    );
    if !notifier.confirm("Confirm payment", &question) {
        tracing::info!(site = site_id, "payment cancelled by operator");
        return Ok(None);
    }
    execute_payment(store, notifier, result, window, today).map(Some)
}

pub fn load_and_calculate(
    store: &dyn Store,
    req: &PaymentRequest,
    opts: MatchOptions,
) -> Result<Calculation> {
    let agreements = store.agreements()?;
    let sites = store.sites()?;
    let companies = store.companies()?;
    let transactions = store.transactions()?;
    Ok(calculate(req, &agreements, &sites, &companies, &transactions, opts))
}

/// Stores each calculated breakdown as a pending entry on its site,
/// replacing any entry for the same agreement and window.
pub fn track_pending(store: &dyn Store, calc: &Calculation) -> Result<usize> {
    let sites = store.sites()?;
    let mut tracked = 0;
    for result in &calc.results {
        let Some(site) = sites.iter().find(|s| s.id == result.site_id) else {
            continue;
        };
        let mut entries: Vec<PendingEntry> = site
            .pending_payments
            .iter()
            .filter(|e| {
                !(e.date_from == calc.window.start
                    && e.date_to == calc.window.end
                    && result.payments.iter().any(|p| p.agreement_id == e.agreement_id))
            })
            .cloned()
            .collect();
        for p in &result.payments {
            entries.push(PendingEntry {
                agreement_id: p.agreement_id,
                amount: p.amount,
                date_from: calc.window.start,
                date_to: calc.window.end,
            });
            tracked += 1;
        }
        store.update_site(
            site.id,
            &SiteUpdate {
                advance_balance: None,
                pending_payments: Some(entries),
            },
        )?;
    }
    Ok(tracked)
}
