// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Site payment proration: which agreements overlap a reporting window, how
//! much each site is owed for them, and how much the ledger already covers.

pub mod calculator;
pub mod execute;
pub mod matching;
pub mod overlap;

pub use calculator::{
    Calculation, PaymentBreakdown, PaymentRequest, PaymentResult, SkipReason, Skipped, calculate,
};
pub use execute::{PaymentReceipt, execute_payment, load_and_calculate, pay_site, track_pending};
pub use matching::MatchOptions;
