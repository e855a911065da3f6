// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! User-facing message sink. Payment code reports validation failures and
//! asks for confirmation through a [`Notifier`] handed to it by the caller.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Info,
    Success,
    Warning,
    Error,
}

impl AlertKind {
    fn label(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "ok",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

pub trait Notifier {
    fn alert(&self, title: &str, message: &str, kind: AlertKind);
    fn confirm(&self, title: &str, message: &str) -> bool;
}

/// Writes alerts to stderr and reads y/N confirmations from stdin.
pub struct ConsoleNotifier {
    assume_yes: bool,
}

impl ConsoleNotifier {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Notifier for ConsoleNotifier {
    fn alert(&self, title: &str, message: &str, kind: AlertKind) {
        eprintln!("[{}] {}: {}", kind.label(), title, message);
    }

    fn confirm(&self, title: &str, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{}: {} [y/N] ", title, message);
        let _ = io::stderr().flush();
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().to_lowercase().as_str(), "y" | "yes" | "e" | "evet")
    }
}

/// Keeps every alert in memory; confirmations return a fixed answer.
#[derive(Default)]
pub struct MemoryNotifier {
    pub answer: bool,
    alerts: RefCell<Vec<(String, String, AlertKind)>>,
}

impl MemoryNotifier {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            alerts: RefCell::new(Vec::new()),
        }
    }

    pub fn alerts(&self) -> Vec<(String, String, AlertKind)> {
        self.alerts.borrow().clone()
    }
}

impl Notifier for MemoryNotifier {
    fn alert(&self, title: &str, message: &str, kind: AlertKind) {
        self.alerts
            .borrow_mut()
            .push((title.to_string(), message.to_string(), kind));
    }

    fn confirm(&self, _title: &str, _message: &str) -> bool {
        self.answer
    }
}
