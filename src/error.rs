// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

impl PanelError {
    /// Title used when the error is shown through a notifier.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Validation",
            Self::NotFound(_) => "Not found",
            Self::Store(_) | Self::Encoding(_) | Self::InvalidData(_) => "Error",
        }
    }
}

/// A failure that was already shown to the operator through a notifier.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct Reported(pub PanelError);

pub type Result<T> = std::result::Result<T, PanelError>;
