// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::TxHash;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// A single endpoint failed; recovered locally by trying the next one
    #[error("endpoint {url} unavailable: {reason}")]
    EndpointUnavailable { url: String, reason: String },

    /// Every candidate endpoint failed; fatal for this operation only.
    /// Carries each endpoint's error so the caller can render all of the
    /// underlying causes, not just the last one.
    #[error("all {} read endpoints unavailable for {operation}", errors.len())]
    AllEndpointsUnavailable {
        operation: String,
        errors: Vec<LedgerError>,
    },

    /// Write accepted but finality not observed within the attempt budget.
    /// Ambiguous: the write may still land, so callers must re-check state
    /// before resubmitting.
    #[error("transaction {tx_hash} not confirmed after {attempts} receipt polls")]
    ConfirmationTimeout { tx_hash: TxHash, attempts: u32 },

    #[error("invalid contract address: {0}")]
    InvalidAddress(String),

    #[error("wallet rejected or failed the submission: {0}")]
    Wallet(String),
}

impl LedgerError {
    /// Flat list of the per-endpoint reasons, for user-facing rendering.
    pub fn endpoint_errors(&self) -> Vec<String> {
        match self {
            LedgerError::AllEndpointsUnavailable { errors, .. } => {
                errors.iter().map(|e| e.to_string()).collect()
            }
            LedgerError::EndpointUnavailable { .. } => vec![self.to_string()],
            _ => vec![],
        }
    }
}
