// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use sigil_evm::LedgerError;
use sigil_gateway::GatewayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifyError {
    /// The encryption step produced an empty or malformed payload. Raised
    /// before any network call is made.
    #[error("encrypted input is empty or malformed")]
    InvalidEncryptionResult,

    /// The oracle finished but the on-chain callback never landed within
    /// the wait budget. A slow block producer is as likely as a real
    /// failure, so this surfaces as "check back later", not as fatal.
    #[error("on-chain callback not observed within {waited_secs}s")]
    CallbackTimeout { waited_secs: u64 },

    /// The lineage's retry budget is spent. Terminal: only a brand-new
    /// submission (new lineage) can make progress.
    #[error("retry budget exhausted after {retry_count} lifecycle retries")]
    RetryExhausted { retry_count: u8 },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("unreadable credential metadata: {0}")]
    Credential(String),

    #[error("{0}")]
    Other(String),
}
