// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::VerifyError;
use crate::policy::{decide, RetryDecision, RetryPolicy};
use alloy_primitives::{Address, U256};
use sigil_evm::{LedgerRead, RequestStatus};

/// The subject's current request, if the subject→request index holds one.
/// A zero id means no request was ever recorded. The ledger owns the
/// index; this only interprets what it reports.
pub async fn active_request<L>(
    ledger: &L,
    subject: Address,
) -> Result<Option<(U256, RequestStatus)>, VerifyError>
where
    L: LedgerRead + Sync + ?Sized,
{
    let request_id = ledger.active_request_of(subject).await?;
    if request_id.is_zero() {
        return Ok(None);
    }

    let status = ledger.request_status(request_id).await?;
    if !status.exists {
        return Ok(None);
    }

    Ok(Some((request_id, status)))
}

/// Re-reads the request and applies the retry policy to the fresh status.
pub async fn evaluate<L>(
    ledger: &L,
    request_id: U256,
    policy: &RetryPolicy,
    now: u64,
) -> Result<(RequestStatus, RetryDecision), VerifyError>
where
    L: LedgerRead + Sync + ?Sized,
{
    let status = ledger.request_status(request_id).await?;
    let decision = decide(&status, policy, now);
    Ok((status, decision))
}
