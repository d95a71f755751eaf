// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::VerifyError;
use crate::progress::{ProgressSink, VerifyPhase};
use alloy_primitives::{Address, U256};
use sigil_evm::LedgerRead;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ReconcilerOptions {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(120),
        }
    }
}

/// Waits for the ledger's callback transaction to land. Gateway completion
/// only proves the off-chain computation finished; the authoritative state
/// is durable only once `processed`/`isVerified` flip on chain, and those
/// two events have independent latency.
pub async fn await_onchain_completion<L>(
    ledger: &L,
    subject: Address,
    request_id: U256,
    options: &ReconcilerOptions,
    progress: &dyn ProgressSink,
) -> Result<(), VerifyError>
where
    L: LedgerRead + Sync + ?Sized,
{
    let attempts = (options.max_wait.as_millis() / options.interval.as_millis().max(1)).max(1) as u32;

    for attempt in 1..=attempts {
        let percent = (attempt * 100 / attempts).min(100) as u8;
        progress.on_progress(VerifyPhase::AwaitingCallback, percent);

        match ledger.is_verified(subject).await {
            Ok(true) => {
                info!(%subject, attempt, "verification flag observed on chain");
                return Ok(());
            }
            Ok(false) => match ledger.request_status(request_id).await {
                Ok(status) if status.processed => {
                    info!(%request_id, attempt, "request marked processed on chain");
                    return Ok(());
                }
                Ok(_) => {
                    debug!(%request_id, attempt, "callback not yet mined");
                }
                Err(e) => {
                    warn!(%request_id, attempt, error = %e, "status read failed during reconciliation");
                }
            },
            Err(e) => {
                warn!(%subject, attempt, error = %e, "verification read failed during reconciliation");
            }
        }

        if attempt < attempts {
            sleep(options.interval).await;
        }
    }

    Err(VerifyError::CallbackTimeout {
        waited_secs: options.max_wait.as_secs(),
    })
}
