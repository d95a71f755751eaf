// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::LedgerError;
use crate::read::ReadClient;
use alloy::{primitives::TxHash, providers::Provider, rpc::types::TransactionReceipt};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct FinalityOptions {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for FinalityOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 30,
        }
    }
}

impl ReadClient {
    /// Picks the first endpoint that answers a block-number probe. The
    /// wallet's own confirmation primitive is not consulted; it can hang
    /// indefinitely on degraded connections.
    pub(crate) async fn select_live_endpoint(
        &self,
    ) -> Result<&crate::read::Endpoint, LedgerError> {
        let mut errors = Vec::new();

        for endpoint in &self.endpoints {
            match endpoint.provider.get_block_number().await {
                Ok(block) => {
                    debug!(
                        url = %endpoint.rpc.as_http_url(),
                        block,
                        "selected live endpoint for finality polling"
                    );
                    return Ok(endpoint);
                }
                Err(e) => {
                    let failure = LedgerError::EndpointUnavailable {
                        url: endpoint.rpc.as_http_url(),
                        reason: e.to_string(),
                    };
                    warn!(error = %failure, "liveness probe failed");
                    errors.push(failure);
                }
            }
        }

        Err(LedgerError::AllEndpointsUnavailable {
            operation: "eth_blockNumber".to_string(),
            errors,
        })
    }

    /// Polls a live public endpoint for the transaction receipt at a fixed
    /// interval. Exceeding the attempt budget fails with
    /// `ConfirmationTimeout`; the write may still land later, so callers
    /// re-check on-chain state before resubmitting.
    pub async fn await_receipt(
        &self,
        tx_hash: TxHash,
        options: &FinalityOptions,
    ) -> Result<TransactionReceipt, LedgerError> {
        let endpoint = self.select_live_endpoint().await?;

        for attempt in 1..=options.max_attempts {
            match endpoint.provider.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    info!(tx = %tx_hash, attempt, "transaction confirmed");
                    return Ok(receipt);
                }
                Ok(None) => {
                    debug!(tx = %tx_hash, attempt, "receipt not yet available");
                }
                Err(e) => {
                    warn!(tx = %tx_hash, attempt, error = %e, "receipt poll failed");
                }
            }

            if attempt < options.max_attempts {
                sleep(options.interval).await;
            }
        }

        Err(LedgerError::ConfirmationTimeout {
            tx_hash,
            attempts: options.max_attempts,
        })
    }
}
