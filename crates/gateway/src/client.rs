// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::GatewayError;
use crate::health::{validate_public_key, GatewayStatus, HealthCheck};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

/// Everything the gateway needs to locate one ciphertext: the handle plus
/// the contract and chain it was produced on.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DecryptContext {
    pub handle: String,
    pub contract_address: String,
    pub chain_id: u64,
}

/// The gateway's decryption result for one handle
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DecryptionPayload {
    pub handle: String,
    /// Hex-encoded plaintext, e.g. "0x01"
    pub plaintext: String,
    #[serde(default)]
    pub signature: Option<String>,
}

impl DecryptionPayload {
    /// Interprets the plaintext as a boolean: any non-zero byte is true.
    pub fn as_bool(&self) -> Result<bool, GatewayError> {
        let stripped = self.plaintext.trim_start_matches("0x");
        let bytes = hex::decode(stripped)
            .map_err(|e| GatewayError::BadResponse(format!("non-hex plaintext: {e}")))?;
        if bytes.is_empty() {
            return Err(GatewayError::BadResponse("empty plaintext".to_string()));
        }
        Ok(bytes.iter().any(|b| *b != 0))
    }
}

/// Outcome of a single oracle round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleResponse {
    Ready(DecryptionPayload),
    NotReady,
    /// Anything that is neither success nor not-found: logged and retried
    /// within the poll budget, never an early abort
    Transient(String),
}

#[async_trait]
pub trait DecryptionOracle: Send + Sync {
    async fn request_decryption(&self, ctx: &DecryptContext) -> OracleResponse;
}

#[derive(Debug, Clone)]
pub struct PollOptions {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_millis(5000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollOutcome {
    pub payload: DecryptionPayload,
    pub attempts_used: u32,
}

/// Polls the oracle at a fixed interval until it reports a result or the
/// attempt budget runs out. Fixed interval on purpose: the gateway's
/// processing latency is roughly constant, unlike the transient RPC faults
/// the write path backs off from.
pub async fn poll_decryption<O>(
    oracle: &O,
    ctx: &DecryptContext,
    options: &PollOptions,
    mut on_progress: impl FnMut(u32, u8) + Send,
) -> Result<PollOutcome, GatewayError>
where
    O: DecryptionOracle + ?Sized,
{
    for attempt in 1..=options.max_attempts {
        let percent = (attempt * 100 / options.max_attempts).min(100) as u8;
        on_progress(attempt, percent);

        match oracle.request_decryption(ctx).await {
            OracleResponse::Ready(payload) => {
                info!(attempt, handle = %ctx.handle, "decryption ready");
                return Ok(PollOutcome {
                    payload,
                    attempts_used: attempt,
                });
            }
            OracleResponse::NotReady => {
                debug!(attempt, handle = %ctx.handle, "decryption not ready yet");
            }
            OracleResponse::Transient(reason) => {
                warn!(attempt, handle = %ctx.handle, reason, "gateway poll attempt failed");
            }
        }

        if attempt < options.max_attempts {
            sleep(options.interval).await;
        }
    }

    Err(GatewayError::PollTimeout {
        attempts: options.max_attempts,
    })
}

/// HTTP client for the decryption gateway
#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: Url,
    client: reqwest::Client,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        let base_url: Url = base_url
            .parse()
            .map_err(|_| GatewayError::InvalidUrl(base_url.to_string()))?;

        Ok(Self {
            base_url,
            client: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        self.base_url
            .join(path)
            .map_err(|e| GatewayError::InvalidUrl(format!("{path}: {e}")))
    }
}

#[async_trait]
impl DecryptionOracle for GatewayClient {
    async fn request_decryption(&self, ctx: &DecryptContext) -> OracleResponse {
        let url = match self.endpoint("decrypt") {
            Ok(url) => url,
            Err(e) => return OracleResponse::Transient(e.to_string()),
        };

        match self.client.post(url).json(ctx).send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<DecryptionPayload>().await
            {
                Ok(payload) => OracleResponse::Ready(payload),
                Err(e) => OracleResponse::Transient(format!("undecodable payload: {e}")),
            },
            Ok(resp) if resp.status() == StatusCode::NOT_FOUND => OracleResponse::NotReady,
            Ok(resp) => OracleResponse::Transient(format!("unexpected status {}", resp.status())),
            Err(e) => OracleResponse::Transient(e.to_string()),
        }
    }
}

#[async_trait]
impl HealthCheck for GatewayClient {
    async fn check(&self) -> GatewayStatus {
        let url = match self.endpoint("public-key") {
            Ok(url) => url,
            Err(e) => return GatewayStatus::unhealthy(e.to_string()),
        };

        let resp = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => return GatewayStatus::unhealthy(e.to_string()),
        };

        if !resp.status().is_success() {
            return GatewayStatus::unhealthy(format!("status {}", resp.status()));
        }

        let key = match resp.text().await {
            Ok(key) => key.trim().to_string(),
            Err(e) => return GatewayStatus::unhealthy(e.to_string()),
        };

        match validate_public_key(&key) {
            Ok(()) => GatewayStatus::healthy(key),
            Err(reason) => GatewayStatus::unhealthy(reason),
        }
    }
}
