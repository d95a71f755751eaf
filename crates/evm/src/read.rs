// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::contracts::{LedgerRead, ReadProvider, RequestStatus, SigilRegistry};
use crate::error::LedgerError;
use alloy::{
    primitives::{Address, U256},
    providers::ProviderBuilder,
};
use async_trait::async_trait;
use sigil_config::{AppConfig, RPC};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

pub(crate) struct Endpoint {
    pub(crate) rpc: RPC,
    pub(crate) provider: Arc<ReadProvider>,
}

/// Read path of the ledger client. Reads never go through the connected
/// wallet's provider; they fan out over an ordered list of independent
/// public endpoints and the first successful decode wins.
pub struct ReadClient {
    registry: Address,
    pub(crate) endpoints: Vec<Endpoint>,
}

impl ReadClient {
    pub fn new(endpoints: Vec<RPC>, registry: Address) -> Self {
        let endpoints = endpoints
            .into_iter()
            .map(|rpc| {
                let provider = ProviderBuilder::new().connect_http(rpc.url().clone());
                Endpoint {
                    rpc,
                    provider: Arc::new(provider),
                }
            })
            .collect();

        Self {
            registry,
            endpoints,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, LedgerError> {
        let endpoints = config
            .read_endpoints()
            .map_err(|e| LedgerError::InvalidAddress(e.to_string()))?;
        let registry: Address = config
            .contracts
            .registry
            .address()
            .parse()
            .map_err(|_| LedgerError::InvalidAddress(config.contracts.registry.address().clone()))?;

        Ok(Self::new(endpoints, registry))
    }

    pub fn registry(&self) -> Address {
        self.registry
    }

    /// Runs `f` against each endpoint in order until one succeeds. Every
    /// per-endpoint failure is absorbed here; only total failure surfaces.
    pub(crate) async fn with_fallback<T, F, Fut>(
        &self,
        operation: &str,
        f: F,
    ) -> Result<T, LedgerError>
    where
        F: Fn(Arc<ReadProvider>) -> Fut,
        Fut: Future<Output = eyre::Result<T>>,
    {
        let mut errors = Vec::new();

        for endpoint in &self.endpoints {
            match f(endpoint.provider.clone()).await {
                Ok(value) => {
                    if !errors.is_empty() {
                        debug!(
                            operation,
                            failed = errors.len(),
                            "read succeeded after endpoint fallback"
                        );
                    }
                    return Ok(value);
                }
                Err(e) => {
                    let failure = LedgerError::EndpointUnavailable {
                        url: endpoint.rpc.as_http_url(),
                        reason: e.to_string(),
                    };
                    warn!(operation, error = %failure, "trying next endpoint");
                    errors.push(failure);
                }
            }
        }

        Err(LedgerError::AllEndpointsUnavailable {
            operation: operation.to_string(),
            errors,
        })
    }
}

#[async_trait]
impl LedgerRead for ReadClient {
    async fn is_verified(&self, subject: Address) -> Result<bool, LedgerError> {
        let registry = self.registry;
        self.with_fallback("isVerified", |provider| async move {
            let contract = SigilRegistry::new(registry, provider);
            let verified = contract.isVerified(subject).call().await?;
            Ok(verified)
        })
        .await
    }

    async fn active_request_of(&self, subject: Address) -> Result<U256, LedgerError> {
        let registry = self.registry;
        self.with_fallback("activeRequestOf", |provider| async move {
            let contract = SigilRegistry::new(registry, provider);
            let request_id = contract.activeRequestOf(subject).call().await?;
            Ok(request_id)
        })
        .await
    }

    async fn request_status(&self, request_id: U256) -> Result<RequestStatus, LedgerError> {
        let registry = self.registry;
        self.with_fallback("requestStatus", |provider| async move {
            let contract = SigilRegistry::new(registry, provider);
            let status = contract.requestStatus(request_id).call().await?;
            Ok(status.into())
        })
        .await
    }

    async fn credential_uri(&self, subject: Address) -> Result<String, LedgerError> {
        let registry = self.registry;
        self.with_fallback("credentialURI", |provider| async move {
            let contract = SigilRegistry::new(registry, provider);
            let uri = contract.credentialURI(subject).call().await?;
            Ok(uri)
        })
        .await
    }

    async fn await_finality(
        &self,
        tx_hash: alloy::primitives::TxHash,
        options: &crate::FinalityOptions,
    ) -> Result<(), LedgerError> {
        self.await_receipt(tx_hash, options).await.map(|_| ())
    }
}
