// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::contract::ContractAddresses;
use crate::rpc::RPC;
use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Vendor-specific flags reported by the connected wallet. Probed once at
/// connection time; never inspected again after the submit style is chosen.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct WalletProfile {
    /// Vendor identifier as reported by the wallet, e.g. "metamask"
    pub vendor: Option<String>,
    /// Contract-account wallets route calls through their own entrypoint
    pub is_contract_account: bool,
    /// Session-key wallets sign with a delegated key
    pub uses_session_keys: bool,
}

/// Tuning knobs for the decryption-request lifecycle. All durations are
/// given in the unit of their suffix.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct VerifyConfig {
    /// Attempts against the gateway before the poll budget is exhausted
    pub poll_max_attempts: u32,
    /// Fixed interval between gateway poll attempts
    pub poll_interval_ms: u64,
    /// Fixed interval between on-chain callback checks
    pub callback_interval_ms: u64,
    /// Bound on waiting for the on-chain callback to land
    pub callback_max_wait_ms: u64,
    /// Hard timeout wrapped around the polling/await phases
    pub overall_timeout_ms: u64,
    /// Transmission-level submit retries (transient RPC faults only)
    pub submit_max_attempts: u32,
    /// Base delay for the submit backoff, doubled per attempt
    pub submit_base_delay_ms: u64,
    /// Lifecycle retries across a request lineage
    pub max_retries: u8,
    /// Window after which an unprocessed request is considered stale
    pub request_timeout_secs: u64,
    /// Minimum age of a request before it becomes retry-eligible
    pub retry_cooldown_secs: u64,
    /// Fixed interval between receipt polls when awaiting finality
    pub finality_interval_ms: u64,
    /// Receipt poll attempts before finality is reported as timed out
    pub finality_max_attempts: u32,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            poll_max_attempts: 60,
            poll_interval_ms: 5000,
            callback_interval_ms: 2000,
            callback_max_wait_ms: 120_000,
            overall_timeout_ms: 120_000,
            submit_max_attempts: 3,
            submit_base_delay_ms: 5000,
            max_retries: 3,
            request_timeout_secs: 30 * 60,
            retry_cooldown_secs: 5 * 60,
            finality_interval_ms: 2000,
            finality_max_attempts: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Chain the registry is deployed on
    pub chain_id: u64,
    /// Deployed contract addresses
    pub contracts: ContractAddresses,
    /// Ordered list of public read endpoints, tried in sequence
    pub rpc_endpoints: Vec<String>,
    /// Base URL of the decryption gateway
    pub gateway_url: String,
    /// Flags describing the connected wallet
    pub wallet: WalletProfile,
    /// Lifecycle tuning
    pub verify: VerifyConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chain_id: 11_155_111,
            contracts: ContractAddresses::default(),
            rpc_endpoints: vec![],
            gateway_url: "http://localhost:7077".to_string(),
            wallet: WalletProfile::default(),
            verify: VerifyConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration by layering defaults, an optional YAML file and
    /// `SIGIL_`-prefixed environment variables, then validates the result.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        if let Some(path) = config_file {
            figment = figment.merge(Yaml::file(path));
        }

        let config: AppConfig = figment
            .merge(Env::prefixed("SIGIL_").split("__"))
            .extract()
            .context("Failed to load configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Parsed read endpoints, preserving configured order.
    pub fn read_endpoints(&self) -> Result<Vec<RPC>> {
        self.rpc_endpoints
            .iter()
            .map(|url| RPC::from_url(url))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.rpc_endpoints.is_empty() {
            bail!("at least one rpc endpoint must be configured");
        }
        for url in &self.rpc_endpoints {
            RPC::from_url(url).with_context(|| format!("invalid rpc endpoint: {url}"))?;
        }
        if self.contracts.registry.address().is_empty() {
            bail!("contracts.registry must be configured");
        }
        if self.verify.request_timeout_secs == 0 {
            bail!("verify.request_timeout_secs must be non-zero");
        }
        if self.verify.retry_cooldown_secs >= self.verify.request_timeout_secs {
            // Intended ordering is cool-down < timeout; a longer cool-down
            // delays retries past staleness but is not a correctness issue.
            warn!(
                cooldown = self.verify.retry_cooldown_secs,
                timeout = self.verify.request_timeout_secs,
                "retry cool-down is not shorter than the request timeout"
            );
        }
        Ok(())
    }
}
