// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use async_trait::async_trait;

/// Uncompressed SEC1 point prefix the gateway's published key must carry
pub const GATEWAY_KEY_PREFIX: &str = "0x04";
/// Minimum length of the published key string, prefix included
pub const GATEWAY_KEY_MIN_LEN: usize = 130;

/// A point-in-time liveness snapshot of the gateway. Passed explicitly to
/// whoever needs it; there is no shared mutable status singleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayStatus {
    pub healthy: bool,
    pub public_key: Option<String>,
    /// Why the gateway was judged unhealthy, when it was
    pub reason: Option<String>,
}

impl GatewayStatus {
    pub fn healthy(public_key: String) -> Self {
        Self {
            healthy: true,
            public_key: Some(public_key),
            reason: None,
        }
    }

    pub fn unhealthy(reason: impl Into<String>) -> Self {
        Self {
            healthy: false,
            public_key: None,
            reason: Some(reason.into()),
        }
    }
}

/// Injectable health probe; the production implementation hits the
/// gateway's public-key endpoint, tests substitute their own.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> GatewayStatus;
}

/// A well-formed gateway key starts with the uncompressed-point prefix and
/// meets the minimum length.
pub fn validate_public_key(key: &str) -> Result<(), String> {
    let key = key.trim();
    if !key.starts_with(GATEWAY_KEY_PREFIX) {
        return Err(format!(
            "public key does not start with {GATEWAY_KEY_PREFIX}"
        ));
    }
    if key.len() < GATEWAY_KEY_MIN_LEN {
        return Err(format!(
            "public key shorter than {GATEWAY_KEY_MIN_LEN} chars ({})",
            key.len()
        ));
    }
    Ok(())
}
