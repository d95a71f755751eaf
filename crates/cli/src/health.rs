// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use sigil_config::AppConfig;
use sigil_gateway::{GatewayClient, HealthCheck};

pub async fn execute(config: &AppConfig) -> Result<()> {
    let gateway = GatewayClient::new(&config.gateway_url)?;
    let status = gateway.check().await;

    if status.healthy {
        let key = status.public_key.unwrap_or_default();
        println!("gateway {} is healthy", config.gateway_url);
        println!("public key: {}...{}", &key[..10.min(key.len())], &key[key.len().saturating_sub(6)..]);
    } else {
        println!(
            "gateway {} is UNHEALTHY: {}",
            config.gateway_url,
            status.reason.as_deref().unwrap_or("unknown")
        );
    }

    Ok(())
}
