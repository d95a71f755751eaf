// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use anyhow::{Context, Result};
use sigil_config::AppConfig;
use sigil_evm::{LedgerRead, ReadClient};
use sigil_verify::{parse_credential_uri, request};

pub async fn execute(config: &AppConfig, subject: &str) -> Result<()> {
    let subject: Address = subject.parse().context("invalid subject address")?;
    let ledger = ReadClient::from_config(config)?;

    let verified = ledger.is_verified(subject).await?;
    println!("subject:  {subject}");
    println!("verified: {verified}");

    match request::active_request(&ledger, subject).await? {
        Some((id, status)) => {
            println!("request:  {id}");
            println!("  processed:   {}", status.processed);
            println!("  expired:     {}", status.expired);
            println!(
                "  retry count: {}/{}",
                status.retry_count, config.verify.max_retries
            );
            println!("  created at:  {}", status.created_at);
        }
        None => println!("request:  none"),
    }

    if verified {
        match ledger.credential_uri(subject).await {
            Ok(uri) if !uri.is_empty() => match parse_credential_uri(&uri) {
                Ok(meta) => println!("credential: {} ({})", meta.name, meta.description),
                Err(_) => println!("credential: (unreadable metadata)"),
            },
            _ => println!("credential: (no metadata)"),
        }
    }

    Ok(())
}
