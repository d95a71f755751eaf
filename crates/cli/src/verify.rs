// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{Context, Result};
use sigil_config::AppConfig;
use sigil_evm::{ReadClient, WriteClient};
use sigil_gateway::GatewayClient;
use sigil_verify::{
    InputEncryptor, Orchestrator, PlaceholderEncryptor, ProgressSink, VerifyOptions, VerifyPhase,
};
use std::env;
use std::sync::{Arc, Mutex};

const PRIVATE_KEY_VAR: &str = "SIGIL_PRIVATE_KEY";

/// Prints phase transitions and every tenth percent, terminal states always.
struct ConsoleProgress {
    last: Mutex<Option<(VerifyPhase, u8)>>,
}

impl ProgressSink for ConsoleProgress {
    fn on_progress(&self, phase: VerifyPhase, percent: u8) {
        let mut last = self.last.lock().unwrap();
        let phase_changed = last.map(|(p, _)| p != phase).unwrap_or(true);
        let decile = percent / 10 != last.map(|(_, pct)| pct / 10).unwrap_or(11);

        if phase_changed || decile || phase.is_terminal() {
            println!("  [{phase:?}] {percent}%");
        }
        *last = Some((phase, percent));
    }
}

pub async fn execute(config: &AppConfig, age: u8) -> Result<()> {
    let private_key = env::var(PRIVATE_KEY_VAR)
        .with_context(|| format!("set {PRIVATE_KEY_VAR} to the submitting wallet's key"))?;
    env::remove_var(PRIVATE_KEY_VAR);

    let ledger = ReadClient::from_config(config)?;
    let registry = ledger.registry();
    let writer = WriteClient::connect(
        // writes go through the first configured endpoint; reads never do
        config
            .rpc_endpoints
            .first()
            .context("no rpc endpoint configured")?,
        &private_key,
        registry,
        &config.wallet,
    )
    .await?;
    let subject = writer.sender();

    let gateway = GatewayClient::new(&config.gateway_url)?;
    let input = PlaceholderEncryptor.encrypt_age(age)?;

    let orchestrator = Orchestrator::new(
        ledger,
        writer,
        gateway.clone(),
        VerifyOptions::from_config(&config.verify),
        config.chain_id,
        registry.to_string(),
    )
    .with_health(Arc::new(gateway))
    .with_progress(Arc::new(ConsoleProgress {
        last: Mutex::new(None),
    }));

    println!("Verifying age attestation for {subject}...");
    let outcome = orchestrator.verify_with_retry(subject, &input).await;
    println!("{outcome}");

    Ok(())
}
