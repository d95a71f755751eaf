// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use sigil_gateway::{
    poll_decryption, DecryptContext, GatewayClient, GatewayError, HealthCheck, PollOptions,
};
use sigil_test_helpers::{well_formed_gateway_key, GatewayDouble, GatewayScript};
use std::time::Duration;

fn ctx() -> DecryptContext {
    DecryptContext {
        handle: format!("0x{:064x}", 7),
        contract_address: "0x92b6D4AaF9Ca11F2bA01a4F9E9DE6b4eD4b0a316".to_string(),
        chain_id: 8009,
    }
}

fn fast_poll(max_attempts: u32) -> PollOptions {
    PollOptions {
        max_attempts,
        interval: Duration::from_millis(10),
    }
}

/// 404s are "not ready yet"; the loop keeps going until the 200 arrives.
#[tokio::test]
async fn test_not_found_means_not_ready() {
    let double = GatewayDouble::spawn(GatewayScript::ready_after(2, "0x01"))
        .await
        .unwrap();
    let client = GatewayClient::new(&double.base_url).unwrap();

    let outcome = poll_decryption(&client, &ctx(), &fast_poll(10), |_, _| {})
        .await
        .unwrap();

    assert_eq!(outcome.attempts_used, 3);
    assert!(outcome.payload.as_bool().unwrap());
    assert_eq!(double.decrypt_hits(), 3);

    double.stop().await;
}

/// Server errors are transient: logged, retried, and only the exhausted
/// budget surfaces as a failure.
#[tokio::test]
async fn test_server_errors_are_transient() {
    let mut script = GatewayScript::ready_after(0, "0x01");
    script.error_rounds = 2;
    let double = GatewayDouble::spawn(script).await.unwrap();
    let client = GatewayClient::new(&double.base_url).unwrap();

    let outcome = poll_decryption(&client, &ctx(), &fast_poll(10), |_, _| {})
        .await
        .unwrap();

    assert_eq!(outcome.attempts_used, 3);

    double.stop().await;
}

/// A gateway that never answers exhausts exactly the configured budget,
/// observed over real HTTP.
#[tokio::test]
async fn test_poll_budget_exact_over_http() {
    let double = GatewayDouble::spawn(GatewayScript::never_ready())
        .await
        .unwrap();
    let client = GatewayClient::new(&double.base_url).unwrap();

    let err = poll_decryption(&client, &ctx(), &fast_poll(3), |_, _| {})
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::PollTimeout { attempts: 3 }));
    assert_eq!(double.decrypt_hits(), 3);

    double.stop().await;
}

/// An unreachable gateway is transient per attempt and a PollTimeout once
/// the budget is spent, never a hard transport error.
#[tokio::test]
async fn test_unreachable_gateway_exhausts_budget() {
    let client = GatewayClient::new("http://127.0.0.1:9/").unwrap();

    let err = poll_decryption(&client, &ctx(), &fast_poll(2), |_, _| {})
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::PollTimeout { attempts: 2 }));
}

#[tokio::test]
async fn test_health_check_accepts_well_formed_key() {
    let double = GatewayDouble::spawn(GatewayScript::never_ready())
        .await
        .unwrap();
    let client = GatewayClient::new(&double.base_url).unwrap();

    let status = client.check().await;
    assert!(status.healthy);
    assert_eq!(status.public_key, Some(well_formed_gateway_key()));

    double.stop().await;
}

#[tokio::test]
async fn test_health_check_rejects_malformed_key() {
    let mut script = GatewayScript::never_ready();
    script.public_key = "0x02deadbeef".to_string();
    let double = GatewayDouble::spawn(script).await.unwrap();
    let client = GatewayClient::new(&double.base_url).unwrap();

    let status = client.check().await;
    assert!(!status.healthy);
    assert!(status.reason.is_some());

    double.stop().await;
}

#[tokio::test]
async fn test_health_check_reports_unreachable_gateway() {
    let client = GatewayClient::new("http://127.0.0.1:9/").unwrap();

    let status = client.check().await;
    assert!(!status.healthy);
}
