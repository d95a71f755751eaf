// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::{Address, TxHash};
use sigil_config::RPC;
use sigil_evm::{FinalityOptions, LedgerError, LedgerRead, ReadClient};
use sigil_test_helpers::{rand_eth_addr, RpcDouble, RpcScript};
use std::time::Duration;

const REGISTRY: &str = "0x92b6D4AaF9Ca11F2bA01a4F9E9DE6b4eD4b0a316";

// Nothing listens on these ports; connections are refused immediately.
fn dead_endpoint(port: u16) -> RPC {
    RPC::from_url(&format!("http://127.0.0.1:{port}/")).unwrap()
}

fn registry() -> Address {
    REGISTRY.parse().unwrap()
}

/// The first endpoints fail, the last one answers; the read succeeds and
/// the earlier failures never surface.
#[tokio::test]
async fn test_read_falls_through_to_live_endpoint() {
    let double = RpcDouble::spawn(RpcScript::default()).await.unwrap();

    let client = ReadClient::new(
        vec![
            dead_endpoint(9),
            dead_endpoint(19),
            RPC::from_url(&double.url).unwrap(),
        ],
        registry(),
    );

    let verified = client.is_verified(rand_eth_addr()).await.unwrap();
    assert!(verified);
    assert_eq!(double.calls(), 1);

    double.stop().await;
}

/// Every configured endpoint fails; the error carries all of the
/// underlying causes.
#[tokio::test]
async fn test_all_endpoints_down_lists_every_error() {
    let client = ReadClient::new(
        vec![dead_endpoint(9), dead_endpoint(19), dead_endpoint(29)],
        registry(),
    );

    let err = client.is_verified(rand_eth_addr()).await.unwrap_err();
    match &err {
        LedgerError::AllEndpointsUnavailable { operation, errors } => {
            assert_eq!(operation, "isVerified");
            assert_eq!(errors.len(), 3);
        }
        other => panic!("expected AllEndpointsUnavailable, got {other:?}"),
    }
    assert_eq!(err.endpoint_errors().len(), 3);
}

/// A write that never gets a receipt ends in ConfirmationTimeout after the
/// exact attempt budget; the receipt polls went to the live endpoint.
#[tokio::test]
async fn test_unmined_transaction_times_out() {
    let double = RpcDouble::spawn(RpcScript::default()).await.unwrap();

    let client = ReadClient::new(
        vec![dead_endpoint(9), RPC::from_url(&double.url).unwrap()],
        registry(),
    );

    let err = client
        .await_finality(
            TxHash::ZERO,
            &FinalityOptions {
                interval: Duration::from_millis(10),
                max_attempts: 3,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::ConfirmationTimeout { attempts: 3, .. }
    ));
    assert_eq!(double.receipt_polls(), 3);

    double.stop().await;
}

/// Finality polling refuses to start without a live endpoint.
#[tokio::test]
async fn test_finality_needs_a_live_endpoint() {
    let client = ReadClient::new(vec![dead_endpoint(9), dead_endpoint(19)], registry());

    let err = client
        .await_finality(
            TxHash::ZERO,
            &FinalityOptions {
                interval: Duration::from_millis(10),
                max_attempts: 3,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::AllEndpointsUnavailable { .. }
    ));
}
