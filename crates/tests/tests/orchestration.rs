// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use sigil_evm::LedgerWrite;
use sigil_test_helpers::{rand_eth_addr, MockLedger, RecordingProgress, ScriptedOracle};
use sigil_verify::{
    EncryptedInput, InputEncryptor, Orchestrator, PlaceholderEncryptor, ReconcilerOptions,
    RetryPolicy, VerificationOutcome, VerifyOptions,
};
use std::sync::Arc;
use std::time::Duration;

const REGISTRY: &str = "0x92b6D4AaF9Ca11F2bA01a4F9E9DE6b4eD4b0a316";

fn fast_options() -> VerifyOptions {
    VerifyOptions {
        poll: sigil_gateway::PollOptions {
            max_attempts: 2,
            interval: Duration::from_millis(10),
        },
        reconcile: ReconcilerOptions {
            interval: Duration::from_millis(10),
            max_wait: Duration::from_millis(100),
        },
        submit_base_delay_ms: 10,
        ..VerifyOptions::default()
    }
}

fn flow(
    ledger: &MockLedger,
    oracle: &ScriptedOracle,
    options: VerifyOptions,
    progress: &Arc<RecordingProgress>,
) -> Orchestrator<MockLedger, MockLedger, ScriptedOracle> {
    Orchestrator::new(
        ledger.clone(),
        ledger.clone(),
        oracle.clone(),
        options,
        8009,
        REGISTRY.to_string(),
    )
    .with_progress(progress.clone() as Arc<dyn sigil_verify::ProgressSink>)
}

fn adult_input() -> EncryptedInput {
    PlaceholderEncryptor.encrypt_age(25).unwrap()
}

/// Age 25, oracle answers on the first attempt, callback lands, verdict
/// true, credential claimed.
#[tokio::test(start_paused = true)]
async fn test_adult_is_verified_and_credential_claimed() {
    use tracing_subscriber::{fmt, EnvFilter};

    let subscriber = fmt()
        .with_env_filter(EnvFilter::new("info"))
        .with_test_writer()
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let subject = rand_eth_addr();
    let ledger = MockLedger::new(subject);
    let progress = Arc::new(RecordingProgress::new());

    let callback_ledger = ledger.clone();
    let oracle = ScriptedOracle::ready_after(0, "0x01")
        .with_on_ready(move || callback_ledger.complete_active(subject, true));

    let outcome = flow(&ledger, &oracle, fast_options(), &progress)
        .verify_with_retry(subject, &adult_input())
        .await;

    assert_eq!(outcome, VerificationOutcome::Verified { adult: true });
    assert_eq!(ledger.submissions(), 1);
    assert_eq!(ledger.claims(), 1);
    assert!(progress.ended_terminal());
}

/// The comparison decrypts to false; the flow succeeds with a negative
/// verdict and no mint is invoked.
#[tokio::test(start_paused = true)]
async fn test_minor_is_rejected_without_mint() {
    let subject = rand_eth_addr();
    let ledger = MockLedger::new(subject);
    let progress = Arc::new(RecordingProgress::new());

    let callback_ledger = ledger.clone();
    let oracle = ScriptedOracle::ready_after(0, "0x00")
        .with_on_ready(move || callback_ledger.complete_active(subject, false));

    let input = PlaceholderEncryptor.encrypt_age(16).unwrap();
    let outcome = flow(&ledger, &oracle, fast_options(), &progress)
        .verify_with_retry(subject, &input)
        .await;

    assert_eq!(outcome, VerificationOutcome::Verified { adult: false });
    assert_eq!(ledger.claims(), 0);
    assert!(progress.ended_terminal());
}

/// The subject's request went stale long ago (40 min, past the 30 min
/// timeout, cool-down elapsed, no retries yet). The orchestrator invokes
/// the lifecycle retry and the lineage advances with retry count 1.
#[tokio::test(start_paused = true)]
async fn test_stale_request_is_retried_with_incremented_count() {
    let subject = rand_eth_addr();
    let ledger = MockLedger::new(subject);
    let progress = Arc::new(RecordingProgress::new());

    let stale_id = ledger.seed_request(subject, 40 * 60, 0, true);
    let oracle = ScriptedOracle::never_ready();

    let outcome = flow(&ledger, &oracle, fast_options(), &progress)
        .verify_with_retry(subject, &adult_input())
        .await;

    assert_eq!(ledger.retries(), 1);
    assert_eq!(ledger.submissions(), 0, "retry must not open a new lineage");

    let successor = ledger.active_id(subject);
    assert_ne!(successor, stale_id);
    assert_eq!(ledger.status_of(successor).retry_count, 1);
    assert_eq!(ledger.lineage(), vec![(stale_id, successor)]);

    // The successor is fresh, so after its poll budget the flow parks in a
    // terminal pending state rather than hammering the registry.
    assert!(matches!(outcome, VerificationOutcome::Failed { .. }));
    assert!(progress.ended_terminal());
}

/// Same staleness but the lineage's budget is spent; the flow reports
/// RetryExhausted without touching the retry operation.
#[tokio::test(start_paused = true)]
async fn test_exhausted_lineage_is_not_retried() {
    let subject = rand_eth_addr();
    let ledger = MockLedger::new(subject);
    let progress = Arc::new(RecordingProgress::new());

    ledger.seed_request(subject, 40 * 60, 3, true);
    let oracle = ScriptedOracle::never_ready();

    let outcome = flow(&ledger, &oracle, fast_options(), &progress)
        .verify_with_retry(subject, &adult_input())
        .await;

    assert_eq!(outcome, VerificationOutcome::RetryExhausted { retry_count: 3 });
    assert_eq!(ledger.retries(), 0);
    assert_eq!(ledger.submissions(), 0);
    assert!(progress.ended_terminal());
}

/// The request goes stale while the gateway is being polled, and the
/// post-timeout evaluation retries it.
#[tokio::test(start_paused = true)]
async fn test_request_expiring_mid_poll_is_retried() {
    let subject = rand_eth_addr();
    let ledger = MockLedger::new(subject);
    let progress = Arc::new(RecordingProgress::new());

    let seeded = ledger.seed_request(subject, 60, 0, false);

    // The registry flags the request expired during the second poll round
    let expiring_ledger = ledger.clone();
    let oracle = ScriptedOracle::never_ready().with_on_attempt(move |attempt| {
        if attempt == 2 {
            expiring_ledger.expire_active(subject);
        }
    });

    let options = VerifyOptions {
        policy: RetryPolicy {
            retry_cooldown: Duration::ZERO,
            ..RetryPolicy::default()
        },
        ..fast_options()
    };

    let _ = flow(&ledger, &oracle, options, &progress)
        .verify_with_retry(subject, &adult_input())
        .await;

    assert_eq!(ledger.retries(), 1);
    let successor = ledger.active_id(subject);
    assert_ne!(successor, seeded);
    assert_eq!(ledger.status_of(successor).retry_count, 1);
    assert!(progress.ended_terminal());
}

/// While a request is active, a new flow attaches to it instead of
/// opening a second lineage.
#[tokio::test(start_paused = true)]
async fn test_active_request_is_attached_not_duplicated() {
    let subject = rand_eth_addr();
    let ledger = MockLedger::new(subject);
    let progress = Arc::new(RecordingProgress::new());

    let active = ledger.seed_request(subject, 60, 0, false);

    let callback_ledger = ledger.clone();
    let oracle = ScriptedOracle::ready_after(0, "0x01")
        .with_on_ready(move || callback_ledger.complete_active(subject, true));

    let outcome = flow(&ledger, &oracle, fast_options(), &progress)
        .verify_with_retry(subject, &adult_input())
        .await;

    assert_eq!(outcome, VerificationOutcome::Verified { adult: true });
    assert_eq!(ledger.submissions(), 0, "no second lineage while one is active");
    assert_eq!(ledger.active_id(subject), active);
}

/// Ledger side: the subject→request index resolves duplicates to the
/// latest request.
#[tokio::test]
async fn test_index_keeps_latest_submission_only() {
    let subject = rand_eth_addr();
    let ledger = MockLedger::new(subject);
    let input = adult_input();

    ledger
        .submit_age_attestation(input.handle, input.proof.clone())
        .await
        .unwrap();
    let first = ledger.active_id(subject);

    ledger
        .submit_age_attestation(input.handle, input.proof.clone())
        .await
        .unwrap();
    let second = ledger.active_id(subject);

    assert_ne!(first, second);
    assert_eq!(ledger.active_id(subject), second);
}

/// Every retry mints a successor whose retry_count is exactly the
/// predecessor's plus one; the count never resets within a lineage.
#[tokio::test]
async fn test_retry_counts_are_monotone_across_lineage() {
    let subject = rand_eth_addr();
    let ledger = MockLedger::new(subject);

    let mut id = ledger.seed_request(subject, 40 * 60, 0, true);
    for expected in 1..=3u8 {
        ledger.retry_decryption(id).await.unwrap();
        let successor = ledger.active_id(subject);
        assert_eq!(
            ledger.status_of(successor).retry_count,
            expected,
            "successor carries predecessor count + 1"
        );
        assert_eq!(ledger.status_of(id).retry_count, expected - 1);
        id = successor;
    }

    let pairs = ledger.lineage();
    assert_eq!(pairs.len(), 3);
    for window in pairs.windows(2) {
        assert_eq!(window[0].1, window[1].0, "lineage forms a chain");
    }
}

/// The poll budget is exact at flow level.
#[tokio::test(start_paused = true)]
async fn test_poll_budget_is_exact() {
    let subject = rand_eth_addr();
    let ledger = MockLedger::new(subject);
    let progress = Arc::new(RecordingProgress::new());

    ledger.seed_request(subject, 60, 0, false);
    let oracle = ScriptedOracle::never_ready();

    let _ = flow(&ledger, &oracle, fast_options(), &progress)
        .verify_with_retry(subject, &adult_input())
        .await;

    assert_eq!(oracle.attempts(), 2, "exactly max_attempts round trips");
}

/// Transmission-level retry absorbs transient submit faults without
/// consuming the decryption lifecycle's retry budget.
#[tokio::test(start_paused = true)]
async fn test_transient_submit_faults_are_absorbed() {
    let subject = rand_eth_addr();
    let ledger = MockLedger::new(subject);
    let progress = Arc::new(RecordingProgress::new());

    ledger.fail_next_submissions(2);

    let callback_ledger = ledger.clone();
    let oracle = ScriptedOracle::ready_after(0, "0x01")
        .with_on_ready(move || callback_ledger.complete_active(subject, true));

    let outcome = flow(&ledger, &oracle, fast_options(), &progress)
        .verify_with_retry(subject, &adult_input())
        .await;

    assert_eq!(outcome, VerificationOutcome::Verified { adult: true });
    assert_eq!(ledger.submissions(), 1);
    assert_eq!(ledger.retries(), 0);
}

/// A malformed encryption result fails fast, before any ledger traffic.
#[tokio::test(start_paused = true)]
async fn test_invalid_encryption_fails_before_any_network_call() {
    let subject = rand_eth_addr();
    let ledger = MockLedger::new(subject);
    let progress = Arc::new(RecordingProgress::new());
    let oracle = ScriptedOracle::never_ready();

    let bad_input = EncryptedInput {
        handle: alloy_primitives::FixedBytes::ZERO,
        proof: alloy_primitives::Bytes::from(vec![1]),
    };

    let outcome = flow(&ledger, &oracle, fast_options(), &progress)
        .verify_with_retry(subject, &bad_input)
        .await;

    match outcome {
        VerificationOutcome::Failed { message } => {
            assert!(message.contains("empty or malformed"))
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(ledger.submissions(), 0);
    assert_eq!(oracle.attempts(), 0);
    assert!(progress.ended_terminal());
}

/// Oracle completion without an on-chain callback parks the flow in the
/// distinct check-back-later state.
#[tokio::test(start_paused = true)]
async fn test_missing_callback_reports_check_back_later() {
    let subject = rand_eth_addr();
    let ledger = MockLedger::new(subject);
    let progress = Arc::new(RecordingProgress::new());

    let active = ledger.seed_request(subject, 60, 0, false);
    // Ready, but nothing ever flips the on-chain flags
    let oracle = ScriptedOracle::ready_after(0, "0x01");

    let outcome = flow(&ledger, &oracle, fast_options(), &progress)
        .verify_with_retry(subject, &adult_input())
        .await;

    assert_eq!(
        outcome,
        VerificationOutcome::CheckBackLater { request_id: active }
    );
    assert_eq!(ledger.claims(), 0);
    assert!(progress.ended_terminal());
}

/// The hard timeout abandons a slow polling phase and falls through to the
/// eligibility check instead of blocking forever.
#[tokio::test(start_paused = true)]
async fn test_hard_timeout_abandons_polling_phase() {
    let subject = rand_eth_addr();
    let ledger = MockLedger::new(subject);
    let progress = Arc::new(RecordingProgress::new());

    ledger.seed_request(subject, 60, 0, false);
    let oracle = ScriptedOracle::never_ready();

    let options = VerifyOptions {
        poll: sigil_gateway::PollOptions {
            max_attempts: 1000,
            interval: Duration::from_secs(3600),
        },
        overall_timeout: Duration::from_millis(50),
        ..fast_options()
    };

    let outcome = flow(&ledger, &oracle, options, &progress)
        .verify_with_retry(subject, &adult_input())
        .await;

    assert!(oracle.attempts() < 1000);
    assert!(matches!(outcome, VerificationOutcome::Failed { .. }));
    assert!(progress.ended_terminal());
}

/// Every terminal path leaves the progress indicator on a terminal phase
/// at 100%.
#[tokio::test(start_paused = true)]
async fn test_progress_always_terminates() {
    // success path
    {
        let subject = rand_eth_addr();
        let ledger = MockLedger::new(subject);
        let progress = Arc::new(RecordingProgress::new());
        let cb = ledger.clone();
        let oracle = ScriptedOracle::ready_after(1, "0x01")
            .with_on_ready(move || cb.complete_active(subject, true));

        flow(&ledger, &oracle, fast_options(), &progress)
            .verify_with_retry(subject, &adult_input())
            .await;
        assert!(progress.ended_terminal());
    }

    // oracle timeout with exhausted retries
    {
        let subject = rand_eth_addr();
        let ledger = MockLedger::new(subject);
        let progress = Arc::new(RecordingProgress::new());
        ledger.seed_request(subject, 40 * 60, 3, true);

        flow(
            &ledger,
            &ScriptedOracle::never_ready(),
            fast_options(),
            &progress,
        )
        .verify_with_retry(subject, &adult_input())
        .await;
        assert!(progress.ended_terminal());
    }

    // callback timeout
    {
        let subject = rand_eth_addr();
        let ledger = MockLedger::new(subject);
        let progress = Arc::new(RecordingProgress::new());
        ledger.seed_request(subject, 60, 0, false);

        flow(
            &ledger,
            &ScriptedOracle::ready_after(0, "0x01"),
            fast_options(),
            &progress,
        )
        .verify_with_retry(subject, &adult_input())
        .await;
        assert!(progress.ended_terminal());
    }
}

/// An already-processed request short-circuits to the recorded verdict.
#[tokio::test(start_paused = true)]
async fn test_processed_request_short_circuits_to_verdict() {
    let subject = rand_eth_addr();
    let ledger = MockLedger::new(subject);
    let progress = Arc::new(RecordingProgress::new());

    ledger.seed_request(subject, 60, 0, false);
    ledger.complete_active(subject, true);

    let oracle = ScriptedOracle::never_ready();
    let outcome = flow(&ledger, &oracle, fast_options(), &progress)
        .verify_with_retry(subject, &adult_input())
        .await;

    assert_eq!(outcome, VerificationOutcome::Verified { adult: true });
    assert_eq!(oracle.attempts(), 0, "no polling for a settled request");
}
