// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::encrypt::EncryptedInput;
use crate::error::VerifyError;
use crate::policy::{unix_now, RetryDecision, RetryPolicy};
use crate::progress::{NoopProgress, ProgressSink, VerifyPhase};
use crate::reconciler::{await_onchain_completion, ReconcilerOptions};
use crate::request;
use alloy_primitives::{Address, U256};
use sigil_config::VerifyConfig;
use sigil_evm::{submit_with_retry, FinalityOptions, LedgerRead, LedgerWrite};
use sigil_gateway::{
    poll_decryption, DecryptContext, DecryptionOracle, GatewayError, HealthCheck, PollOptions,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct VerifyOptions {
    pub poll: PollOptions,
    pub reconcile: ReconcilerOptions,
    pub finality: FinalityOptions,
    pub policy: RetryPolicy,
    pub submit_max_attempts: u32,
    pub submit_base_delay_ms: u64,
    /// Hard timeout wrapped around each polling phase; on trip, in-flight
    /// calls are abandoned and retry eligibility is evaluated instead
    pub overall_timeout: Duration,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            poll: PollOptions::default(),
            reconcile: ReconcilerOptions::default(),
            finality: FinalityOptions::default(),
            policy: RetryPolicy::default(),
            submit_max_attempts: 3,
            submit_base_delay_ms: 5000,
            overall_timeout: Duration::from_secs(120),
        }
    }
}

impl VerifyOptions {
    pub fn from_config(config: &VerifyConfig) -> Self {
        Self {
            poll: PollOptions {
                max_attempts: config.poll_max_attempts,
                interval: Duration::from_millis(config.poll_interval_ms),
            },
            reconcile: ReconcilerOptions {
                interval: Duration::from_millis(config.callback_interval_ms),
                max_wait: Duration::from_millis(config.callback_max_wait_ms),
            },
            finality: FinalityOptions {
                interval: Duration::from_millis(config.finality_interval_ms),
                max_attempts: config.finality_max_attempts,
            },
            policy: RetryPolicy::from_config(config),
            submit_max_attempts: config.submit_max_attempts,
            submit_base_delay_ms: config.submit_base_delay_ms,
            overall_timeout: Duration::from_millis(config.overall_timeout_ms),
        }
    }
}

/// Terminal result of one verification flow. Every variant is final; the
/// caller is never left in an indefinite pending state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The decrypted verdict was read back from the chain
    Verified { adult: bool },
    /// The oracle finished but the callback has not been mined yet
    CheckBackLater { request_id: U256 },
    /// The lineage's retry budget is spent; a fresh submission is needed
    RetryExhausted { retry_count: u8 },
    /// Any other terminal failure, with the originating message preserved
    Failed { message: String },
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationOutcome::Verified { adult: true } => {
                write!(f, "Verified: subject is 18 or older")
            }
            VerificationOutcome::Verified { adult: false } => {
                write!(f, "Verified: subject is under 18; no credential issued")
            }
            VerificationOutcome::CheckBackLater { request_id } => write!(
                f,
                "Decryption complete; waiting for the chain to record request {request_id}. Check back shortly"
            ),
            VerificationOutcome::RetryExhausted { retry_count } => write!(
                f,
                "Gave up after {retry_count} decryption retries; submit a new attestation to start over"
            ),
            VerificationOutcome::Failed { message } => {
                write!(f, "Verification failed: {message}")
            }
        }
    }
}

enum PollPhase {
    Ready,
    TimedOut,
}

/// Drives one subject's verification from submission to a terminal
/// outcome: `Requesting → Polling → AwaitingCallback → {Success |
/// Retrying → Polling | Failed}`. Strictly sequential per subject; the
/// ledger's subject→request index is read before every write.
pub struct Orchestrator<L, W, O> {
    ledger: L,
    writer: W,
    oracle: O,
    health: Option<Arc<dyn HealthCheck>>,
    progress: Arc<dyn ProgressSink>,
    options: VerifyOptions,
    chain_id: u64,
    registry_address: String,
}

impl<L, W, O> Orchestrator<L, W, O>
where
    L: LedgerRead + Send + Sync,
    W: LedgerWrite + Send + Sync,
    O: DecryptionOracle,
{
    pub fn new(
        ledger: L,
        writer: W,
        oracle: O,
        options: VerifyOptions,
        chain_id: u64,
        registry_address: String,
    ) -> Self {
        Self {
            ledger,
            writer,
            oracle,
            health: None,
            progress: Arc::new(NoopProgress),
            options,
            chain_id,
            registry_address,
        }
    }

    pub fn with_health(mut self, health: Arc<dyn HealthCheck>) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Runs the flow to completion. Never returns an error: every failure
    /// is folded into a terminal outcome, and the progress sink always
    /// receives a terminal update last.
    pub async fn verify_with_retry(
        &self,
        subject: Address,
        input: &EncryptedInput,
    ) -> VerificationOutcome {
        let outcome = match self.run(subject, input).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(%subject, error = %e, "verification flow failed");
                VerificationOutcome::Failed {
                    message: e.to_string(),
                }
            }
        };

        let phase = if matches!(outcome, VerificationOutcome::Verified { .. }) {
            VerifyPhase::Succeeded
        } else {
            VerifyPhase::Failed
        };
        self.progress.on_progress(phase, 100);

        info!(%subject, %outcome, "verification flow finished");
        outcome
    }

    async fn run(
        &self,
        subject: Address,
        input: &EncryptedInput,
    ) -> Result<VerificationOutcome, VerifyError> {
        if let Some(health) = &self.health {
            let status = health.check().await;
            if status.healthy {
                debug!("gateway healthy");
            } else {
                warn!(
                    reason = status.reason.as_deref().unwrap_or("unknown"),
                    "gateway unhealthy; decryption may exhaust the poll budget"
                );
            }
        }

        self.progress.on_progress(VerifyPhase::Requesting, 0);

        // Read before write: never submit while a prior request for the
        // subject is still inside its active window.
        let mut request_id = match request::active_request(&self.ledger, subject).await? {
            Some((id, status)) if status.processed => {
                info!(%id, "request already processed; reading verdict");
                return self.read_verdict(subject).await;
            }
            Some((id, status)) => {
                match crate::policy::decide(&status, &self.options.policy, unix_now()) {
                    RetryDecision::Retry => {
                        self.retry(subject, id, status.retry_count).await?
                    }
                    RetryDecision::Exhausted => {
                        warn!(%id, retry_count = status.retry_count, "existing request's retry budget is spent");
                        return Ok(VerificationOutcome::RetryExhausted {
                            retry_count: status.retry_count,
                        });
                    }
                    _ => {
                        info!(%id, retry_count = status.retry_count, "attaching to the subject's active request");
                        id
                    }
                }
            }
            None => self.submit(subject, input).await?,
        };

        loop {
            match self.poll_gateway(request_id).await? {
                PollPhase::Ready => {
                    return self.await_callback(subject, request_id).await;
                }
                PollPhase::TimedOut => {
                    let (status, decision) = request::evaluate(
                        &self.ledger,
                        request_id,
                        &self.options.policy,
                        unix_now(),
                    )
                    .await?;

                    if status.processed {
                        // Callback landed while we were polling the gateway
                        return self.read_verdict(subject).await;
                    }

                    match decision {
                        RetryDecision::Retry => {
                            request_id =
                                self.retry(subject, request_id, status.retry_count).await?;
                        }
                        RetryDecision::Exhausted => {
                            warn!(%request_id, retry_count = status.retry_count, "retry budget exhausted");
                            return Ok(VerificationOutcome::RetryExhausted {
                                retry_count: status.retry_count,
                            });
                        }
                        RetryDecision::Wait => {
                            return Ok(VerificationOutcome::Failed {
                                message: format!(
                                    "decryption still pending for request {request_id}; not yet retry-eligible. Refresh later or retry manually"
                                ),
                            });
                        }
                        RetryDecision::FreshSubmission => {
                            return Ok(VerificationOutcome::Failed {
                                message: "no live decryption request found; submit a new attestation".to_string(),
                            });
                        }
                    }
                }
            }
        }
    }

    /// Validates and submits the encrypted comparison, wrapped in a
    /// transmission-level backoff retry for transient RPC faults only.
    async fn submit(&self, subject: Address, input: &EncryptedInput) -> Result<U256, VerifyError> {
        input.validate()?;
        info!(handle = %input.handle_hex(), "submitting encrypted comparison");

        let tx_hash = submit_with_retry(
            "submitAgeAttestation",
            &[],
            self.options.submit_max_attempts,
            self.options.submit_base_delay_ms,
            || async {
                self.writer
                    .submit_age_attestation(input.handle, input.proof.clone())
                    .await
                    .map_err(eyre::Report::new)
            },
        )
        .await
        .map_err(|e| VerifyError::Other(e.to_string()))?;

        self.ledger
            .await_finality(tx_hash, &self.options.finality)
            .await?;

        let request_id = self.ledger.active_request_of(subject).await?;
        if request_id.is_zero() {
            return Err(VerifyError::Other(
                "ledger did not record a request id after submission".to_string(),
            ));
        }
        info!(%request_id, "decryption request recorded");
        Ok(request_id)
    }

    async fn poll_gateway(&self, request_id: U256) -> Result<PollPhase, VerifyError> {
        let ctx = DecryptContext {
            handle: format!("0x{request_id:064x}"),
            contract_address: self.registry_address.clone(),
            chain_id: self.chain_id,
        };

        let poll = poll_decryption(&self.oracle, &ctx, &self.options.poll, |_, percent| {
            self.progress.on_progress(VerifyPhase::Polling, percent)
        });

        match timeout(self.options.overall_timeout, poll).await {
            Ok(Ok(outcome)) => {
                debug!(
                    attempts = outcome.attempts_used,
                    "gateway reported decryption complete"
                );
                Ok(PollPhase::Ready)
            }
            Ok(Err(GatewayError::PollTimeout { attempts })) => {
                warn!(%request_id, attempts, "gateway poll budget exhausted");
                Ok(PollPhase::TimedOut)
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                warn!(
                    %request_id,
                    timeout_secs = self.options.overall_timeout.as_secs(),
                    "hard timeout tripped during polling; abandoning in-flight calls"
                );
                Ok(PollPhase::TimedOut)
            }
        }
    }

    async fn await_callback(
        &self,
        subject: Address,
        request_id: U256,
    ) -> Result<VerificationOutcome, VerifyError> {
        match await_onchain_completion(
            &self.ledger,
            subject,
            request_id,
            &self.options.reconcile,
            self.progress.as_ref(),
        )
        .await
        {
            Ok(()) => self.read_verdict(subject).await,
            Err(VerifyError::CallbackTimeout { waited_secs }) => {
                warn!(%request_id, waited_secs, "oracle finished but callback not yet on chain");
                Ok(VerificationOutcome::CheckBackLater { request_id })
            }
            Err(e) => Err(e),
        }
    }

    async fn read_verdict(&self, subject: Address) -> Result<VerificationOutcome, VerifyError> {
        let adult = self.ledger.is_verified(subject).await?;

        if adult {
            // Fire-and-forget: the registry's mint skips subjects that
            // already hold the credential, so failures only delay issuance.
            match self.writer.claim_credential().await {
                Ok(tx_hash) => info!(tx = %tx_hash, "credential claim submitted"),
                Err(e) => warn!(error = %e, "credential claim failed; claim again later"),
            }
        }

        Ok(VerificationOutcome::Verified { adult })
    }

    /// Invokes the ledger's retry operation and resolves the successor id.
    /// The ledger mints the new request and carries the lineage's retry
    /// count forward; the client only observes the replacement.
    async fn retry(
        &self,
        subject: Address,
        request_id: U256,
        retry_count: u8,
    ) -> Result<U256, VerifyError> {
        self.progress.on_progress(VerifyPhase::Retrying, 0);
        info!(%request_id, retry_count, "request is stale; invoking lifecycle retry");

        let tx_hash = self.writer.retry_decryption(request_id).await?;
        self.ledger
            .await_finality(tx_hash, &self.options.finality)
            .await?;

        let successor = self.ledger.active_request_of(subject).await?;
        if successor.is_zero() || successor == request_id {
            return Err(VerifyError::Other(format!(
                "retry of request {request_id} did not mint a successor"
            )));
        }
        info!(old = %request_id, new = %successor, "lineage advanced to successor request");
        Ok(successor)
    }
}
