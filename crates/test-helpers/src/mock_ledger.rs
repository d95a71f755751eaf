// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::{Address, Bytes, FixedBytes, TxHash, U256};
use async_trait::async_trait;
use sigil_evm::{FinalityOptions, LedgerError, LedgerRead, LedgerWrite, RequestStatus};
use sigil_verify::unix_now;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct LedgerState {
    requests: HashMap<U256, RequestStatus>,
    /// subject → latest request id; supersede-on-write, latest wins
    active: HashMap<Address, U256>,
    verified: HashMap<Address, bool>,
    /// (predecessor, successor) pairs recorded on every lifecycle retry
    lineage: Vec<(U256, U256)>,
    credential_uri: String,
    next_id: u64,
    submissions: u32,
    retries: u32,
    claims: u32,
    /// Fail this many submissions before accepting one (transient faults)
    failing_submissions: u32,
}

/// In-memory stand-in for the registry. Honors the ledger-side invariants
/// the client relies on: one active request per subject, monotonic
/// retry_count carried across a lineage, processed set exactly once.
#[derive(Clone)]
pub struct MockLedger {
    sender: Address,
    state: Arc<Mutex<LedgerState>>,
}

impl MockLedger {
    /// `sender` plays the role of the connected wallet's address; the real
    /// registry keys submissions on msg.sender.
    pub fn new(sender: Address) -> Self {
        Self {
            sender,
            state: Arc::new(Mutex::new(LedgerState {
                next_id: 1,
                ..Default::default()
            })),
        }
    }

    /// Plants a pre-existing request, e.g. one that went stale long ago.
    pub fn seed_request(&self, subject: Address, age_secs: u64, retry_count: u8, expired: bool) -> U256 {
        let mut state = self.state.lock().unwrap();
        let id = U256::from(state.next_id);
        state.next_id += 1;
        state.requests.insert(
            id,
            RequestStatus {
                exists: true,
                processed: false,
                retry_count,
                expired,
                created_at: unix_now().saturating_sub(age_secs),
            },
        );
        state.active.insert(subject, id);
        id
    }

    /// Simulates the gateway callback landing on chain: marks the
    /// subject's active request processed and records the verdict.
    pub fn complete_active(&self, subject: Address, verdict: bool) {
        let mut state = self.state.lock().unwrap();
        if let Some(id) = state.active.get(&subject).copied() {
            if let Some(status) = state.requests.get_mut(&id) {
                status.processed = true;
            }
        }
        state.verified.insert(subject, verdict);
    }

    /// Fails the next `count` submissions with a transient-looking error.
    pub fn fail_next_submissions(&self, count: u32) {
        self.state.lock().unwrap().failing_submissions = count;
    }

    /// Flips the expired flag on the subject's active request, as the
    /// registry does once the request window passes.
    pub fn expire_active(&self, subject: Address) {
        let mut state = self.state.lock().unwrap();
        if let Some(id) = state.active.get(&subject).copied() {
            if let Some(status) = state.requests.get_mut(&id) {
                status.expired = true;
            }
        }
    }

    pub fn set_credential_uri(&self, uri: &str) {
        self.state.lock().unwrap().credential_uri = uri.to_string();
    }

    pub fn active_id(&self, subject: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .active
            .get(&subject)
            .copied()
            .unwrap_or(U256::ZERO)
    }

    pub fn status_of(&self, id: U256) -> RequestStatus {
        self.state
            .lock()
            .unwrap()
            .requests
            .get(&id)
            .copied()
            .unwrap_or_default()
    }

    pub fn submissions(&self) -> u32 {
        self.state.lock().unwrap().submissions
    }

    pub fn retries(&self) -> u32 {
        self.state.lock().unwrap().retries
    }

    pub fn claims(&self) -> u32 {
        self.state.lock().unwrap().claims
    }

    pub fn lineage(&self) -> Vec<(U256, U256)> {
        self.state.lock().unwrap().lineage.clone()
    }

    fn fake_tx_hash(n: u64) -> TxHash {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&n.to_be_bytes());
        TxHash::from(bytes)
    }
}

#[async_trait]
impl LedgerRead for MockLedger {
    async fn is_verified(&self, subject: Address) -> Result<bool, LedgerError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .verified
            .get(&subject)
            .copied()
            .unwrap_or(false))
    }

    async fn active_request_of(&self, subject: Address) -> Result<U256, LedgerError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .active
            .get(&subject)
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn request_status(&self, request_id: U256) -> Result<RequestStatus, LedgerError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .requests
            .get(&request_id)
            .copied()
            .unwrap_or_default())
    }

    async fn credential_uri(&self, _subject: Address) -> Result<String, LedgerError> {
        Ok(self.state.lock().unwrap().credential_uri.clone())
    }

    async fn await_finality(
        &self,
        _tx_hash: TxHash,
        _options: &FinalityOptions,
    ) -> Result<(), LedgerError> {
        Ok(())
    }
}

#[async_trait]
impl LedgerWrite for MockLedger {
    async fn submit_age_attestation(
        &self,
        _encrypted_age: FixedBytes<32>,
        _input_proof: Bytes,
    ) -> Result<TxHash, LedgerError> {
        let mut state = self.state.lock().unwrap();

        if state.failing_submissions > 0 {
            state.failing_submissions -= 1;
            return Err(LedgerError::Wallet("connection reset by peer".to_string()));
        }

        state.submissions += 1;
        let id = U256::from(state.next_id);
        state.next_id += 1;
        state.requests.insert(
            id,
            RequestStatus {
                exists: true,
                processed: false,
                retry_count: 0,
                expired: false,
                created_at: unix_now(),
            },
        );
        // supersede any prior request: the index keeps only the latest
        state.active.insert(self.sender, id);

        Ok(Self::fake_tx_hash(state.next_id))
    }

    async fn retry_decryption(&self, request_id: U256) -> Result<TxHash, LedgerError> {
        let mut state = self.state.lock().unwrap();

        let predecessor = state
            .requests
            .get(&request_id)
            .copied()
            .filter(|s| s.exists)
            .ok_or_else(|| LedgerError::Wallet(format!("unknown request {request_id}")))?;
        if predecessor.processed {
            return Err(LedgerError::Wallet(format!(
                "request {request_id} already processed"
            )));
        }

        state.retries += 1;
        let successor = U256::from(state.next_id);
        state.next_id += 1;
        state.requests.insert(
            successor,
            RequestStatus {
                exists: true,
                processed: false,
                retry_count: predecessor.retry_count + 1,
                expired: false,
                created_at: unix_now(),
            },
        );
        state.lineage.push((request_id, successor));
        state.active.insert(self.sender, successor);

        Ok(Self::fake_tx_hash(state.next_id))
    }

    async fn claim_credential(&self) -> Result<TxHash, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.claims += 1;
        Ok(Self::fake_tx_hash(state.next_id))
    }
}
