// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::LedgerError;
use alloy::{
    network::EthereumWallet,
    primitives::{Address, Bytes, FixedBytes, TxHash, U256},
    providers::fillers::{
        BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller, WalletFiller,
    },
    providers::{Identity, RootProvider},
    sol,
};
use async_trait::async_trait;

sol! {
    #[derive(Debug)]
    #[sol(rpc)]
    contract SigilRegistry {
        function submitAgeAttestation(bytes32 encryptedAge, bytes calldata inputProof) external;
        function retryDecryption(uint256 requestId) external;
        function claimCredential() external;
        function isVerified(address subject) external view returns (bool);
        function activeRequestOf(address subject) external view returns (uint256);
        function requestStatus(uint256 requestId) external view returns (bool exists, bool processed, uint8 retryCount, bool expired, uint256 createdAt);
        function credentialURI(address subject) external view returns (string memory);
    }
}

/// Read-model of one decryption request as held by the registry. The ledger
/// is the sole writer of every field here; the client only observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestStatus {
    pub exists: bool,
    pub processed: bool,
    pub retry_count: u8,
    pub expired: bool,
    /// Unix seconds of submission
    pub created_at: u64,
}

impl From<SigilRegistry::requestStatusReturn> for RequestStatus {
    fn from(ret: SigilRegistry::requestStatusReturn) -> Self {
        Self {
            exists: ret.exists,
            processed: ret.processed,
            retry_count: ret.retryCount,
            expired: ret.expired,
            created_at: u64::try_from(ret.createdAt).unwrap_or(u64::MAX),
        }
    }
}

/// Trait for read-only operations against the registry
#[async_trait]
pub trait LedgerRead {
    /// Whether the subject holds a verified attestation
    async fn is_verified(&self, subject: Address) -> Result<bool, LedgerError>;

    /// The subject's current request id, zero when none exists
    async fn active_request_of(&self, subject: Address) -> Result<U256, LedgerError>;

    /// Status of a request by id
    async fn request_status(&self, request_id: U256) -> Result<RequestStatus, LedgerError>;

    /// The credential metadata URI for a verified subject
    async fn credential_uri(&self, subject: Address) -> Result<String, LedgerError>;

    /// Blocks until the transaction is observed in a mined block, or fails
    /// with `ConfirmationTimeout` once the receipt-poll budget is spent
    async fn await_finality(
        &self,
        tx_hash: TxHash,
        options: &crate::finality::FinalityOptions,
    ) -> Result<(), LedgerError>;
}

/// Trait for write operations against the registry. Every call returns the
/// transaction hash only; finality is observed separately through the public
/// read endpoints (see `ReadClient::await_finality`).
#[async_trait]
pub trait LedgerWrite {
    /// Submit a new encrypted comparison with its attached proof
    async fn submit_age_attestation(
        &self,
        encrypted_age: FixedBytes<32>,
        input_proof: Bytes,
    ) -> Result<TxHash, LedgerError>;

    /// Ask the registry to mint a successor request for a stale one
    async fn retry_decryption(&self, request_id: U256) -> Result<TxHash, LedgerError>;

    /// Claim the soulbound credential after a positive verification
    async fn claim_credential(&self) -> Result<TxHash, LedgerError>;
}

/// Type alias for the read-only provider stack behind each public endpoint
pub type ReadProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
>;

/// Type alias for the wallet-backed write provider
pub type WriteProvider = FillProvider<
    JoinFill<
        JoinFill<
            Identity,
            JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
        >,
        WalletFiller<EthereumWallet>,
    >,
    RootProvider,
>;
