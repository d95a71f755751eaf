// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::contracts::{LedgerWrite, SigilRegistry, WriteProvider};
use crate::error::LedgerError;
use crate::wallet::{probe_submit_style, SubmitStyle};
use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes, FixedBytes, TxHash, U256},
    providers::{Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    sol_types::SolCall,
};
use async_trait::async_trait;
use sigil_config::WalletProfile;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Write path of the ledger client. Submissions return the transaction hash
/// only; the wallet's confirmation primitive is never awaited.
pub struct WriteClient {
    provider: Arc<WriteProvider>,
    registry: Address,
    sender: Address,
    style: SubmitStyle,
}

impl WriteClient {
    pub async fn connect(
        rpc_url: &str,
        private_key: &str,
        registry: Address,
        profile: &WalletProfile,
    ) -> Result<Self, LedgerError> {
        let signer: PrivateKeySigner = private_key
            .parse()
            .map_err(|e| LedgerError::Wallet(format!("invalid signing key: {e}")))?;
        let sender = signer.address();
        let wallet = EthereumWallet::from(signer);

        let url: Url = rpc_url
            .parse()
            .map_err(|_| LedgerError::InvalidAddress(rpc_url.to_string()))?;
        let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);

        let style = probe_submit_style(profile);
        info!(?style, %sender, "connected write client");

        Ok(Self {
            provider: Arc::new(provider),
            registry,
            sender,
            style,
        })
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn submit_style(&self) -> SubmitStyle {
        self.style
    }

    async fn send_raw(&self, calldata: Vec<u8>, description: &str) -> Result<TxHash, LedgerError> {
        let tx = TransactionRequest::default()
            .with_from(self.sender)
            .with_to(self.registry)
            .with_input(calldata);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| LedgerError::Wallet(format!("{description}: {e}")))?;

        let tx_hash = *pending.tx_hash();
        debug!(tx = %tx_hash, description, "submitted via raw calldata");
        Ok(tx_hash)
    }
}

#[async_trait]
impl LedgerWrite for WriteClient {
    async fn submit_age_attestation(
        &self,
        encrypted_age: FixedBytes<32>,
        input_proof: Bytes,
    ) -> Result<TxHash, LedgerError> {
        match self.style {
            SubmitStyle::ContractCall => {
                let contract = SigilRegistry::new(self.registry, self.provider.clone());
                let pending = contract
                    .submitAgeAttestation(encrypted_age, input_proof)
                    .send()
                    .await
                    .map_err(|e| LedgerError::Wallet(format!("submitAgeAttestation: {e}")))?;
                let tx_hash = *pending.tx_hash();
                debug!(tx = %tx_hash, "submitted via contract call");
                Ok(tx_hash)
            }
            SubmitStyle::RawCalldata => {
                let calldata = SigilRegistry::submitAgeAttestationCall {
                    encryptedAge: encrypted_age,
                    inputProof: input_proof,
                }
                .abi_encode();
                self.send_raw(calldata, "submitAgeAttestation").await
            }
        }
    }

    async fn retry_decryption(&self, request_id: U256) -> Result<TxHash, LedgerError> {
        match self.style {
            SubmitStyle::ContractCall => {
                let contract = SigilRegistry::new(self.registry, self.provider.clone());
                let pending = contract
                    .retryDecryption(request_id)
                    .send()
                    .await
                    .map_err(|e| LedgerError::Wallet(format!("retryDecryption: {e}")))?;
                Ok(*pending.tx_hash())
            }
            SubmitStyle::RawCalldata => {
                let calldata = SigilRegistry::retryDecryptionCall {
                    requestId: request_id,
                }
                .abi_encode();
                self.send_raw(calldata, "retryDecryption").await
            }
        }
    }

    async fn claim_credential(&self) -> Result<TxHash, LedgerError> {
        match self.style {
            SubmitStyle::ContractCall => {
                let contract = SigilRegistry::new(self.registry, self.provider.clone());
                let pending = contract
                    .claimCredential()
                    .send()
                    .await
                    .map_err(|e| LedgerError::Wallet(format!("claimCredential: {e}")))?;
                Ok(*pending.tx_hash())
            }
            SubmitStyle::RawCalldata => {
                let calldata = SigilRegistry::claimCredentialCall {}.abi_encode();
                self.send_raw(calldata, "claimCredential").await
            }
        }
    }
}
