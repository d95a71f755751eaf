// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::VerifyError;
use alloy_primitives::{keccak256, Bytes, FixedBytes};

/// Output of the client-side encryption step: the ciphertext handle the
/// registry computes over plus the attached input proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedInput {
    pub handle: FixedBytes<32>,
    pub proof: Bytes,
}

impl EncryptedInput {
    /// Fails fast, before any network call, when the encryption step
    /// produced nothing usable.
    pub fn validate(&self) -> Result<(), VerifyError> {
        if self.handle.is_zero() || self.proof.is_empty() {
            return Err(VerifyError::InvalidEncryptionResult);
        }
        Ok(())
    }

    pub fn handle_hex(&self) -> String {
        format!("0x{}", hex::encode(self.handle))
    }
}

/// Seam for the opaque homomorphic scheme. The real binding encrypts under
/// the gateway's public key; tests and the demo CLI use the stand-in below.
pub trait InputEncryptor: Send + Sync {
    fn encrypt_age(&self, age: u8) -> Result<EncryptedInput, VerifyError>;
}

/// Deterministic stand-in for the scheme binding. Produces well-formed,
/// non-zero handles so the rest of the pipeline can be exercised without
/// the vendor library.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderEncryptor;

impl InputEncryptor for PlaceholderEncryptor {
    fn encrypt_age(&self, age: u8) -> Result<EncryptedInput, VerifyError> {
        let mut preimage = b"sigil-age-attestation".to_vec();
        preimage.push(age);
        let handle = keccak256(&preimage);
        let proof = Bytes::from(keccak256(handle).to_vec());

        let input = EncryptedInput { handle, proof };
        input.validate()?;
        Ok(input)
    }
}
