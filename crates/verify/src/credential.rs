// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::VerifyError;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;

const DATA_URI_PREFIX: &str = "data:application/json;base64,";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CredentialMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

/// Decodes the registry's credential URI into displayable metadata.
/// Registries emit either an inline base64 data URI or plain JSON.
pub fn parse_credential_uri(uri: &str) -> Result<CredentialMetadata, VerifyError> {
    let json = match uri.strip_prefix(DATA_URI_PREFIX) {
        Some(b64) => {
            let bytes = STANDARD
                .decode(b64.trim())
                .map_err(|e| VerifyError::Credential(format!("base64: {e}")))?;
            String::from_utf8(bytes).map_err(|e| VerifyError::Credential(format!("utf8: {e}")))?
        }
        None => uri.to_string(),
    };

    serde_json::from_str(&json).map_err(|e| VerifyError::Credential(format!("json: {e}")))
}
