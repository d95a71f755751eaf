// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    /// The poll budget ran out before the gateway reported a result.
    /// Triggers retry-eligibility evaluation upstream, not immediate
    /// failure.
    #[error("decryption not completed after {attempts} poll attempts")]
    PollTimeout { attempts: u32 },

    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed gateway response: {0}")]
    BadResponse(String),

    #[error("invalid gateway url: {0}")]
    InvalidUrl(String),
}
