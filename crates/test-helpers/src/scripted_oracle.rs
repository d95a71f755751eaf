// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use async_trait::async_trait;
use sigil_gateway::{DecryptContext, DecryptionOracle, DecryptionPayload, OracleResponse};
use std::sync::{Arc, Mutex};

type OnReady = Arc<dyn Fn() + Send + Sync>;
type OnAttempt = Arc<dyn Fn(u32) + Send + Sync>;

/// Oracle scripted with a fixed response sequence. Once the script runs
/// out, the last response repeats, so "never responds" is a one-element
/// NotReady script.
#[derive(Clone)]
pub struct ScriptedOracle {
    script: Arc<Mutex<Vec<OracleResponse>>>,
    attempts: Arc<Mutex<u32>>,
    /// Invoked just before a Ready response is handed out; tests use it to
    /// make the mock ledger's callback land at the right moment
    on_ready: Option<OnReady>,
    /// Invoked with the 1-based attempt number on every round trip
    on_attempt: Option<OnAttempt>,
}

impl ScriptedOracle {
    pub fn new(mut responses: Vec<OracleResponse>) -> Self {
        responses.reverse();
        Self {
            script: Arc::new(Mutex::new(responses)),
            attempts: Arc::new(Mutex::new(0)),
            on_ready: None,
            on_attempt: None,
        }
    }

    pub fn never_ready() -> Self {
        Self::new(vec![OracleResponse::NotReady])
    }

    pub fn ready_after(not_ready_rounds: usize, plaintext: &str) -> Self {
        let mut script = vec![OracleResponse::NotReady; not_ready_rounds];
        script.push(OracleResponse::Ready(ready_payload(plaintext)));
        Self::new(script)
    }

    pub fn with_on_ready(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_ready = Some(Arc::new(hook));
        self
    }

    pub fn with_on_attempt(mut self, hook: impl Fn(u32) + Send + Sync + 'static) -> Self {
        self.on_attempt = Some(Arc::new(hook));
        self
    }

    pub fn attempts(&self) -> u32 {
        *self.attempts.lock().unwrap()
    }
}

pub fn ready_payload(plaintext: &str) -> DecryptionPayload {
    DecryptionPayload {
        handle: "0x01".to_string(),
        plaintext: plaintext.to_string(),
        signature: None,
    }
}

#[async_trait]
impl DecryptionOracle for ScriptedOracle {
    async fn request_decryption(&self, _ctx: &DecryptContext) -> OracleResponse {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            *attempts
        };
        if let Some(hook) = &self.on_attempt {
            hook(attempt);
        }

        let response = {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop().unwrap()
            } else {
                script.last().cloned().unwrap_or(OracleResponse::NotReady)
            }
        };

        if let (OracleResponse::Ready(_), Some(hook)) = (&response, &self.on_ready) {
            hook();
        }

        response
    }
}
