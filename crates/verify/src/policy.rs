// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use sigil_config::VerifyConfig;
use sigil_evm::RequestStatus;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Governs when a stale request may be retried. Both windows are
/// configurable; the intended ordering is cool-down < timeout so a request
/// can become retry-eligible the moment it goes stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u8,
    /// Window after which an unprocessed request is considered stale
    pub request_timeout: Duration,
    /// Minimum age of a request before it becomes retry-eligible, even if
    /// nominally expired. Prevents retry storms on slow-but-alive gateways.
    pub retry_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            request_timeout: Duration::from_secs(30 * 60),
            retry_cooldown: Duration::from_secs(5 * 60),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &VerifyConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            retry_cooldown: Duration::from_secs(config.retry_cooldown_secs),
        }
    }
}

/// What the orchestrator should do about the subject's current request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Stale, cooled down, budget left: invoke the ledger's retry operation
    Retry,
    /// Still inside its active window or cool-down; do nothing yet
    Wait,
    /// No live request (absent or already processed); only a fresh initial
    /// submission makes progress
    FreshSubmission,
    /// Retry budget spent; terminal for this lineage
    Exhausted,
}

/// Pure decision over an observed request status. `now` is unix seconds;
/// passing it in keeps the policy clock-free and directly testable.
pub fn decide(status: &RequestStatus, policy: &RetryPolicy, now: u64) -> RetryDecision {
    if !status.exists || status.processed {
        return RetryDecision::FreshSubmission;
    }

    if status.retry_count >= policy.max_retries {
        return RetryDecision::Exhausted;
    }

    let age = now.saturating_sub(status.created_at);
    let stale = status.expired || age >= policy.request_timeout.as_secs();
    let cooled_down = age >= policy.retry_cooldown.as_secs();

    if stale && cooled_down {
        RetryDecision::Retry
    } else {
        RetryDecision::Wait
    }
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
