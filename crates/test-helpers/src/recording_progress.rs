// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use sigil_verify::{ProgressSink, VerifyPhase};
use std::sync::Mutex;

/// Captures every progress update so tests can assert the sequence ends
/// on a terminal phase.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<(VerifyPhase, u8)>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(VerifyPhase, u8)> {
        self.events.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<(VerifyPhase, u8)> {
        self.events.lock().unwrap().last().copied()
    }

    /// True when the flow ended on a terminal phase at 100%.
    pub fn ended_terminal(&self) -> bool {
        matches!(self.last(), Some((phase, 100)) if phase.is_terminal())
    }
}

impl ProgressSink for RecordingProgress {
    fn on_progress(&self, phase: VerifyPhase, percent: u8) {
        self.events.lock().unwrap().push((phase, percent));
    }
}
