// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod gateway_double;
mod mock_ledger;
mod recording_progress;
mod rpc_double;
mod scripted_oracle;

pub use gateway_double::*;
pub use mock_ledger::*;
pub use recording_progress::*;
pub use rpc_double::*;
pub use scripted_oracle::*;

use alloy_primitives::Address;
use rand::RngCore;

pub fn rand_eth_addr() -> Address {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    Address::from(bytes)
}
