// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod contracts;
mod error;
mod finality;
mod read;
mod retry;
mod wallet;
mod write;

pub use contracts::*;
pub use error::*;
pub use finality::*;
pub use read::*;
pub use retry::*;
pub use wallet::*;
pub use write::*;
