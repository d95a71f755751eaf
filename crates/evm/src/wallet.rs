// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use sigil_config::WalletProfile;
use tracing::debug;

/// Which write path a wallet gets. Chosen exactly once at connection time
/// from the probed `WalletProfile`; never re-derived per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStyle {
    /// The wallet honors the library-level contract-call abstraction
    ContractCall,
    /// The wallet needs manually encoded calldata submitted through the
    /// generic send-transaction primitive with an explicit sender
    RawCalldata,
}

/// Vendors whose wallets are known to mishandle the contract-call
/// abstraction (dropped gas estimation, mangled typed data). They get the
/// raw-calldata path.
const RAW_CALLDATA_VENDORS: &[&str] = &["safe", "sequence", "zengo"];

pub fn probe_submit_style(profile: &WalletProfile) -> SubmitStyle {
    if profile.is_contract_account || profile.uses_session_keys {
        debug!("wallet is contract-account or session-key, using raw calldata");
        return SubmitStyle::RawCalldata;
    }

    if let Some(vendor) = &profile.vendor {
        if RAW_CALLDATA_VENDORS
            .iter()
            .any(|known| vendor.eq_ignore_ascii_case(known))
        {
            debug!(%vendor, "vendor flagged for raw calldata submission");
            return SubmitStyle::RawCalldata;
        }
    }

    SubmitStyle::ContractCall
}
