// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EIP-712 typed data for user decryption authorizations.

use alloy::{
    primitives::{Address, U256},
    sol,
    sol_types::{eip712_domain, Eip712Domain},
};

sol! {
    /// What a user signs to let the co-processor reveal values to them.
    struct UserDecryptRequestVerification {
        address[] contractAddresses;
        uint256 startTimestamp;
        uint256 durationDays;
    }
}

impl UserDecryptRequestVerification {
    pub fn new(contracts: Vec<Address>, start_timestamp: u64, duration_days: u64) -> Self {
        Self {
            contractAddresses: contracts,
            startTimestamp: U256::from(start_timestamp),
            durationDays: U256::from(duration_days),
        }
    }
}

/// Domain separator shared by every decryption authorization on `chain_id`.
pub fn decryption_domain(chain_id: u64) -> Eip712Domain {
    eip712_domain! {
        name: "Decryption",
        version: "1",
        chain_id: chain_id,
    }
}
