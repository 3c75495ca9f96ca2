// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registry errors.
//!
//! Every variant returned inside a ledger transaction aborts it, so a
//! rejected call never leaves partial state behind.

use alloy::primitives::Address;

use super::types::DebtId;
use crate::coprocessor::CoprocessorError;
use crate::storage::LedgerDbError;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    // Validation
    #[error("Invalid debt type: {0}")]
    InvalidDebtType(i64),

    #[error("Too many updates: {len} exceeds the maximum of {max}")]
    TooManyUpdates { len: usize, max: usize },

    #[error("Array length mismatch: {ids} ids, {statuses} statuses")]
    LengthMismatch { ids: usize, statuses: usize },

    // Authorization
    #[error("Not your debt: {id} belongs to another account ({caller} is not the submitter)")]
    NotYourDebt { id: DebtId, caller: Address },

    #[error("Debt id space exhausted")]
    IdSpaceExhausted,

    // Not found
    #[error("Debt {0} does not exist")]
    DebtNotFound(DebtId),

    #[error("Index {index} out of bounds for {owner} ({len} debts)")]
    IndexOutOfBounds {
        owner: Address,
        index: u64,
        len: u64,
    },

    // External service
    #[error("Encrypted input rejected: {0}")]
    InputRejected(#[source] CoprocessorError),

    #[error("Access grant failed: {0}")]
    AccessGrant(#[source] CoprocessorError),

    #[error(transparent)]
    Storage(#[from] LedgerDbError),
}

impl RegistryError {
    /// Stable machine-readable code.
    pub fn error_code(&self) -> &'static str {
        match self {
            RegistryError::InvalidDebtType(_) => "invalid_debt_type",
            RegistryError::TooManyUpdates { .. } => "too_many_updates",
            RegistryError::LengthMismatch { .. } => "length_mismatch",
            RegistryError::NotYourDebt { .. } => "not_your_debt",
            RegistryError::DebtNotFound(_) => "debt_not_found",
            RegistryError::IndexOutOfBounds { .. } => "index_out_of_bounds",
            RegistryError::InputRejected(_) => "input_rejected",
            RegistryError::AccessGrant(_) => "access_grant_failed",
            RegistryError::IdSpaceExhausted => "id_space_exhausted",
            RegistryError::Storage(_) => "storage_error",
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
