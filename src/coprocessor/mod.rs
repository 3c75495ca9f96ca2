// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Boundary to the FHE co-processor.
//!
//! The ledger never sees plaintext amounts. It hands ciphertext handles and
//! input proofs to a [`Coprocessor`] and takes its accept/reject verdict
//! as-is. [`MockCoprocessor`] is the in-process stand-in used for local runs
//! and tests.

mod eip712;
mod mock;

use std::fmt;

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::registry::{CiphertextHandle, InputProof};

pub use eip712::{decryption_domain, UserDecryptRequestVerification};
pub use mock::{
    DecryptedValue, HandleContractPair, MockCoprocessor, UserDecryptRequest, MAX_PENDING_INPUTS,
};

/// Maximum number of contracts one decryption authorization may cover.
pub const MAX_DECRYPT_CONTRACTS: usize = 10;

/// Maximum lifetime of a decryption authorization, in days.
pub const MAX_DECRYPT_DURATION_DAYS: u64 = 365;

// =============================================================================
// Encrypted Types
// =============================================================================

/// Encrypted value kinds the ledger consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FheType {
    /// eaddress
    Address,
    /// euint32
    U32,
}

impl FheType {
    /// Type code embedded in byte 30 of every handle.
    pub fn code(self) -> u8 {
        match self {
            FheType::U32 => 4,
            FheType::Address => 7,
        }
    }
}

impl fmt::Display for FheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FheType::Address => f.write_str("eaddress"),
            FheType::U32 => f.write_str("euint32"),
        }
    }
}

/// A plaintext value on its way into (or out of) the co-processor.
///
/// JSON form: `{"type": "address", "value": "0x..."}` or
/// `{"type": "u32", "value": 1000}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FheValue {
    Address(Address),
    U32(u32),
}

impl FheValue {
    pub fn fhe_type(&self) -> FheType {
        match self {
            FheValue::Address(_) => FheType::Address,
            FheValue::U32(_) => FheType::U32,
        }
    }

    /// Numeric form used when hashing values into handles.
    pub fn to_u256(&self) -> U256 {
        match self {
            FheValue::Address(addr) => U256::from_be_slice(addr.as_slice()),
            FheValue::U32(v) => U256::from(*v),
        }
    }
}

/// Output of client-side encryption: one handle per value plus one proof
/// covering all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EncryptedInput {
    #[schema(value_type = Vec<String>)]
    pub handles: Vec<CiphertextHandle>,
    #[schema(value_type = String)]
    pub input_proof: InputProof,
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CoprocessorError {
    #[error("Malformed input proof: {0}")]
    MalformedProof(String),

    #[error("Handle {0} is not covered by the input proof")]
    HandleNotInProof(CiphertextHandle),

    #[error("Handle {handle} has type code {actual}, expected {expected}")]
    TypeMismatch {
        handle: CiphertextHandle,
        expected: FheType,
        actual: u8,
    },

    #[error("Input proof signature is invalid")]
    InvalidProofSignature,

    #[error("Unknown ciphertext handle {0}")]
    UnknownHandle(CiphertextHandle),

    #[error("Account {account} is not allowed to access {handle}")]
    AccessDenied {
        handle: CiphertextHandle,
        account: Address,
    },

    #[error("Invalid decryption authorization: {0}")]
    InvalidAuthorization(String),

    #[error("Decryption authorization is not valid at {now}")]
    AuthorizationExpired { now: u64 },

    #[error("Signing failed: {0}")]
    Signing(String),
}

impl CoprocessorError {
    pub fn error_code(&self) -> &'static str {
        match self {
            CoprocessorError::MalformedProof(_) => "malformed_proof",
            CoprocessorError::HandleNotInProof(_) => "handle_not_in_proof",
            CoprocessorError::TypeMismatch { .. } => "handle_type_mismatch",
            CoprocessorError::InvalidProofSignature => "invalid_proof_signature",
            CoprocessorError::UnknownHandle(_) => "unknown_handle",
            CoprocessorError::AccessDenied { .. } => "access_denied",
            CoprocessorError::InvalidAuthorization(_) => "invalid_authorization",
            CoprocessorError::AuthorizationExpired { .. } => "authorization_expired",
            CoprocessorError::Signing(_) => "signing_failed",
        }
    }
}

// =============================================================================
// Service Trait
// =============================================================================

/// Operations the ledger needs from the co-processor.
pub trait Coprocessor: Send + Sync {
    /// Check that `proof` certifies `handle` as a fresh input of type
    /// `expected` from `caller` to `contract`.
    fn verify_input(
        &self,
        contract: Address,
        caller: Address,
        handle: &CiphertextHandle,
        expected: FheType,
        proof: &InputProof,
    ) -> Result<(), CoprocessorError>;

    /// Grant `account` access to `handle`. Idempotent.
    fn allow(&self, handle: &CiphertextHandle, account: Address) -> Result<(), CoprocessorError>;

    /// Whether `handle` refers to a value the co-processor still holds.
    fn is_known(&self, handle: &CiphertextHandle) -> bool;

    fn is_allowed(&self, handle: &CiphertextHandle, account: Address) -> bool;
}
