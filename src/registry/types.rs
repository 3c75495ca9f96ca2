// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger value types.
//!
//! Ciphertext handles and input proofs are opaque tokens: the registry stores,
//! returns, and forwards them, but never looks inside.

use std::fmt;

use alloy::primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::RegistryError;

/// Record identifier. Assigned from 1 upward; 0 means "does not exist".
pub type DebtId = u64;

/// Maximum number of status updates accepted in one batch.
pub const MAX_BATCH_SIZE: usize = 50;

// =============================================================================
// Debt Type
// =============================================================================

/// Plaintext classification of a debt record.
///
/// Serialized as its integer code (`0..=3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DebtType {
    Loan = 0,
    CreditCard = 1,
    Borrowing = 2,
    Other = 3,
}

impl DebtType {
    /// Every supported type, in code order.
    pub const ALL: [DebtType; 4] = [
        DebtType::Loan,
        DebtType::CreditCard,
        DebtType::Borrowing,
        DebtType::Other,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            DebtType::Loan => "loan",
            DebtType::CreditCard => "credit_card",
            DebtType::Borrowing => "borrowing",
            DebtType::Other => "other",
        }
    }
}

impl TryFrom<i64> for DebtType {
    type Error = RegistryError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(DebtType::Loan),
            1 => Ok(DebtType::CreditCard),
            2 => Ok(DebtType::Borrowing),
            3 => Ok(DebtType::Other),
            other => Err(RegistryError::InvalidDebtType(other)),
        }
    }
}

impl TryFrom<u8> for DebtType {
    type Error = RegistryError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(code))
    }
}

impl From<DebtType> for u8 {
    fn from(value: DebtType) -> Self {
        value.code()
    }
}

impl fmt::Display for DebtType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Opaque Ciphertext Values
// =============================================================================

/// Reference to a value held by the FHE co-processor.
///
/// The all-zero handle denotes "uninitialized".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CiphertextHandle(B256);

impl CiphertextHandle {
    pub const ZERO: Self = Self(B256::ZERO);

    pub const fn new(raw: B256) -> Self {
        Self(raw)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Underlying 32 bytes, for the co-processor boundary only.
    pub fn as_b256(&self) -> &B256 {
        &self.0
    }
}

impl From<B256> for CiphertextHandle {
    fn from(raw: B256) -> Self {
        Self(raw)
    }
}

impl fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validity certificate binding encrypted inputs to a caller and contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputProof(Bytes);

impl InputProof {
    pub fn new(raw: impl Into<Bytes>) -> Self {
        Self(raw.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_ref()
    }
}

// =============================================================================
// Records
// =============================================================================

/// A stored debt record.
///
/// Everything except `is_active` is write-once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtRecord {
    pub id: DebtId,
    pub submitter: Address,
    pub encrypted_amount: CiphertextHandle,
    pub debt_type: DebtType,
    /// Creation time (unix seconds).
    pub timestamp: u64,
    pub is_active: bool,
}

impl DebtRecord {
    pub fn metadata(&self) -> DebtMetadata {
        DebtMetadata {
            submitter: self.submitter,
            debt_type: self.debt_type,
            timestamp: self.timestamp,
            is_active: self.is_active,
        }
    }
}

/// Public metadata of a record (everything but the amount handle).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DebtMetadata {
    #[schema(value_type = String, example = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8")]
    pub submitter: Address,
    /// 0=Loan, 1=CreditCard, 2=Borrowing, 3=Other
    #[schema(value_type = u8, minimum = 0, maximum = 3)]
    pub debt_type: DebtType,
    pub timestamp: u64,
    pub is_active: bool,
}

/// Aggregate over one owner's records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserDebtSummary {
    pub total: u64,
    pub active: u64,
    pub distinct_types_used: u64,
}

/// Creation event, emitted once per successful submission.
///
/// Carries no amount: the amount stays encrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DebtSubmitted {
    pub id: DebtId,
    #[schema(value_type = String)]
    pub submitter: Address,
    #[schema(value_type = u8, minimum = 0, maximum = 3)]
    pub debt_type: DebtType,
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debt_type_accepts_only_known_codes() {
        for (code, expected) in DebtType::ALL.iter().enumerate() {
            assert_eq!(DebtType::try_from(code as u8).unwrap(), *expected);
        }
        assert!(matches!(
            DebtType::try_from(4u8),
            Err(RegistryError::InvalidDebtType(4))
        ));
        assert!(matches!(
            DebtType::try_from(255u8),
            Err(RegistryError::InvalidDebtType(255))
        ));
    }

    #[test]
    fn debt_type_rejects_wide_codes() {
        assert_eq!(DebtType::try_from(3i64).unwrap(), DebtType::Other);
        for code in [-1i64, 256, i64::MIN, i64::MAX] {
            assert!(matches!(
                DebtType::try_from(code),
                Err(RegistryError::InvalidDebtType(c)) if c == code
            ));
        }
    }

    #[test]
    fn debt_type_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&DebtType::Borrowing).unwrap(), "2");
        let parsed: DebtType = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, DebtType::CreditCard);
        assert!(serde_json::from_str::<DebtType>("7").is_err());
    }

    #[test]
    fn zero_handle_is_uninitialized() {
        assert!(CiphertextHandle::ZERO.is_zero());
        assert!(!CiphertextHandle::new(B256::repeat_byte(0x11)).is_zero());
    }

    #[test]
    fn handle_serializes_as_hex() {
        let handle = CiphertextHandle::new(B256::repeat_byte(0xab));
        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(32)));
    }
}
