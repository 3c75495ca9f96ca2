// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request and response bodies of the HTTP API.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::coprocessor::{DecryptedValue, FheValue};
use crate::registry::{CiphertextHandle, DebtId, DebtSubmitted, DebtType, InputProof};

// =============================================================================
// Debts
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitDebtRequest {
    /// Encrypted submitter address (eaddress handle).
    #[schema(value_type = String)]
    pub submitter_handle: CiphertextHandle,
    /// Encrypted amount (euint32 handle).
    #[schema(value_type = String)]
    pub amount_handle: CiphertextHandle,
    /// Proof covering both handles.
    #[schema(value_type = String)]
    pub input_proof: InputProof,
    /// 0=Loan, 1=CreditCard, 2=Borrowing, 3=Other. Any other integer is
    /// rejected as an invalid debt type.
    pub debt_type: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchUpdateStatusRequest {
    pub ids: Vec<DebtId>,
    pub statuses: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EncryptedAmountResponse {
    pub id: DebtId,
    #[schema(value_type = String)]
    pub encrypted_amount: CiphertextHandle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OwnershipResponse {
    pub id: DebtId,
    #[schema(value_type = String)]
    pub caller: Address,
    pub is_owner: bool,
}

// =============================================================================
// Owner Index
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserDebtsResponse {
    #[schema(value_type = String)]
    pub owner: Address,
    pub ids: Vec<DebtId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserDebtIdResponse {
    pub index: u64,
    pub id: DebtId,
}

// =============================================================================
// Statistics & Events
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TypeCount {
    #[schema(value_type = u8, minimum = 0, maximum = 3)]
    pub debt_type: DebtType,
    pub name: String,
    pub count: u64,
}

impl TypeCount {
    pub fn new(debt_type: DebtType, count: u64) -> Self {
        Self {
            debt_type,
            name: debt_type.name().to_string(),
            count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub total_debts: u64,
    pub type_counts: Vec<TypeCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventsResponse {
    pub events: Vec<DebtSubmitted>,
    /// Pass as `after` to fetch the next page; absent on the last page.
    pub next_cursor: Option<DebtId>,
}

// =============================================================================
// Co-processor
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EncryptRequest {
    /// Target contract; defaults to this registry.
    #[schema(value_type = Option<String>)]
    pub contract_address: Option<Address>,
    /// `{"type": "address" | "u32", "value": ...}` items.
    #[schema(value_type = Vec<Object>)]
    pub values: Vec<FheValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDecryptResponse {
    /// `{"handle": ..., "type": ..., "value": ...}` items.
    #[schema(value_type = Vec<Object>)]
    pub values: Vec<DecryptedValue>,
}
