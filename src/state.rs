// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::AuthMode;
use crate::config::{DEFAULT_CHAIN_ID, DEFAULT_CONTRACT_ADDRESS};
use crate::coprocessor::MockCoprocessor;
use crate::registry::DebtRegistry;
use crate::storage::{LedgerDb, LedgerDbResult};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<DebtRegistry>,
    /// The co-processor the registry trusts, also serving encrypt/decrypt.
    pub coprocessor: Arc<MockCoprocessor>,
    pub auth_mode: AuthMode,
}

impl AppState {
    pub fn new(registry: Arc<DebtRegistry>, coprocessor: Arc<MockCoprocessor>, auth_mode: AuthMode) -> Self {
        Self {
            registry,
            coprocessor,
            auth_mode,
        }
    }

    /// Wire a registry over `db` with `coprocessor` as its trusted service.
    pub fn build(
        db: LedgerDb,
        coprocessor: Arc<MockCoprocessor>,
        contract: alloy::primitives::Address,
        auth_mode: AuthMode,
    ) -> Self {
        let registry = DebtRegistry::new(db, coprocessor.clone(), contract);
        Self::new(Arc::new(registry), coprocessor, auth_mode)
    }

    /// Fresh in-memory ledger on the default contract and chain.
    pub fn try_in_memory(auth_mode: AuthMode) -> LedgerDbResult<Self> {
        Ok(Self::build(
            LedgerDb::in_memory()?,
            Arc::new(MockCoprocessor::random(DEFAULT_CHAIN_ID)),
            DEFAULT_CONTRACT_ADDRESS,
            auth_mode,
        ))
    }

    #[cfg(test)]
    pub fn new_in_memory(auth_mode: AuthMode) -> Self {
        Self::try_in_memory(auth_mode).unwrap()
    }
}
