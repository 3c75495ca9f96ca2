// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Debt registry ledger.
//!
//! Owns the ledger rules: id allocation, the per-owner index, type counters,
//! and submitter-only status changes. Persistence is delegated to
//! [`LedgerDb`]; ciphertext verification and access grants to a
//! [`Coprocessor`].
//!
//! Every mutating operation validates first and then runs inside one ledger
//! write transaction. Any error returned from inside the transaction aborts
//! it, so a rejected call leaves no partial state. Co-processor access grants
//! are not part of that transaction and are issued only after it commits.

mod error;
mod types;

use std::collections::HashSet;
use std::sync::Arc;

use alloy::primitives::Address;

use crate::coprocessor::{Coprocessor, CoprocessorError, FheType};
use crate::storage::{LedgerDb, LedgerView};

pub use error::{RegistryError, RegistryResult};
pub use types::{
    CiphertextHandle, DebtId, DebtMetadata, DebtRecord, DebtSubmitted, DebtType, InputProof,
    UserDebtSummary, MAX_BATCH_SIZE,
};

/// Registry state: the ledger database, the co-processor it trusts, and the
/// address encrypted inputs must be bound to.
pub struct DebtRegistry {
    db: LedgerDb,
    coprocessor: Arc<dyn Coprocessor>,
    contract: Address,
}

impl DebtRegistry {
    pub fn new(db: LedgerDb, coprocessor: Arc<dyn Coprocessor>, contract: Address) -> Self {
        Self {
            db,
            coprocessor,
            contract,
        }
    }

    /// Identity address encrypted inputs are bound to.
    pub fn contract_address(&self) -> Address {
        self.contract
    }

    pub fn db(&self) -> &LedgerDb {
        &self.db
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Record a new debt submitted by `caller`.
    ///
    /// `submitter_handle` must be an encrypted address and `amount_handle` an
    /// encrypted u32, both certified by `proof` for `caller` and this
    /// registry. Once the record is committed the registry and the caller are
    /// granted access to the amount. If a grant fails at that point the record
    /// stays and the error is returned.
    pub fn submit_debt(
        &self,
        caller: Address,
        submitter_handle: &CiphertextHandle,
        amount_handle: &CiphertextHandle,
        proof: &InputProof,
        debt_type: i64,
    ) -> RegistryResult<DebtSubmitted> {
        let debt_type = DebtType::try_from(debt_type).inspect_err(|_| {
            tracing::warn!(caller = %caller, debt_type, "Rejected submission: invalid debt type");
        })?;

        for (handle, expected) in [
            (submitter_handle, FheType::Address),
            (amount_handle, FheType::U32),
        ] {
            self.coprocessor
                .verify_input(self.contract, caller, handle, expected, proof)
                .map_err(|e| {
                    tracing::warn!(caller = %caller, error = %e, "Rejected submission: input proof");
                    RegistryError::InputRejected(e)
                })?;
        }

        if !self.coprocessor.is_known(amount_handle) {
            tracing::warn!(caller = %caller, handle = %amount_handle, "Rejected submission: unknown amount handle");
            return Err(RegistryError::InputRejected(CoprocessorError::UnknownHandle(
                *amount_handle,
            )));
        }

        let timestamp = unix_now();
        let event = self.db.write(|w| {
            let id = w
                .total_debts()?
                .checked_add(1)
                .ok_or(RegistryError::IdSpaceExhausted)?;
            let record = DebtRecord {
                id,
                submitter: caller,
                encrypted_amount: *amount_handle,
                debt_type,
                timestamp,
                is_active: true,
            };

            w.put_record(&record)?;
            w.append_owner_debt(&caller, id)?;
            w.increment_type_count(debt_type)?;
            w.set_total_debts(id)?;

            let event = DebtSubmitted {
                id,
                submitter: caller,
                debt_type,
                timestamp,
            };
            w.put_event(&event)?;
            Ok::<_, RegistryError>(event)
        })?;

        for account in [self.contract, caller] {
            self.coprocessor.allow(amount_handle, account).map_err(|e| {
                tracing::error!(debt_id = event.id, account = %account, error = %e, "Access grant failed after commit");
                RegistryError::AccessGrant(e)
            })?;
        }

        tracing::info!(
            debt_id = event.id,
            submitter = %caller,
            debt_type = %debt_type,
            "Debt submitted"
        );
        Ok(event)
    }

    /// Set the active flag of one record. Only its submitter may do this.
    pub fn update_status(&self, caller: Address, id: DebtId, is_active: bool) -> RegistryResult<()> {
        self.db.write(|w| {
            let mut record = owned_record(&*w, caller, id)?;
            if record.is_active != is_active {
                record.is_active = is_active;
                w.put_record(&record)?;
            }
            Ok::<_, RegistryError>(())
        })?;

        tracing::info!(debt_id = id, submitter = %caller, is_active, "Debt status updated");
        Ok(())
    }

    /// Apply several status changes as one unit.
    ///
    /// Every pair is checked before anything is written; one bad pair rejects
    /// the whole batch.
    pub fn batch_update_status(
        &self,
        caller: Address,
        ids: &[DebtId],
        statuses: &[bool],
    ) -> RegistryResult<()> {
        if ids.len() != statuses.len() {
            return Err(RegistryError::LengthMismatch {
                ids: ids.len(),
                statuses: statuses.len(),
            });
        }
        if ids.len() > MAX_BATCH_SIZE {
            tracing::warn!(caller = %caller, len = ids.len(), "Rejected batch: too many updates");
            return Err(RegistryError::TooManyUpdates {
                len: ids.len(),
                max: MAX_BATCH_SIZE,
            });
        }

        self.db.write(|w| {
            for &id in ids {
                owned_record(&*w, caller, id)?;
            }

            // Applied in order, so a repeated id ends with its last status.
            for (&id, &is_active) in ids.iter().zip(statuses) {
                let mut record = owned_record(&*w, caller, id)?;
                if record.is_active != is_active {
                    record.is_active = is_active;
                    w.put_record(&record)?;
                }
            }
            Ok::<_, RegistryError>(())
        })?;

        tracing::info!(submitter = %caller, count = ids.len(), "Debt statuses updated");
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn get_debt_metadata(&self, id: DebtId) -> RegistryResult<DebtMetadata> {
        self.get_debt(id).map(|record| record.metadata())
    }

    pub fn get_encrypted_amount(&self, id: DebtId) -> RegistryResult<CiphertextHandle> {
        self.get_debt(id).map(|record| record.encrypted_amount)
    }

    /// Full record by id.
    pub fn get_debt(&self, id: DebtId) -> RegistryResult<DebtRecord> {
        self.db
            .read(|r| r.record(id))?
            .ok_or(RegistryError::DebtNotFound(id))
    }

    pub fn get_user_debt_count(&self, owner: &Address) -> RegistryResult<u64> {
        Ok(self.db.read(|r| r.owner_debt_count(owner))?)
    }

    pub fn get_user_debt_id_at(&self, owner: &Address, index: u64) -> RegistryResult<DebtId> {
        self.db.read(|r| {
            match r.owner_debt_id_at(owner, index)? {
                Some(id) => Ok(id),
                None => Err(RegistryError::IndexOutOfBounds {
                    owner: *owner,
                    index,
                    len: r.owner_debt_count(owner)?,
                }),
            }
        })
    }

    /// Every id `owner` submitted, oldest first.
    pub fn get_user_debt_ids(&self, owner: &Address) -> RegistryResult<Vec<DebtId>> {
        Ok(self.db.read(|r| r.owner_debt_ids(owner))?)
    }

    pub fn get_total_debt_count(&self) -> RegistryResult<u64> {
        Ok(self.db.read(|r| r.total_debts())?)
    }

    pub fn type_count(&self, debt_type: DebtType) -> RegistryResult<u64> {
        Ok(self.db.read(|r| r.type_count(debt_type))?)
    }

    /// Counter for every debt type, read from one snapshot.
    pub fn type_counts(&self) -> RegistryResult<Vec<(DebtType, u64)>> {
        self.db.read(|r| {
            DebtType::ALL
                .iter()
                .map(|&t| -> RegistryResult<(DebtType, u64)> { Ok((t, r.type_count(t)?)) })
                .collect()
        })
    }

    /// True iff `caller` submitted `id`. Unknown ids yield `false`.
    pub fn validate_ownership(&self, caller: &Address, id: DebtId) -> RegistryResult<bool> {
        let record = self.db.read(|r| r.record(id))?;
        Ok(record.is_some_and(|record| record.submitter == *caller))
    }

    /// Totals over `owner`'s records, computed by scanning their index.
    pub fn get_user_debt_summary(&self, owner: &Address) -> RegistryResult<UserDebtSummary> {
        self.db.read(|r| {
            let mut summary = UserDebtSummary::default();
            let mut types = HashSet::new();

            for id in r.owner_debt_ids(owner)? {
                let record = r.record(id)?.ok_or(RegistryError::DebtNotFound(id))?;
                summary.total += 1;
                if record.is_active {
                    summary.active += 1;
                }
                types.insert(record.debt_type);
            }

            summary.distinct_types_used = types.len() as u64;
            Ok(summary)
        })
    }

    /// Creation events with id greater than `after`, oldest first.
    pub fn events(&self, after: DebtId, limit: usize) -> RegistryResult<Vec<DebtSubmitted>> {
        Ok(self.db.read(|r| r.events_after(after, limit))?)
    }
}

/// Load `id` and check `caller` submitted it.
fn owned_record(view: &impl LedgerView, caller: Address, id: DebtId) -> RegistryResult<DebtRecord> {
    let record = view.record(id)?.ok_or(RegistryError::DebtNotFound(id))?;
    if record.submitter != caller {
        tracing::warn!(debt_id = id, caller = %caller, "Rejected status change: not the submitter");
        return Err(RegistryError::NotYourDebt { id, caller });
    }
    Ok(record)
}

fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

// =============================================================================
// Tests
// =============================================================================
