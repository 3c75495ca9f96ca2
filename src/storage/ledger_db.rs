// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded ledger database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `debt_records`: id → serialized DebtRecord
//! - `owner_debt_index`: composite key (owner|position_be) → id
//! - `owner_debt_counts`: owner → number of ids in the owner index
//! - `debt_type_counts`: type code → records ever created with that type
//! - `ledger_meta`: key → value (`total_debts` global counter)
//! - `debt_events`: id → serialized DebtSubmitted
//!
//! ## Transactions
//!
//! Mutations go through [`LedgerDb::write`]: the closure runs inside a single
//! redb write transaction that commits only if the closure returns `Ok`.
//! redb serializes writers, so operations are totally ordered, and readers
//! see only committed snapshots.

use std::path::Path;

use alloy::primitives::Address;
use redb::{
    backends::InMemoryBackend, Database, ReadTransaction, ReadableDatabase, ReadableTable,
    TableDefinition, WriteTransaction,
};

use crate::registry::{DebtId, DebtRecord, DebtSubmitted, DebtType};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: id → serialized DebtRecord (JSON bytes).
const DEBT_RECORDS: TableDefinition<u64, &[u8]> = TableDefinition::new("debt_records");

/// Owner index: `owner(20) | position_be(8)` → id. Positions are dense from 0.
const OWNER_DEBT_INDEX: TableDefinition<&[u8], u64> = TableDefinition::new("owner_debt_index");

/// Owner index length: owner(20) → count.
const OWNER_DEBT_COUNTS: TableDefinition<&[u8], u64> = TableDefinition::new("owner_debt_counts");

/// Type counters: debt type code → count. Never decremented.
const DEBT_TYPE_COUNTS: TableDefinition<u8, u64> = TableDefinition::new("debt_type_counts");

/// Scalar ledger state.
const LEDGER_META: TableDefinition<&str, u64> = TableDefinition::new("ledger_meta");

/// Creation events: id → serialized DebtSubmitted (JSON bytes).
const DEBT_EVENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("debt_events");

const TOTAL_DEBTS_KEY: &str = "total_debts";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LedgerDbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LedgerDbResult<T> = Result<T, LedgerDbError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the owner_debt_index table.
///
/// Format: `owner_bytes | position_be_bytes`. Big-endian positions keep one
/// owner's entries contiguous and in insertion order.
fn make_index_key(owner: &Address, position: u64) -> [u8; 28] {
    let mut key = [0u8; 28];
    key[..20].copy_from_slice(owner.as_slice());
    key[20..].copy_from_slice(&position.to_be_bytes());
    key
}

fn read_record(
    table: &impl ReadableTable<u64, &'static [u8]>,
    id: DebtId,
) -> LedgerDbResult<Option<DebtRecord>> {
    match table.get(id)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

fn read_u64(table: &impl ReadableTable<&'static [u8], u64>, key: &[u8]) -> LedgerDbResult<u64> {
    Ok(table.get(key)?.map(|v| v.value()).unwrap_or(0))
}

fn read_total(table: &impl ReadableTable<&'static str, u64>) -> LedgerDbResult<u64> {
    Ok(table.get(TOTAL_DEBTS_KEY)?.map(|v| v.value()).unwrap_or(0))
}

fn read_type_count(
    table: &impl ReadableTable<u8, u64>,
    debt_type: DebtType,
) -> LedgerDbResult<u64> {
    Ok(table.get(debt_type.code())?.map(|v| v.value()).unwrap_or(0))
}

fn read_owner_id_at(
    table: &impl ReadableTable<&'static [u8], u64>,
    owner: &Address,
    position: u64,
) -> LedgerDbResult<Option<DebtId>> {
    let key = make_index_key(owner, position);
    Ok(table.get(key.as_slice())?.map(|v| v.value()))
}

fn read_owner_ids(
    table: &impl ReadableTable<&'static [u8], u64>,
    owner: &Address,
) -> LedgerDbResult<Vec<DebtId>> {
    let start = make_index_key(owner, 0);
    let end = make_index_key(owner, u64::MAX);

    let mut ids = Vec::new();
    for entry in table.range(start.as_slice()..=end.as_slice())? {
        let (_, id) = entry?;
        ids.push(id.value());
    }
    Ok(ids)
}

fn read_events(
    table: &impl ReadableTable<u64, &'static [u8]>,
    after: DebtId,
    limit: usize,
) -> LedgerDbResult<Vec<DebtSubmitted>> {
    let Some(start) = after.checked_add(1) else {
        return Ok(Vec::new());
    };

    let mut events = Vec::with_capacity(limit.min(256));
    for entry in table.range(start..)? {
        if events.len() >= limit {
            break;
        }
        let (_, value) = entry?;
        events.push(serde_json::from_slice(value.value())?);
    }
    Ok(events)
}

// =============================================================================
// Read Access
// =============================================================================

/// Read operations shared by read and write transactions.
pub trait LedgerView {
    /// Look up a record by id.
    fn record(&self, id: DebtId) -> LedgerDbResult<Option<DebtRecord>>;

    /// Global counter: records ever created.
    fn total_debts(&self) -> LedgerDbResult<u64>;

    /// Records ever created with `debt_type`.
    fn type_count(&self, debt_type: DebtType) -> LedgerDbResult<u64>;

    /// Length of an owner's index.
    fn owner_debt_count(&self, owner: &Address) -> LedgerDbResult<u64>;

    /// Id at `position` in an owner's index.
    fn owner_debt_id_at(&self, owner: &Address, position: u64) -> LedgerDbResult<Option<DebtId>>;

    /// An owner's full index, in insertion order.
    fn owner_debt_ids(&self, owner: &Address) -> LedgerDbResult<Vec<DebtId>>;

    /// Up to `limit` creation events with id greater than `after`.
    fn events_after(&self, after: DebtId, limit: usize) -> LedgerDbResult<Vec<DebtSubmitted>>;
}

/// Both transaction kinds expose `open_table`, so one body serves each.
macro_rules! impl_ledger_view {
    ($($view:ty),+ $(,)?) => {$(
        impl LedgerView for $view {
            fn record(&self, id: DebtId) -> LedgerDbResult<Option<DebtRecord>> {
                read_record(&self.txn.open_table(DEBT_RECORDS)?, id)
            }

            fn total_debts(&self) -> LedgerDbResult<u64> {
                read_total(&self.txn.open_table(LEDGER_META)?)
            }

            fn type_count(&self, debt_type: DebtType) -> LedgerDbResult<u64> {
                read_type_count(&self.txn.open_table(DEBT_TYPE_COUNTS)?, debt_type)
            }

            fn owner_debt_count(&self, owner: &Address) -> LedgerDbResult<u64> {
                read_u64(&self.txn.open_table(OWNER_DEBT_COUNTS)?, owner.as_slice())
            }

            fn owner_debt_id_at(
                &self,
                owner: &Address,
                position: u64,
            ) -> LedgerDbResult<Option<DebtId>> {
                read_owner_id_at(&self.txn.open_table(OWNER_DEBT_INDEX)?, owner, position)
            }

            fn owner_debt_ids(&self, owner: &Address) -> LedgerDbResult<Vec<DebtId>> {
                read_owner_ids(&self.txn.open_table(OWNER_DEBT_INDEX)?, owner)
            }

            fn events_after(
                &self,
                after: DebtId,
                limit: usize,
            ) -> LedgerDbResult<Vec<DebtSubmitted>> {
                read_events(&self.txn.open_table(DEBT_EVENTS)?, after, limit)
            }
        }
    )+};
}

/// Snapshot view over committed ledger state.
pub struct LedgerReader {
    txn: ReadTransaction,
}

/// Mutable view inside an open write transaction.
///
/// Reads observe this transaction's own uncommitted writes.
pub struct LedgerWriter {
    txn: WriteTransaction,
}

impl_ledger_view!(LedgerReader, LedgerWriter);

impl LedgerWriter {
    /// Insert or replace a record.
    pub fn put_record(&mut self, record: &DebtRecord) -> LedgerDbResult<()> {
        let json = serde_json::to_vec(record)?;
        let mut table = self.txn.open_table(DEBT_RECORDS)?;
        table.insert(record.id, json.as_slice())?;
        Ok(())
    }

    /// Append `id` to the owner's index and return its position.
    pub fn append_owner_debt(&mut self, owner: &Address, id: DebtId) -> LedgerDbResult<u64> {
        let position = self.owner_debt_count(owner)?;
        {
            let mut index = self.txn.open_table(OWNER_DEBT_INDEX)?;
            let key = make_index_key(owner, position);
            index.insert(key.as_slice(), id)?;
        }
        let mut counts = self.txn.open_table(OWNER_DEBT_COUNTS)?;
        counts.insert(owner.as_slice(), position + 1)?;
        Ok(position)
    }

    /// Bump the counter for `debt_type` and return the new value.
    pub fn increment_type_count(&mut self, debt_type: DebtType) -> LedgerDbResult<u64> {
        let next = self.type_count(debt_type)? + 1;
        let mut table = self.txn.open_table(DEBT_TYPE_COUNTS)?;
        table.insert(debt_type.code(), next)?;
        Ok(next)
    }

    /// Persist the global counter.
    pub fn set_total_debts(&mut self, total: u64) -> LedgerDbResult<()> {
        let mut table = self.txn.open_table(LEDGER_META)?;
        table.insert(TOTAL_DEBTS_KEY, total)?;
        Ok(())
    }

    /// Append a creation event.
    pub fn put_event(&mut self, event: &DebtSubmitted) -> LedgerDbResult<()> {
        let json = serde_json::to_vec(event)?;
        let mut table = self.txn.open_table(DEBT_EVENTS)?;
        table.insert(event.id, json.as_slice())?;
        Ok(())
    }
}

// =============================================================================
// LedgerDb
// =============================================================================

/// Embedded ACID ledger database.
pub struct LedgerDb {
    db: Database,
}

impl LedgerDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> LedgerDbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Database::create(path)?)
    }

    /// Create a database that lives only in memory.
    pub fn in_memory() -> LedgerDbResult<Self> {
        Self::init(Database::builder().create_with_backend(InMemoryBackend::new())?)
    }

    fn init(db: Database) -> LedgerDbResult<Self> {
        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DEBT_RECORDS)?;
            let _ = write_txn.open_table(OWNER_DEBT_INDEX)?;
            let _ = write_txn.open_table(OWNER_DEBT_COUNTS)?;
            let _ = write_txn.open_table(DEBT_TYPE_COUNTS)?;
            let _ = write_txn.open_table(LEDGER_META)?;
            let _ = write_txn.open_table(DEBT_EVENTS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Run `f` against a committed snapshot.
    pub fn read<T, E>(&self, f: impl FnOnce(&LedgerReader) -> Result<T, E>) -> Result<T, E>
    where
        E: From<LedgerDbError>,
    {
        let txn = self.db.begin_read().map_err(LedgerDbError::from)?;
        f(&LedgerReader { txn })
    }

    /// Run `f` inside a write transaction.
    ///
    /// Commits when `f` returns `Ok`; aborts otherwise, discarding every
    /// write `f` made.
    pub fn write<T, E>(&self, f: impl FnOnce(&mut LedgerWriter) -> Result<T, E>) -> Result<T, E>
    where
        E: From<LedgerDbError>,
    {
        let txn = self.db.begin_write().map_err(LedgerDbError::from)?;
        let mut writer = LedgerWriter { txn };

        match f(&mut writer) {
            Ok(value) => {
                writer.txn.commit().map_err(LedgerDbError::from)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = writer.txn.abort() {
                    tracing::warn!(error = %abort_err, "Failed to abort ledger transaction");
                }
                Err(e)
            }
        }
    }

    /// Verify the database answers a read transaction.
    pub fn health_check(&self) -> LedgerDbResult<()> {
        self.read(|reader| reader.total_debts().map(|_| ()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CiphertextHandle;
    use alloy::primitives::{address, B256};

    const ALICE: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
    const BOB: Address = address!("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");

    fn temp_db() -> (LedgerDb, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = LedgerDb::open(&dir.path().join("ledger.redb")).unwrap();
        (db, dir)
    }

    fn sample_record(id: DebtId, submitter: Address) -> DebtRecord {
        DebtRecord {
            id,
            submitter,
            encrypted_amount: CiphertextHandle::new(B256::repeat_byte(id as u8)),
            debt_type: DebtType::Loan,
            timestamp: 1_700_000_000,
            is_active: true,
        }
    }

    #[test]
    fn put_and_get_record() {
        let (db, _dir) = temp_db();
        let record = sample_record(1, ALICE);
        db.write(|w| w.put_record(&record)).unwrap();

        let loaded = db.read(|r| r.record(1)).unwrap().unwrap();
        assert_eq!(loaded, record);
        assert!(db.read(|r| r.record(2)).unwrap().is_none());
    }

    #[test]
    fn owner_index_keeps_insertion_order_per_owner() {
        let db = LedgerDb::in_memory().unwrap();
        db.write(|w| {
            assert_eq!(w.append_owner_debt(&ALICE, 1)?, 0);
            assert_eq!(w.append_owner_debt(&BOB, 2)?, 0);
            assert_eq!(w.append_owner_debt(&ALICE, 3)?, 1);
            Ok::<_, LedgerDbError>(())
        })
        .unwrap();

        db.read(|r| {
            assert_eq!(r.owner_debt_count(&ALICE)?, 2);
            assert_eq!(r.owner_debt_count(&BOB)?, 1);
            assert_eq!(r.owner_debt_ids(&ALICE)?, vec![1, 3]);
            assert_eq!(r.owner_debt_ids(&BOB)?, vec![2]);
            assert_eq!(r.owner_debt_id_at(&ALICE, 1)?, Some(3));
            assert_eq!(r.owner_debt_id_at(&ALICE, 2)?, None);
            Ok::<_, LedgerDbError>(())
        })
        .unwrap();
    }

    #[test]
    fn writer_reads_its_own_uncommitted_writes() {
        let db = LedgerDb::in_memory().unwrap();
        db.write(|w| {
            w.put_record(&sample_record(1, ALICE))?;
            w.append_owner_debt(&ALICE, 1)?;
            w.increment_type_count(DebtType::Loan)?;
            w.set_total_debts(1)?;

            assert!(w.record(1)?.is_some());
            assert_eq!(w.total_debts()?, 1);
            assert_eq!(w.type_count(DebtType::Loan)?, 1);
            assert_eq!(w.owner_debt_count(&ALICE)?, 1);
            assert_eq!(w.owner_debt_id_at(&ALICE, 0)?, Some(1));
            assert_eq!(w.owner_debt_ids(&ALICE)?, vec![1]);
            assert!(w.events_after(0, 10)?.is_empty());
            Ok::<_, LedgerDbError>(())
        })
        .unwrap();
    }

    #[test]
    fn failed_write_leaves_no_trace() {
        let db = LedgerDb::in_memory().unwrap();
        let result: Result<(), LedgerDbError> = db.write(|w| {
            w.put_record(&sample_record(1, ALICE))?;
            w.set_total_debts(1)?;
            Err(LedgerDbError::Io(std::io::Error::other("rejected")))
        });
        assert!(result.is_err());

        db.read(|r| {
            assert!(r.record(1)?.is_none());
            assert_eq!(r.total_debts()?, 0);
            Ok::<_, LedgerDbError>(())
        })
        .unwrap();
    }

    #[test]
    fn counters_start_at_zero() {
        let db = LedgerDb::in_memory().unwrap();
        db.write(|w| w.increment_type_count(DebtType::Other).map(|_| ()))
            .unwrap();

        db.read(|r| {
            assert_eq!(r.total_debts()?, 0);
            assert_eq!(r.type_count(DebtType::Loan)?, 0);
            assert_eq!(r.type_count(DebtType::Other)?, 1);
            Ok::<_, LedgerDbError>(())
        })
        .unwrap();
    }

    #[test]
    fn events_paginate_by_id() {
        let db = LedgerDb::in_memory().unwrap();
        db.write(|w| {
            for id in 1..=5 {
                w.put_event(&DebtSubmitted {
                    id,
                    submitter: ALICE,
                    debt_type: DebtType::Loan,
                    timestamp: 1_700_000_000 + id,
                })?;
            }
            Ok::<_, LedgerDbError>(())
        })
        .unwrap();

        let page1 = db.read(|r| r.events_after(0, 2)).unwrap();
        assert_eq!(page1.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2]);

        let page3 = db.read(|r| r.events_after(4, 2)).unwrap();
        assert_eq!(page3.iter().map(|e| e.id).collect::<Vec<_>>(), vec![5]);

        assert!(db.read(|r| r.events_after(u64::MAX, 10)).unwrap().is_empty());
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.redb");
        {
            let db = LedgerDb::open(&path).unwrap();
            db.write(|w| {
                w.put_record(&sample_record(1, ALICE))?;
                w.set_total_debts(1)
            })
            .unwrap();
        }

        let db = LedgerDb::open(&path).unwrap();
        assert_eq!(db.read(|r| r.total_debts()).unwrap(), 1);
        assert!(db.read(|r| r.record(1)).unwrap().is_some());
    }

    #[test]
    fn index_key_ordering() {
        let first = make_index_key(&ALICE, 1);
        let second = make_index_key(&ALICE, 256);
        assert!(first < second, "Positions should sort numerically");
    }
}
