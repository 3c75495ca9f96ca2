// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persistent ledger storage.

mod ledger_db;

pub use ledger_db::{
    LedgerDb, LedgerDbError, LedgerDbResult, LedgerReader, LedgerView, LedgerWriter,
};
