// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Encrypted Debt Register - Confidential Debt Ledger Service
//!
//! An append-only ledger of debt records whose amounts are FHE ciphertext
//! handles. The ledger indexes records per owner and counts them per type,
//! but never sees a plaintext amount.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Signed-request caller authentication
//! - `coprocessor` - FHE co-processor boundary and local mock
//! - `registry` - Ledger rules (ids, owner index, counters, status)
//! - `storage` - Embedded ACID ledger database (redb)

pub mod api;
pub mod auth;
pub mod config;
pub mod coprocessor;
pub mod error;
pub mod models;
pub mod registry;
pub mod state;
pub mod storage;
