// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Caller Authentication
//!
//! Mutating endpoints act on behalf of an EVM account, the `caller`.
//!
//! ## Signed Requests
//!
//! 1. Client picks the current unix time `ts`
//! 2. Client signs `encrypted-debt-register:{METHOD}:{path}:{ts}` with its
//!    wallet (EIP-191 personal message)
//! 3. Client sends `x-caller-address`, `x-caller-timestamp`,
//!    `x-caller-signature`
//! 4. Server recovers the signer and requires it to equal the address
//!
//! ## Security
//!
//! - Clock skew tolerance is 60 seconds
//! - `AuthMode::Insecure` trusts `x-caller-address` as-is and is only
//!   selectable from configuration in `dev` builds

pub mod error;
pub mod extractor;

pub use error::AuthError;
pub use extractor::{signing_message, AuthMode, Caller};
