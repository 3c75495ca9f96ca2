// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process co-processor.
//!
//! Keeps plaintexts and access grants in memory and signs input proofs with a
//! local key, so the full submit and decrypt flow runs without an external
//! FHE network.
//!
//! Fresh inputs sit in a bounded LRU until their first access grant; the
//! oldest unshared inputs are dropped once [`MAX_PENDING_INPUTS`] is reached.
//! Nothing here is persisted: after a restart, handles stored in a
//! file-backed ledger can no longer be decrypted.
//!
//! ## Proof Format
//!
//! ```text
//! count (1 byte) | handle_0 .. handle_{n-1} (32 bytes each) | signature (65 bytes)
//! ```
//!
//! The signature covers `keccak256(contract | caller | handles)`.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use alloy::{
    primitives::{keccak256, Address, Bytes, B256},
    signers::{local::PrivateKeySigner, Signature, SignerSync},
    sol_types::SolStruct,
};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    decryption_domain, Coprocessor, CoprocessorError, EncryptedInput, FheType, FheValue,
    UserDecryptRequestVerification, MAX_DECRYPT_CONTRACTS, MAX_DECRYPT_DURATION_DAYS,
};
use crate::registry::{CiphertextHandle, InputProof};

const SIGNATURE_LEN: usize = 65;
const HANDLE_LEN: usize = 32;
const SECONDS_PER_DAY: u64 = 86_400;

/// Byte of the handle carrying the FHE type code.
const TYPE_BYTE: usize = 30;
/// Byte of the handle carrying the handle format version.
const VERSION_BYTE: usize = 31;
const HANDLE_VERSION: u8 = 0;

/// Encrypted inputs kept while waiting for their first access grant.
pub const MAX_PENDING_INPUTS: usize = 10_000;

// =============================================================================
// Decryption Request Types
// =============================================================================

/// A handle and the contract it is being decrypted for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HandleContractPair {
    #[schema(value_type = String)]
    pub handle: CiphertextHandle,
    #[schema(value_type = String)]
    pub contract_address: Address,
}

/// A signed, time-boxed request to reveal values to their owner.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDecryptRequest {
    pub handle_contract_pairs: Vec<HandleContractPair>,
    #[schema(value_type = String)]
    pub user_address: Address,
    #[schema(value_type = Vec<String>)]
    pub contract_addresses: Vec<Address>,
    /// Unix seconds.
    pub start_timestamp: u64,
    pub duration_days: u64,
    /// EIP-712 signature over `UserDecryptRequestVerification`.
    #[schema(value_type = String)]
    pub signature: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptedValue {
    pub handle: CiphertextHandle,
    #[serde(flatten)]
    pub value: FheValue,
}

// =============================================================================
// MockCoprocessor
// =============================================================================

pub struct MockCoprocessor {
    signer: PrivateKeySigner,
    chain_id: u64,
    /// Encrypted but never shared. Evicted oldest first.
    pending: Mutex<LruCache<CiphertextHandle, FheValue>>,
    /// Shared with at least one account. Kept for the process lifetime.
    plaintexts: RwLock<HashMap<CiphertextHandle, FheValue>>,
    acl: RwLock<HashSet<(CiphertextHandle, Address)>>,
    nonce: AtomicU64,
}

impl MockCoprocessor {
    pub fn new(signer: PrivateKeySigner, chain_id: u64) -> Self {
        Self::with_pending_capacity(signer, chain_id, MAX_PENDING_INPUTS)
    }

    /// Mock holding at most `capacity` unshared inputs.
    pub fn with_pending_capacity(signer: PrivateKeySigner, chain_id: u64, capacity: usize) -> Self {
        tracing::info!(
            signer = %signer.address(),
            chain_id,
            pending_capacity = capacity,
            "Mock co-processor initialized"
        );
        Self {
            signer,
            chain_id,
            pending: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            plaintexts: RwLock::new(HashMap::new()),
            acl: RwLock::new(HashSet::new()),
            nonce: AtomicU64::new(0),
        }
    }

    /// Mock with a throwaway signing key.
    pub fn random(chain_id: u64) -> Self {
        Self::new(PrivateKeySigner::random(), chain_id)
    }

    /// Address whose signature input proofs must carry.
    pub fn signer_address(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Encrypt `values` as inputs from `caller` to `contract`.
    pub fn encrypt(
        &self,
        contract: Address,
        caller: Address,
        values: &[FheValue],
    ) -> Result<EncryptedInput, CoprocessorError> {
        let count = u8::try_from(values.len()).map_err(|_| {
            CoprocessorError::MalformedProof(format!("too many values: {}", values.len()))
        })?;
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed);

        let handles: Vec<CiphertextHandle> = values
            .iter()
            .enumerate()
            .map(|(index, value)| derive_handle(contract, caller, nonce, index as u8, value))
            .collect();

        let digest = proof_digest(contract, caller, &handles);
        let signature = self
            .signer
            .sign_hash_sync(&digest)
            .map_err(|e| CoprocessorError::Signing(e.to_string()))?;

        let mut proof = Vec::with_capacity(1 + HANDLE_LEN * handles.len() + SIGNATURE_LEN);
        proof.push(count);
        for handle in &handles {
            proof.extend_from_slice(handle.as_b256().as_slice());
        }
        proof.extend_from_slice(&signature.as_bytes());

        {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            for (handle, value) in handles.iter().zip(values) {
                if let Some((evicted, _)) = pending.push(*handle, *value) {
                    tracing::debug!(handle = %evicted, "Dropped unshared input");
                }
            }
        }

        tracing::debug!(
            contract = %contract,
            caller = %caller,
            count = handles.len(),
            "Encrypted input values"
        );

        Ok(EncryptedInput {
            handles,
            input_proof: InputProof::new(proof),
        })
    }

    /// Reveal handles to the user who signed `request`, as of `now` (unix seconds).
    pub fn user_decrypt(
        &self,
        request: &UserDecryptRequest,
        now: u64,
    ) -> Result<Vec<DecryptedValue>, CoprocessorError> {
        self.check_authorization(request, now)?;

        let plaintexts = self.plaintexts.read().unwrap_or_else(PoisonError::into_inner);
        let mut values = Vec::with_capacity(request.handle_contract_pairs.len());

        for pair in &request.handle_contract_pairs {
            if !request.contract_addresses.contains(&pair.contract_address) {
                return Err(CoprocessorError::InvalidAuthorization(format!(
                    "contract {} is not covered by the signature",
                    pair.contract_address
                )));
            }
            for account in [request.user_address, pair.contract_address] {
                if !self.is_allowed(&pair.handle, account) {
                    return Err(CoprocessorError::AccessDenied {
                        handle: pair.handle,
                        account,
                    });
                }
            }
            let value = plaintexts
                .get(&pair.handle)
                .copied()
                .ok_or(CoprocessorError::UnknownHandle(pair.handle))?;
            values.push(DecryptedValue {
                handle: pair.handle,
                value,
            });
        }

        tracing::info!(
            user = %request.user_address,
            count = values.len(),
            "User decryption served"
        );
        Ok(values)
    }

    fn check_authorization(
        &self,
        request: &UserDecryptRequest,
        now: u64,
    ) -> Result<(), CoprocessorError> {
        if request.contract_addresses.is_empty() {
            return Err(CoprocessorError::InvalidAuthorization(
                "no contract addresses".into(),
            ));
        }
        if request.contract_addresses.len() > MAX_DECRYPT_CONTRACTS {
            return Err(CoprocessorError::InvalidAuthorization(format!(
                "at most {MAX_DECRYPT_CONTRACTS} contract addresses allowed"
            )));
        }
        if request.duration_days == 0 || request.duration_days > MAX_DECRYPT_DURATION_DAYS {
            return Err(CoprocessorError::InvalidAuthorization(format!(
                "duration must be between 1 and {MAX_DECRYPT_DURATION_DAYS} days"
            )));
        }

        let end = request
            .duration_days
            .checked_mul(SECONDS_PER_DAY)
            .and_then(|d| request.start_timestamp.checked_add(d))
            .ok_or_else(|| CoprocessorError::InvalidAuthorization("window overflows".into()))?;
        if now < request.start_timestamp || now >= end {
            return Err(CoprocessorError::AuthorizationExpired { now });
        }

        let payload = UserDecryptRequestVerification::new(
            request.contract_addresses.clone(),
            request.start_timestamp,
            request.duration_days,
        );
        let hash = payload.eip712_signing_hash(&decryption_domain(self.chain_id));
        let signature = Signature::try_from(request.signature.as_ref())
            .map_err(|e| CoprocessorError::InvalidAuthorization(e.to_string()))?;
        let recovered = signature
            .recover_address_from_prehash(&hash)
            .map_err(|e| CoprocessorError::InvalidAuthorization(e.to_string()))?;

        if recovered != request.user_address {
            tracing::warn!(
                user = %request.user_address,
                recovered = %recovered,
                "Decryption authorization signed by another account"
            );
            return Err(CoprocessorError::InvalidAuthorization(
                "signature does not match user address".into(),
            ));
        }
        Ok(())
    }
}

impl Coprocessor for MockCoprocessor {
    fn verify_input(
        &self,
        contract: Address,
        caller: Address,
        handle: &CiphertextHandle,
        expected: FheType,
        proof: &InputProof,
    ) -> Result<(), CoprocessorError> {
        let (handles, signature) = parse_proof(proof.as_bytes())?;

        if !handles.contains(handle) {
            return Err(CoprocessorError::HandleNotInProof(*handle));
        }
        let actual = handle.as_b256()[TYPE_BYTE];
        if actual != expected.code() {
            return Err(CoprocessorError::TypeMismatch {
                handle: *handle,
                expected,
                actual,
            });
        }

        let digest = proof_digest(contract, caller, &handles);
        let recovered = signature
            .recover_address_from_prehash(&digest)
            .map_err(|_| CoprocessorError::InvalidProofSignature)?;
        if recovered != self.signer.address() {
            return Err(CoprocessorError::InvalidProofSignature);
        }
        Ok(())
    }

    fn allow(&self, handle: &CiphertextHandle, account: Address) -> Result<(), CoprocessorError> {
        {
            // Lock order: plaintexts, then pending.
            let mut plaintexts = self.plaintexts.write().unwrap_or_else(PoisonError::into_inner);
            if !plaintexts.contains_key(handle) {
                let value = self
                    .pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pop(handle)
                    .ok_or(CoprocessorError::UnknownHandle(*handle))?;
                plaintexts.insert(*handle, value);
            }
        }

        self.acl
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((*handle, account));
        tracing::debug!(handle = %handle, account = %account, "Access granted");
        Ok(())
    }

    fn is_known(&self, handle: &CiphertextHandle) -> bool {
        let plaintexts = self.plaintexts.read().unwrap_or_else(PoisonError::into_inner);
        plaintexts.contains_key(handle)
            || self
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(handle)
    }

    fn is_allowed(&self, handle: &CiphertextHandle, account: Address) -> bool {
        self.acl
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(*handle, account))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn derive_handle(
    contract: Address,
    caller: Address,
    nonce: u64,
    index: u8,
    value: &FheValue,
) -> CiphertextHandle {
    let mut preimage = Vec::with_capacity(20 + 20 + 8 + 1 + 32);
    preimage.extend_from_slice(contract.as_slice());
    preimage.extend_from_slice(caller.as_slice());
    preimage.extend_from_slice(&nonce.to_be_bytes());
    preimage.push(index);
    preimage.extend_from_slice(&value.to_u256().to_be_bytes::<32>());

    let mut raw = keccak256(&preimage);
    raw[TYPE_BYTE] = value.fhe_type().code();
    raw[VERSION_BYTE] = HANDLE_VERSION;
    CiphertextHandle::new(raw)
}

fn proof_digest(contract: Address, caller: Address, handles: &[CiphertextHandle]) -> B256 {
    let mut preimage = Vec::with_capacity(40 + HANDLE_LEN * handles.len());
    preimage.extend_from_slice(contract.as_slice());
    preimage.extend_from_slice(caller.as_slice());
    for handle in handles {
        preimage.extend_from_slice(handle.as_b256().as_slice());
    }
    keccak256(&preimage)
}

fn parse_proof(proof: &[u8]) -> Result<(Vec<CiphertextHandle>, Signature), CoprocessorError> {
    let (&count, rest) = proof
        .split_first()
        .ok_or_else(|| CoprocessorError::MalformedProof("empty proof".into()))?;

    let handles_len = HANDLE_LEN * count as usize;
    if rest.len() != handles_len + SIGNATURE_LEN {
        return Err(CoprocessorError::MalformedProof(format!(
            "expected {} bytes for {count} handles, got {}",
            1 + handles_len + SIGNATURE_LEN,
            proof.len()
        )));
    }

    let (handle_bytes, sig_bytes) = rest.split_at(handles_len);
    let handles = handle_bytes
        .chunks_exact(HANDLE_LEN)
        .map(|chunk| CiphertextHandle::new(B256::from_slice(chunk)))
        .collect();
    let signature = Signature::try_from(sig_bytes)
        .map_err(|e| CoprocessorError::MalformedProof(e.to_string()))?;

    Ok((handles, signature))
}

// =============================================================================
// Tests
// =============================================================================
