// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the calling account.
//!
//! Use the `Caller` extractor in handlers that act on behalf of an account:
//!
//! ```rust,ignore
//! async fn my_handler(Caller(caller): Caller) -> impl IntoResponse {
//!     // caller is an alloy Address
//! }
//! ```

use std::str::FromStr;

use alloy::primitives::{Address, Signature};
use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{request::Parts, HeaderMap, Method},
};

use super::AuthError;
use crate::state::AppState;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

pub const CALLER_ADDRESS_HEADER: &str = "x-caller-address";
pub const CALLER_TIMESTAMP_HEADER: &str = "x-caller-timestamp";
pub const CALLER_SIGNATURE_HEADER: &str = "x-caller-signature";

/// How callers prove who they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// EIP-191 signature over method, path and timestamp.
    #[default]
    Signed,
    /// Trust `x-caller-address` without a signature. Development only.
    Insecure,
}

/// The message a caller signs for one request.
pub fn signing_message(method: &Method, path: &str, timestamp: i64) -> String {
    format!("encrypted-debt-register:{method}:{path}:{timestamp}")
}

/// Extractor for the calling account.
///
/// ## Authentication Modes
///
/// - **Signed** (default): address, timestamp and signature headers are all
///   required and the signature must recover to the address
/// - **Insecure**: only the address header is read
pub struct Caller(pub Address);

impl FromRequestParts<AppState> for Caller {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let address = header(&parts.headers, CALLER_ADDRESS_HEADER)
            .ok_or(AuthError::MissingCallerAddress)?;
        let address = Address::from_str(address).map_err(|_| AuthError::InvalidCallerAddress)?;

        if state.auth_mode == AuthMode::Insecure {
            return Ok(Caller(address));
        }

        // Nested routers see a stripped URI; sign over the full path.
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map(|uri| uri.path().to_owned())
            .unwrap_or_else(|| parts.uri.path().to_owned());

        verify_signed_request(
            &parts.headers,
            &parts.method,
            &path,
            address,
            chrono::Utc::now().timestamp(),
        )?;
        Ok(Caller(address))
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Check the timestamp window and that the signature recovers to `address`.
fn verify_signed_request(
    headers: &HeaderMap,
    method: &Method,
    path: &str,
    address: Address,
    now: i64,
) -> Result<(), AuthError> {
    let timestamp: i64 = header(headers, CALLER_TIMESTAMP_HEADER)
        .ok_or(AuthError::MissingTimestamp)?
        .parse()
        .map_err(|_| AuthError::InvalidTimestamp)?;
    let skew = now.checked_sub(timestamp).map(i64::unsigned_abs);
    if skew.is_none_or(|skew| skew > CLOCK_SKEW_LEEWAY) {
        tracing::debug!(caller = %address, timestamp, now, "Stale request timestamp");
        return Err(AuthError::StaleTimestamp);
    }

    let signature = header(headers, CALLER_SIGNATURE_HEADER).ok_or(AuthError::MissingSignature)?;
    let signature = Signature::from_str(signature).map_err(|_| AuthError::InvalidSignature)?;

    let message = signing_message(method, path, timestamp);
    let recovered = signature
        .recover_address_from_msg(message.as_bytes())
        .map_err(|_| AuthError::InvalidSignature)?;

    if recovered != address {
        tracing::warn!(caller = %address, recovered = %recovered, "Request signed by another account");
        return Err(AuthError::InvalidSignature);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::{local::PrivateKeySigner, SignerSync};
    use axum::http::{HeaderValue, Request};

    const NOW: i64 = 1_700_000_000;

    fn signed_headers(signer: &PrivateKeySigner, method: &Method, path: &str, ts: i64) -> HeaderMap {
        let signature = signer
            .sign_message_sync(signing_message(method, path, ts).as_bytes())
            .unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            CALLER_ADDRESS_HEADER,
            HeaderValue::from_str(&signer.address().to_string()).unwrap(),
        );
        headers.insert(CALLER_TIMESTAMP_HEADER, HeaderValue::from(ts));
        headers.insert(
            CALLER_SIGNATURE_HEADER,
            HeaderValue::from_str(&signature.to_string()).unwrap(),
        );
        headers
    }

    #[test]
    fn valid_signature_is_accepted() {
        let signer = PrivateKeySigner::random();
        let headers = signed_headers(&signer, &Method::POST, "/v1/debts", NOW);
        verify_signed_request(&headers, &Method::POST, "/v1/debts", signer.address(), NOW + 5)
            .unwrap();
    }

    #[test]
    fn signature_is_bound_to_method_and_path() {
        let signer = PrivateKeySigner::random();
        let headers = signed_headers(&signer, &Method::POST, "/v1/debts", NOW);

        let other_path =
            verify_signed_request(&headers, &Method::POST, "/v1/debts/1/status", signer.address(), NOW);
        assert!(matches!(other_path, Err(AuthError::InvalidSignature)));

        let other_method =
            verify_signed_request(&headers, &Method::PUT, "/v1/debts", signer.address(), NOW);
        assert!(matches!(other_method, Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn signature_for_another_address_is_rejected() {
        let signer = PrivateKeySigner::random();
        let headers = signed_headers(&signer, &Method::POST, "/v1/debts", NOW);
        let result =
            verify_signed_request(&headers, &Method::POST, "/v1/debts", Address::repeat_byte(1), NOW);
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let signer = PrivateKeySigner::random();
        let headers = signed_headers(&signer, &Method::POST, "/v1/debts", NOW);
        let result =
            verify_signed_request(&headers, &Method::POST, "/v1/debts", signer.address(), NOW + 61);
        assert!(matches!(result, Err(AuthError::StaleTimestamp)));
    }

    #[test]
    fn extreme_timestamps_are_stale() {
        for ts in [i64::MIN, i64::MAX] {
            let mut headers = HeaderMap::new();
            headers.insert(CALLER_TIMESTAMP_HEADER, HeaderValue::from(ts));
            let result = verify_signed_request(&headers, &Method::POST, "/v1/debts", Address::ZERO, NOW);
            assert!(matches!(result, Err(AuthError::StaleTimestamp)), "timestamp {ts}");
        }

        let mut headers = HeaderMap::new();
        headers.insert(CALLER_TIMESTAMP_HEADER, HeaderValue::from(i64::MIN));
        let result = verify_signed_request(&headers, &Method::POST, "/", Address::ZERO, i64::MAX);
        assert!(matches!(result, Err(AuthError::StaleTimestamp)));
    }

    #[test]
    fn missing_headers_are_reported() {
        let mut headers = HeaderMap::new();
        let result = verify_signed_request(&headers, &Method::POST, "/", Address::ZERO, NOW);
        assert!(matches!(result, Err(AuthError::MissingTimestamp)));

        headers.insert(CALLER_TIMESTAMP_HEADER, HeaderValue::from(NOW));
        let result = verify_signed_request(&headers, &Method::POST, "/", Address::ZERO, NOW);
        assert!(matches!(result, Err(AuthError::MissingSignature)));
    }

    #[tokio::test]
    async fn insecure_mode_trusts_address_header() {
        let state = AppState::new_in_memory(AuthMode::Insecure);
        let (mut parts, _) = Request::builder()
            .uri("/v1/debts")
            .header(CALLER_ADDRESS_HEADER, "0x70997970C51812dc3A010C7d01b50e0d17dc79C8")
            .body(())
            .unwrap()
            .into_parts();

        let Caller(caller) = Caller::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(
            caller,
            Address::from_str("0x70997970C51812dc3A010C7d01b50e0d17dc79C8").unwrap()
        );
    }

    #[tokio::test]
    async fn signed_mode_requires_signature() {
        let state = AppState::new_in_memory(AuthMode::Signed);
        let (mut parts, _) = Request::builder()
            .uri("/v1/debts")
            .header(CALLER_ADDRESS_HEADER, "0x70997970C51812dc3A010C7d01b50e0d17dc79C8")
            .body(())
            .unwrap()
            .into_parts();

        let result = Caller::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingTimestamp)));
    }

    #[tokio::test]
    async fn malformed_address_is_rejected() {
        let state = AppState::new_in_memory(AuthMode::Insecure);
        let (mut parts, _) = Request::builder()
            .uri("/v1/debts")
            .header(CALLER_ADDRESS_HEADER, "alice")
            .body(())
            .unwrap()
            .into_parts();

        let result = Caller::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidCallerAddress)));
    }
}
