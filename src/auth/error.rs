// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Caller authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
#[derive(Debug)]
pub enum AuthError {
    /// No x-caller-address header present
    MissingCallerAddress,
    /// x-caller-address is not a 20-byte hex address
    InvalidCallerAddress,
    /// No x-caller-timestamp header present
    MissingTimestamp,
    /// x-caller-timestamp is not unix seconds
    InvalidTimestamp,
    /// Timestamp outside the accepted skew window
    StaleTimestamp,
    /// No x-caller-signature header present
    MissingSignature,
    /// Signature is malformed or does not recover to the caller
    InvalidSignature,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCallerAddress => "missing_caller_address",
            AuthError::InvalidCallerAddress => "invalid_caller_address",
            AuthError::MissingTimestamp => "missing_timestamp",
            AuthError::InvalidTimestamp => "invalid_timestamp",
            AuthError::StaleTimestamp => "stale_timestamp",
            AuthError::MissingSignature => "missing_signature",
            AuthError::InvalidSignature => "invalid_signature",
        }
    }

    /// Every authentication failure is a 401.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCallerAddress => write!(f, "x-caller-address header is required"),
            AuthError::InvalidCallerAddress => write!(f, "x-caller-address is not a valid address"),
            AuthError::MissingTimestamp => write!(f, "x-caller-timestamp header is required"),
            AuthError::InvalidTimestamp => {
                write!(f, "x-caller-timestamp must be unix seconds")
            }
            AuthError::StaleTimestamp => write!(f, "Request timestamp is outside the allowed window"),
            AuthError::MissingSignature => write!(f, "x-caller-signature header is required"),
            AuthError::InvalidSignature => {
                write!(f, "Request signature does not match the caller address")
            }
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
