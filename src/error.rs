// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::coprocessor::CoprocessorError;
use crate::registry::RegistryError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: &'static str,
}

/// JSON body of every error response.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub error_code: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "unprocessable", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    /// Replace the generic code with a specific one.
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = code;
        self
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let code = err.error_code();
        let api = match &err {
            RegistryError::InvalidDebtType(_)
            | RegistryError::TooManyUpdates { .. }
            | RegistryError::LengthMismatch { .. } => Self::bad_request(err.to_string()),
            RegistryError::NotYourDebt { .. } => Self::forbidden(err.to_string()),
            RegistryError::DebtNotFound(_) | RegistryError::IndexOutOfBounds { .. } => {
                Self::not_found(err.to_string())
            }
            RegistryError::InputRejected(_) => Self::unprocessable(err.to_string()),
            RegistryError::AccessGrant(_)
            | RegistryError::IdSpaceExhausted
            | RegistryError::Storage(_) => {
                tracing::error!(error = %err, "Registry operation failed");
                Self::internal("Ledger operation failed")
            }
        };
        api.with_code(code)
    }
}

impl From<CoprocessorError> for ApiError {
    fn from(err: CoprocessorError) -> Self {
        let code = err.error_code();
        let api = match &err {
            CoprocessorError::AccessDenied { .. }
            | CoprocessorError::InvalidAuthorization(_)
            | CoprocessorError::AuthorizationExpired { .. } => Self::forbidden(err.to_string()),
            CoprocessorError::UnknownHandle(_) => Self::not_found(err.to_string()),
            CoprocessorError::Signing(_) => {
                tracing::error!(error = %err, "Co-processor signing failed");
                Self::internal("Co-processor operation failed")
            }
            CoprocessorError::MalformedProof(_)
            | CoprocessorError::HandleNotInProof(_)
            | CoprocessorError::TypeMismatch { .. }
            | CoprocessorError::InvalidProofSignature => Self::unprocessable(err.to_string()),
        };
        api.with_code(code)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.code.to_string(),
        });
        (self.status, body).into_response()
    }
}
