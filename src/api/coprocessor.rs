// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local encryption service endpoints.
//!
//! Stand in for the client-side encryption SDK and the decryption relayer
//! so that the ledger can be exercised end to end without an FHE network.
//! Inputs are always encrypted for the authenticated caller.

use axum::{extract::State, Json};

use crate::{
    auth::Caller,
    coprocessor::{EncryptedInput, UserDecryptRequest},
    error::{ApiError, ErrorBody},
    models::{EncryptRequest, UserDecryptResponse},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/coprocessor/encrypt",
    request_body = EncryptRequest,
    tag = "Coprocessor",
    responses(
        (status = 200, body = EncryptedInput),
        (status = 400, body = ErrorBody),
        (status = 401, description = "Caller not authenticated", body = ErrorBody)
    )
)]
pub async fn encrypt(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<EncryptRequest>,
) -> Result<Json<EncryptedInput>, ApiError> {
    if request.values.is_empty() {
        return Err(ApiError::bad_request("At least one value is required"));
    }
    let contract = request
        .contract_address
        .unwrap_or_else(|| state.registry.contract_address());

    let input = state
        .coprocessor
        .encrypt(contract, caller, &request.values)?;
    Ok(Json(input))
}

#[utoipa::path(
    post,
    path = "/v1/coprocessor/user-decrypt",
    request_body = UserDecryptRequest,
    tag = "Coprocessor",
    responses(
        (status = 200, body = UserDecryptResponse),
        (status = 403, description = "Authorization invalid or handle not shared", body = ErrorBody)
    )
)]
pub async fn user_decrypt(
    State(state): State<AppState>,
    Json(request): Json<UserDecryptRequest>,
) -> Result<Json<UserDecryptResponse>, ApiError> {
    let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
    let values = state.coprocessor.user_decrypt(&request, now)?;
    Ok(Json(UserDecryptResponse { values }))
}
