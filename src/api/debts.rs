// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::Caller,
    error::{ApiError, ErrorBody},
    models::{
        BatchUpdateStatusRequest, EncryptedAmountResponse, OwnershipResponse, SubmitDebtRequest,
        UpdateStatusRequest,
    },
    registry::{DebtId, DebtMetadata, DebtSubmitted},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/debts",
    request_body = SubmitDebtRequest,
    tag = "Debts",
    responses(
        (status = 201, body = DebtSubmitted),
        (status = 400, description = "Invalid debt type", body = ErrorBody),
        (status = 401, description = "Caller not authenticated", body = ErrorBody),
        (status = 422, description = "Encrypted input rejected", body = ErrorBody)
    )
)]
pub async fn submit_debt(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<SubmitDebtRequest>,
) -> Result<(StatusCode, Json<DebtSubmitted>), ApiError> {
    let event = state.registry.submit_debt(
        caller,
        &request.submitter_handle,
        &request.amount_handle,
        &request.input_proof,
        request.debt_type,
    )?;
    Ok((StatusCode::CREATED, Json(event)))
}

#[utoipa::path(
    put,
    path = "/v1/debts/{id}/status",
    params(("id" = u64, Path, description = "Debt id")),
    request_body = UpdateStatusRequest,
    tag = "Debts",
    responses(
        (status = 204),
        (status = 403, description = "Not your debt", body = ErrorBody),
        (status = 404, description = "Debt does not exist", body = ErrorBody)
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<DebtId>,
    Caller(caller): Caller,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<StatusCode, ApiError> {
    state.registry.update_status(caller, id, request.is_active)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/debts/status/batch",
    request_body = BatchUpdateStatusRequest,
    tag = "Debts",
    responses(
        (status = 204),
        (status = 400, description = "Too many updates or array length mismatch", body = ErrorBody),
        (status = 403, description = "A listed debt is not yours", body = ErrorBody),
        (status = 404, description = "A listed debt does not exist", body = ErrorBody)
    )
)]
pub async fn batch_update_status(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<BatchUpdateStatusRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .registry
        .batch_update_status(caller, &request.ids, &request.statuses)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/debts/{id}",
    params(("id" = u64, Path, description = "Debt id")),
    tag = "Debts",
    responses(
        (status = 200, body = DebtMetadata),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn get_debt_metadata(
    State(state): State<AppState>,
    Path(id): Path<DebtId>,
) -> Result<Json<DebtMetadata>, ApiError> {
    Ok(Json(state.registry.get_debt_metadata(id)?))
}

#[utoipa::path(
    get,
    path = "/v1/debts/{id}/amount",
    params(("id" = u64, Path, description = "Debt id")),
    tag = "Debts",
    responses(
        (status = 200, body = EncryptedAmountResponse),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn get_encrypted_amount(
    State(state): State<AppState>,
    Path(id): Path<DebtId>,
) -> Result<Json<EncryptedAmountResponse>, ApiError> {
    let encrypted_amount = state.registry.get_encrypted_amount(id)?;
    Ok(Json(EncryptedAmountResponse {
        id,
        encrypted_amount,
    }))
}

/// Whether the authenticated caller submitted the debt. Never fails for
/// unknown ids.
#[utoipa::path(
    get,
    path = "/v1/debts/{id}/ownership",
    params(("id" = u64, Path, description = "Debt id")),
    tag = "Debts",
    responses(
        (status = 200, body = OwnershipResponse),
        (status = 401, body = ErrorBody)
    )
)]
pub async fn validate_ownership(
    State(state): State<AppState>,
    Path(id): Path<DebtId>,
    Caller(caller): Caller,
) -> Result<Json<OwnershipResponse>, ApiError> {
    let is_owner = state.registry.validate_ownership(&caller, id)?;
    Ok(Json(OwnershipResponse {
        id,
        caller,
        is_owner,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::AuthMode, coprocessor::FheValue, registry::DebtType};
    use alloy::primitives::{address, Address};

    const ALICE: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
    const BOB: Address = address!("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");

    fn request_for(state: &AppState, caller: Address, amount: u32, debt_type: i64) -> SubmitDebtRequest {
        let input = state
            .coprocessor
            .encrypt(
                state.registry.contract_address(),
                caller,
                &[FheValue::Address(caller), FheValue::U32(amount)],
            )
            .unwrap();
        SubmitDebtRequest {
            submitter_handle: input.handles[0],
            amount_handle: input.handles[1],
            input_proof: input.input_proof,
            debt_type,
        }
    }

    #[tokio::test]
    async fn submit_debt_success() {
        let state = AppState::new_in_memory(AuthMode::Insecure);
        let request = request_for(&state, ALICE, 5000, 0);

        let (status, Json(event)) =
            submit_debt(State(state.clone()), Caller(ALICE), Json(request.clone()))
                .await
                .expect("submission succeeds");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(event.id, 1);
        assert_eq!(event.submitter, ALICE);
        assert_eq!(event.debt_type, DebtType::Loan);

        let Json(amount) = get_encrypted_amount(State(state.clone()), Path(1)).await.unwrap();
        assert_eq!(amount.encrypted_amount, request.amount_handle);
    }

    #[tokio::test]
    async fn submit_debt_invalid_type_is_bad_request() {
        let state = AppState::new_in_memory(AuthMode::Insecure);
        let request = request_for(&state, ALICE, 5000, 7);

        let err = submit_debt(State(state.clone()), Caller(ALICE), Json(request))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.starts_with("Invalid debt type"));
        assert_eq!(state.registry.get_total_debt_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn submit_debt_with_foreign_proof_is_unprocessable() {
        let state = AppState::new_in_memory(AuthMode::Insecure);
        let request = request_for(&state, ALICE, 5000, 0);

        let err = submit_debt(State(state), Caller(BOB), Json(request))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn update_status_by_other_account_is_forbidden() {
        let state = AppState::new_in_memory(AuthMode::Insecure);
        let request = request_for(&state, ALICE, 1, 0);
        submit_debt(State(state.clone()), Caller(ALICE), Json(request))
            .await
            .unwrap();

        let err = update_status(
            State(state.clone()),
            Path(1),
            Caller(BOB),
            Json(UpdateStatusRequest { is_active: false }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert!(err.message.starts_with("Not your debt"));

        let Json(metadata) = get_debt_metadata(State(state), Path(1)).await.unwrap();
        assert!(metadata.is_active);
    }

    #[tokio::test]
    async fn update_status_by_owner() {
        let state = AppState::new_in_memory(AuthMode::Insecure);
        let request = request_for(&state, ALICE, 1, 0);
        submit_debt(State(state.clone()), Caller(ALICE), Json(request))
            .await
            .unwrap();

        let status = update_status(
            State(state.clone()),
            Path(1),
            Caller(ALICE),
            Json(UpdateStatusRequest { is_active: false }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(metadata) = get_debt_metadata(State(state), Path(1)).await.unwrap();
        assert!(!metadata.is_active);
    }

    #[tokio::test]
    async fn batch_too_large_is_bad_request() {
        let state = AppState::new_in_memory(AuthMode::Insecure);
        let request = BatchUpdateStatusRequest {
            ids: (1..=51).collect(),
            statuses: vec![false; 51],
        };

        let err = batch_update_status(State(state), Caller(ALICE), Json(request))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.starts_with("Too many updates"));
    }

    #[tokio::test]
    async fn missing_debt_is_not_found() {
        let state = AppState::new_in_memory(AuthMode::Insecure);
        let err = get_debt_metadata(State(state), Path(42)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn ownership_reports_false_for_others() {
        let state = AppState::new_in_memory(AuthMode::Insecure);
        let request = request_for(&state, ALICE, 1, 0);
        submit_debt(State(state.clone()), Caller(ALICE), Json(request))
            .await
            .unwrap();

        let Json(mine) = validate_ownership(State(state.clone()), Path(1), Caller(ALICE))
            .await
            .unwrap();
        assert!(mine.is_owner);

        let Json(theirs) = validate_ownership(State(state.clone()), Path(1), Caller(BOB))
            .await
            .unwrap();
        assert!(!theirs.is_owner);

        let Json(unknown) = validate_ownership(State(state), Path(9), Caller(ALICE))
            .await
            .unwrap();
        assert!(!unknown.is_owner);
    }
}
