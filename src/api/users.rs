// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};

use super::parse_address;
use crate::{
    error::{ApiError, ErrorBody},
    models::{CountResponse, UserDebtIdResponse, UserDebtsResponse},
    registry::UserDebtSummary,
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/v1/users/{owner}/debts",
    params(("owner" = String, Path, description = "Owner address (0x-hex)")),
    tag = "Users",
    responses(
        (status = 200, body = UserDebtsResponse),
        (status = 400, body = ErrorBody)
    )
)]
pub async fn list_user_debts(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<Json<UserDebtsResponse>, ApiError> {
    let owner = parse_address(&owner)?;
    let ids = state.registry.get_user_debt_ids(&owner)?;
    Ok(Json(UserDebtsResponse { owner, ids }))
}

#[utoipa::path(
    get,
    path = "/v1/users/{owner}/debts/count",
    params(("owner" = String, Path, description = "Owner address (0x-hex)")),
    tag = "Users",
    responses(
        (status = 200, body = CountResponse),
        (status = 400, body = ErrorBody)
    )
)]
pub async fn get_user_debt_count(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<Json<CountResponse>, ApiError> {
    let owner = parse_address(&owner)?;
    let count = state.registry.get_user_debt_count(&owner)?;
    Ok(Json(CountResponse { count }))
}

#[utoipa::path(
    get,
    path = "/v1/users/{owner}/debts/{index}",
    params(
        ("owner" = String, Path, description = "Owner address (0x-hex)"),
        ("index" = u64, Path, description = "Zero-based position in the owner's index")
    ),
    tag = "Users",
    responses(
        (status = 200, body = UserDebtIdResponse),
        (status = 404, description = "Index out of bounds", body = ErrorBody)
    )
)]
pub async fn get_user_debt_id_at(
    State(state): State<AppState>,
    Path((owner, index)): Path<(String, u64)>,
) -> Result<Json<UserDebtIdResponse>, ApiError> {
    let owner = parse_address(&owner)?;
    let id = state.registry.get_user_debt_id_at(&owner, index)?;
    Ok(Json(UserDebtIdResponse { index, id }))
}

#[utoipa::path(
    get,
    path = "/v1/users/{owner}/summary",
    params(("owner" = String, Path, description = "Owner address (0x-hex)")),
    tag = "Users",
    responses(
        (status = 200, body = UserDebtSummary),
        (status = 400, body = ErrorBody)
    )
)]
pub async fn get_user_debt_summary(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<Json<UserDebtSummary>, ApiError> {
    let owner = parse_address(&owner)?;
    Ok(Json(state.registry.get_user_debt_summary(&owner)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::AuthMode, coprocessor::FheValue};
    use alloy::primitives::{address, Address};
    use axum::http::StatusCode;

    const ALICE: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");

    fn submit(state: &AppState, caller: Address, debt_type: i64) {
        let input = state
            .coprocessor
            .encrypt(
                state.registry.contract_address(),
                caller,
                &[FheValue::Address(caller), FheValue::U32(100)],
            )
            .unwrap();
        state
            .registry
            .submit_debt(caller, &input.handles[0], &input.handles[1], &input.input_proof, debt_type)
            .unwrap();
    }

    #[tokio::test]
    async fn owner_index_enumeration() {
        let state = AppState::new_in_memory(AuthMode::Insecure);
        submit(&state, ALICE, 0);
        submit(&state, ALICE, 1);

        let Json(count) = get_user_debt_count(State(state.clone()), Path(ALICE.to_string()))
            .await
            .unwrap();
        assert_eq!(count.count, 2);

        let Json(second) =
            get_user_debt_id_at(State(state.clone()), Path((ALICE.to_string(), 1)))
                .await
                .unwrap();
        assert_eq!(second.id, 2);

        let Json(all) = list_user_debts(State(state.clone()), Path(ALICE.to_string()))
            .await
            .unwrap();
        assert_eq!(all.ids, vec![1, 2]);

        let Json(summary) = get_user_debt_summary(State(state), Path(ALICE.to_string()))
            .await
            .unwrap();
        assert_eq!(
            summary,
            UserDebtSummary {
                total: 2,
                active: 2,
                distinct_types_used: 2
            }
        );
    }

    #[tokio::test]
    async fn index_out_of_bounds_is_not_found() {
        let state = AppState::new_in_memory(AuthMode::Insecure);
        let err = get_user_debt_id_at(State(state), Path((ALICE.to_string(), 0)))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "index_out_of_bounds");
    }

    #[tokio::test]
    async fn malformed_owner_is_bad_request() {
        let state = AppState::new_in_memory(AuthMode::Insecure);
        let err = get_user_debt_count(State(state), Path("not-an-address".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
