// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::{ApiError, ErrorBody},
    models::{StatsResponse, TypeCount},
    registry::DebtType,
    state::AppState,
};

/// Global counter and every type counter.
#[utoipa::path(
    get,
    path = "/v1/stats",
    tag = "Stats",
    responses((status = 200, body = StatsResponse))
)]
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let total_debts = state.registry.get_total_debt_count()?;
    let type_counts = state
        .registry
        .type_counts()?
        .into_iter()
        .map(|(debt_type, count)| TypeCount::new(debt_type, count))
        .collect();

    Ok(Json(StatsResponse {
        total_debts,
        type_counts,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/stats/types/{debt_type}",
    params(("debt_type" = i64, Path, description = "0=Loan, 1=CreditCard, 2=Borrowing, 3=Other")),
    tag = "Stats",
    responses(
        (status = 200, body = TypeCount),
        (status = 400, description = "Invalid debt type", body = ErrorBody)
    )
)]
pub async fn get_type_count(
    State(state): State<AppState>,
    Path(debt_type): Path<i64>,
) -> Result<Json<TypeCount>, ApiError> {
    let debt_type = DebtType::try_from(debt_type)?;
    let count = state.registry.type_count(debt_type)?;
    Ok(Json(TypeCount::new(debt_type, count)))
}
