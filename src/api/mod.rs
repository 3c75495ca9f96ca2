// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use alloy::primitives::Address;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    coprocessor::{EncryptedInput, FheType, HandleContractPair, UserDecryptRequest},
    error::{ApiError, ErrorBody},
    models::{
        BatchUpdateStatusRequest, CountResponse, EncryptRequest, EncryptedAmountResponse,
        EventsResponse, OwnershipResponse, StatsResponse, SubmitDebtRequest, TypeCount,
        UpdateStatusRequest, UserDebtIdResponse, UserDebtsResponse, UserDecryptResponse,
    },
    registry::{DebtMetadata, DebtSubmitted, UserDebtSummary},
    state::AppState,
};

pub mod coprocessor;
pub mod debts;
pub mod events;
pub mod health;
pub mod stats;
pub mod users;

/// Parse a 0x-hex account address from a path segment.
pub(crate) fn parse_address(raw: &str) -> Result<Address, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid address: {raw}")).with_code("invalid_address"))
}

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/debts", post(debts::submit_debt))
        .route("/debts/status/batch", post(debts::batch_update_status))
        .route("/debts/{id}", get(debts::get_debt_metadata))
        .route("/debts/{id}/status", put(debts::update_status))
        .route("/debts/{id}/amount", get(debts::get_encrypted_amount))
        .route("/debts/{id}/ownership", get(debts::validate_ownership))
        .route("/users/{owner}/debts", get(users::list_user_debts))
        .route("/users/{owner}/debts/count", get(users::get_user_debt_count))
        .route("/users/{owner}/debts/{index}", get(users::get_user_debt_id_at))
        .route("/users/{owner}/summary", get(users::get_user_debt_summary))
        .route("/stats", get(stats::get_stats))
        .route("/stats/types/{debt_type}", get(stats::get_type_count))
        .route("/events", get(events::list_events))
        .route("/coprocessor/encrypt", post(coprocessor::encrypt))
        .route("/coprocessor/user-decrypt", post(coprocessor::user_decrypt))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        debts::submit_debt,
        debts::update_status,
        debts::batch_update_status,
        debts::get_debt_metadata,
        debts::get_encrypted_amount,
        debts::validate_ownership,
        users::list_user_debts,
        users::get_user_debt_count,
        users::get_user_debt_id_at,
        users::get_user_debt_summary,
        stats::get_stats,
        stats::get_type_count,
        events::list_events,
        coprocessor::encrypt,
        coprocessor::user_decrypt,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            SubmitDebtRequest,
            UpdateStatusRequest,
            BatchUpdateStatusRequest,
            DebtSubmitted,
            DebtMetadata,
            EncryptedAmountResponse,
            OwnershipResponse,
            UserDebtsResponse,
            CountResponse,
            UserDebtIdResponse,
            UserDebtSummary,
            StatsResponse,
            TypeCount,
            EventsResponse,
            EncryptRequest,
            EncryptedInput,
            FheType,
            HandleContractPair,
            UserDecryptRequest,
            UserDecryptResponse,
            ErrorBody,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Debts", description = "Debt submission, status and lookup"),
        (name = "Users", description = "Per-owner debt index"),
        (name = "Stats", description = "Ledger counters"),
        (name = "Events", description = "Creation events for indexers"),
        (name = "Coprocessor", description = "Local encryption and user decryption"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
