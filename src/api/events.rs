// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{error::ApiError, models::EventsResponse, registry::DebtId, state::AppState};

const DEFAULT_PAGE_SIZE: usize = 100;
const MAX_PAGE_SIZE: usize = 500;

#[derive(Debug, Deserialize, IntoParams)]
pub struct EventsQuery {
    /// Return events with id greater than this cursor.
    pub after: Option<DebtId>,
    /// Page size (1-500, default 100).
    pub limit: Option<usize>,
}

/// Creation events for external indexers, ascending by id.
#[utoipa::path(
    get,
    path = "/v1/events",
    params(EventsQuery),
    tag = "Events",
    responses((status = 200, body = EventsResponse))
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<EventsQuery>,
) -> Result<Json<EventsResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let events = state.registry.events(params.after.unwrap_or(0), limit)?;

    let next_cursor = if events.len() == limit {
        events.last().map(|e| e.id)
    } else {
        None
    };
    Ok(Json(EventsResponse {
        events,
        next_cursor,
    }))
}
