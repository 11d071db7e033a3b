use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tracing::debug;
use worboo_primitives::stats::LeaderboardEntry;

use crate::service::{ApiError, ApiResponse};
use crate::ServiceState;

#[derive(Debug, Deserialize)]
pub(crate) struct LeaderboardQuery {
    limit: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LeaderboardResponse {
    limit: usize,
    items: Vec<LeaderboardEntry>,
    last_synced_position: u64,
}

pub(crate) async fn leaderboard_handler(
    State(state): State<Arc<ServiceState>>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = match query.limit.as_deref().map(str::trim) {
        None | Some("") => state.config.default_limit,
        Some(raw) => raw.parse::<usize>().map_err(|_| {
            ApiError::bad_request(format!("limit must be a non-negative integer, got `{raw}`"))
        })?,
    };

    let items = state.leaderboard.rank(Some(limit));

    debug!(limit, items = items.len(), "Serving leaderboard");

    Ok(ApiResponse {
        payload: LeaderboardResponse {
            limit,
            items,
            last_synced_position: state.leaderboard.last_synced_position(),
        },
    })
}

pub(crate) async fn player_handler(
    State(state): State<Arc<ServiceState>>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .leaderboard
        .player(&address)
        .map(|payload| ApiResponse { payload })
        .ok_or_else(|| ApiError::not_found("Player not found"))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse<'a> {
    status: &'static str,
    registry: &'a str,
    rpc_url: &'a str,
}

pub(crate) async fn health_handler(State(state): State<Arc<ServiceState>>) -> impl IntoResponse {
    ApiResponse {
        payload: HealthResponse {
            status: "ok",
            registry: &state.config.registry,
            rpc_url: &state.config.rpc_url,
        },
    }
    .into_response()
}
