use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

use matchfinder_shared::errors::AppResult;
use matchfinder_shared::types::CallerIdentity;

use crate::models::{CreateMatchRequest, Match, Participant};
use crate::routes::extract::{MatchId, ValidatedJson};
use crate::services::match_service;
use crate::AppState;

// --- POST /matches ---

pub async fn create_match(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    ValidatedJson(req): ValidatedJson<CreateMatchRequest>,
) -> AppResult<(StatusCode, Json<Match>)> {
    let created = match_service::create_match(&state.store, req, &caller)?;
    Ok((StatusCode::CREATED, Json(created)))
}

// --- GET /matches ---

pub async fn list_matches(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Match>>> {
    Ok(Json(match_service::list_matches(&state.store)?))
}

// --- PUT /matches/:id/join ---

pub async fn join_match(
    State(state): State<Arc<AppState>>,
    MatchId(match_id): MatchId,
    caller: CallerIdentity,
) -> AppResult<Json<Match>> {
    Ok(Json(match_service::join_match(&state.store, match_id, &caller)?))
}

// --- PUT /matches/:id/leave ---

pub async fn leave_match(
    State(state): State<Arc<AppState>>,
    MatchId(match_id): MatchId,
    caller: CallerIdentity,
) -> AppResult<Json<Match>> {
    Ok(Json(match_service::leave_match(&state.store, match_id, &caller)?))
}

// --- DELETE /matches/:id ---

pub async fn delete_match(
    State(state): State<Arc<AppState>>,
    MatchId(match_id): MatchId,
    caller: CallerIdentity,
) -> AppResult<StatusCode> {
    match_service::delete_match(&state.store, match_id, &caller)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- GET /matches/:id/participants ---

pub async fn list_participants(
    State(state): State<Arc<AppState>>,
    MatchId(match_id): MatchId,
) -> AppResult<Json<Vec<Participant>>> {
    Ok(Json(match_service::list_participants(&state.store, match_id)?))
}
