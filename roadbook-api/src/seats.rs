use axum::{
    extract::{Path, State},
    middleware::from_fn_with_state,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use roadbook_core::models::{Seat, SeatStatus};
use roadbook_ledger::AvailableSeats;

use crate::error::AppError;
use crate::middleware::auth::require_admin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SeatStatusRequest {
    pub status: SeatStatus,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/v1/trips/{id}/seats", get(list_seats))
        .route("/v1/trips/{id}/seats/available", get(list_available));

    let admin = Router::new()
        .route("/v1/seats/{id}/status", patch(set_seat_status))
        .route_layer(from_fn_with_state(state, require_admin));

    public.merge(admin)
}

/// GET /v1/trips/{id}/seats
async fn list_seats(State(state): State<AppState>, Path(trip_id): Path<Uuid>) -> Json<Vec<Seat>> {
    Json(state.ledger.list_by_trip(trip_id).await)
}

/// GET /v1/trips/{id}/seats/available
async fn list_available(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Json<AvailableSeats> {
    Json(state.ledger.list_available(trip_id).await)
}

/// PATCH /v1/seats/{id}/status
/// Administrative override, e.g. blocking a broken seat.
async fn set_seat_status(
    State(state): State<AppState>,
    Path(seat_id): Path<Uuid>,
    Json(req): Json<SeatStatusRequest>,
) -> Result<Json<Seat>, AppError> {
    Ok(Json(state.ledger.set_status(seat_id, req.status).await?))
}
