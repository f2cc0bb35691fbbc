use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use roadbook_core::models::{Ticket, TicketStatus};
use roadbook_core::store::Store;
use roadbook_core::BookingError;

use crate::error::AppError;
use crate::middleware::auth::{require_user, AuthUser};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ReserveTicketRequest {
    pub trip_id: Uuid,
    pub seat_id: Uuid,
}

/// Partial update mirroring the booking desk workflow: move to another seat,
/// change the status, or both.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateTicketRequest {
    pub seat_id: Option<Uuid>,
    pub ticket_status: Option<TicketStatus>,
}

#[derive(Debug, Serialize)]
pub struct TicketDetails {
    pub ticket: Ticket,
    pub seat_number: Option<i32>,
    pub departure_location: Option<String>,
    pub arrival_location: Option<String>,
    pub price: Option<i32>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/tickets", post(reserve_ticket))
        .route("/v1/tickets/mine", get(my_tickets))
        .route(
            "/v1/tickets/{id}",
            get(get_ticket).patch(update_ticket).delete(delete_ticket),
        )
        .route_layer(from_fn_with_state(state, require_user))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/tickets
/// Reserve a seat for the authenticated user.
async fn reserve_ticket(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ReserveTicketRequest>,
) -> Result<(StatusCode, Json<Ticket>), AppError> {
    let ticket = state.tickets.reserve(user.id, req.trip_id, req.seat_id).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// GET /v1/tickets/mine
async fn my_tickets(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Json<Vec<Ticket>> {
    Json(state.tickets.list_by_user(user.id).await)
}

/// GET /v1/tickets/{id}
/// Ticket with its seat and route context resolved.
async fn get_ticket(
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<TicketDetails>, AppError> {
    let details = state
        .store
        .read(move |docs| -> Result<TicketDetails, BookingError> {
            let ticket = docs.ticket(ticket_id)?.clone();
            let seat_number = docs.seats.get(&ticket.seat_id).map(|seat| seat.seat_number);
            let trip = docs.trips.get(&ticket.trip_id);
            let departure_location = trip
                .and_then(|trip| docs.locations.get(&trip.departure_location))
                .map(|location| location.name.clone());
            let arrival_location = trip
                .and_then(|trip| docs.locations.get(&trip.arrival_location))
                .map(|location| location.name.clone());
            let price = trip.map(|trip| trip.price);
            Ok(TicketDetails {
                ticket,
                seat_number,
                departure_location,
                arrival_location,
                price,
            })
        })
        .await?;
    Ok(Json(details))
}

/// PATCH /v1/tickets/{id}
async fn update_ticket(
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
    Json(req): Json<UpdateTicketRequest>,
) -> Result<Json<Ticket>, AppError> {
    let mut ticket = state.tickets.find(ticket_id).await?;
    if let Some(seat_id) = req.seat_id {
        ticket = state.tickets.reassign_seat(ticket_id, seat_id).await?;
    }
    if let Some(status) = req.ticket_status {
        ticket = state.tickets.set_status(ticket_id, status).await?;
    }
    Ok(Json(ticket))
}

/// DELETE /v1/tickets/{id}
/// Remove the ticket and release its seat.
async fn delete_ticket(
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.tickets.cancel_with_seat_release(ticket_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
