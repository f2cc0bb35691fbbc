use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use roadbook_catalog::TripSearch;
use roadbook_core::models::{NewTrip, Trip, TripPatch};

use crate::error::AppError;
use crate::middleware::auth::require_admin;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/v1/trips", get(list_trips))
        .route("/v1/trips/search", post(search_trips))
        .route("/v1/trips/{id}", get(get_trip));

    let admin = Router::new()
        .route("/v1/trips", post(create_trip))
        .route(
            "/v1/trips/{id}",
            axum::routing::patch(update_trip).delete(delete_trip),
        )
        .route_layer(from_fn_with_state(state, require_admin));

    public.merge(admin)
}

/// GET /v1/trips
async fn list_trips(State(state): State<AppState>) -> Json<Vec<Trip>> {
    Json(state.catalog.list().await)
}

/// GET /v1/trips/{id}
async fn get_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Trip>, AppError> {
    Ok(Json(state.catalog.find(trip_id).await?))
}

/// POST /v1/trips/search
async fn search_trips(
    State(state): State<AppState>,
    Json(filters): Json<TripSearch>,
) -> Result<Json<Vec<Trip>>, AppError> {
    Ok(Json(state.catalog.search(filters).await?))
}

/// POST /v1/trips
/// Create a trip and seed its seats.
async fn create_trip(
    State(state): State<AppState>,
    Json(spec): Json<NewTrip>,
) -> Result<(StatusCode, Json<Trip>), AppError> {
    let trip = state.catalog.create(spec).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

/// PATCH /v1/trips/{id}
async fn update_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
    Json(patch): Json<TripPatch>,
) -> Result<Json<Trip>, AppError> {
    Ok(Json(state.catalog.update(trip_id, patch).await?))
}

/// DELETE /v1/trips/{id}
/// Deletes the trip and cascades to its seats.
async fn delete_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete(trip_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
