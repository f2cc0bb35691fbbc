use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use roadbook_core::models::{Location, Vehicle};
use roadbook_core::store::Store;
use roadbook_core::BookingError;

use crate::error::AppError;
use crate::middleware::auth::require_admin;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
    pub description: Option<String>,
    pub contact_phone: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateVehicleRequest {
    pub license_plate: String,
    pub description: Option<String>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/v1/locations", get(list_locations))
        .route("/v1/vehicles", get(list_vehicles));

    let admin = Router::new()
        .route("/v1/locations", post(create_location))
        .route("/v1/vehicles", post(create_vehicle))
        .route_layer(from_fn_with_state(state, require_admin));

    public.merge(admin)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/locations
async fn create_location(
    State(state): State<AppState>,
    Json(req): Json<CreateLocationRequest>,
) -> Result<(StatusCode, Json<Location>), AppError> {
    let location = state
        .store
        .transact(move |docs| {
            if docs.locations.values().any(|l| l.name == req.name) {
                return Err(BookingError::Conflict(
                    "Location name already exists".to_string(),
                ));
            }
            let location = Location {
                id: Uuid::new_v4(),
                name: req.name,
                description: req.description,
                contact_phone: req.contact_phone,
            };
            docs.locations.insert(location.id, location.clone());
            Ok(location)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(location)))
}

/// GET /v1/locations
async fn list_locations(State(state): State<AppState>) -> Json<Vec<Location>> {
    let mut locations = state
        .store
        .read(|docs| docs.locations.values().cloned().collect::<Vec<_>>())
        .await;
    locations.sort_by(|a, b| a.name.cmp(&b.name));
    Json(locations)
}

/// POST /v1/vehicles
async fn create_vehicle(
    State(state): State<AppState>,
    Json(req): Json<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<Vehicle>), AppError> {
    let vehicle = state
        .store
        .transact(move |docs| {
            if docs.vehicles.values().any(|v| v.license_plate == req.license_plate) {
                return Err(BookingError::Conflict(
                    "License plate already registered".to_string(),
                ));
            }
            let vehicle = Vehicle {
                id: Uuid::new_v4(),
                license_plate: req.license_plate,
                description: req.description,
            };
            docs.vehicles.insert(vehicle.id, vehicle.clone());
            Ok(vehicle)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// GET /v1/vehicles
async fn list_vehicles(State(state): State<AppState>) -> Json<Vec<Vehicle>> {
    let mut vehicles = state
        .store
        .read(|docs| docs.vehicles.values().cloned().collect::<Vec<_>>())
        .await;
    vehicles.sort_by(|a, b| a.license_plate.cmp(&b.license_plate));
    Json(vehicles)
}
