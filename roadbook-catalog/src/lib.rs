use std::sync::Arc;

use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use uuid::Uuid;

use roadbook_core::models::{NewTrip, Trip, TripPatch};
use roadbook_core::store::{Documents, Store};
use roadbook_core::{BookingError, BookingResult};

/// Trip search filters. Location filters are case-insensitive substring
/// matches against location names; the date filter matches trips departing
/// within that calendar day in server-local time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripSearch {
    pub departure_location: Option<String>,
    pub arrival_location: Option<String>,
    pub departure_date: Option<NaiveDate>,
}

/// Trip metadata and seat inventory creation.
pub struct TripCatalog<S: Store> {
    store: Arc<S>,
}

impl<S: Store> TripCatalog<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create a trip and seed its seats in one transaction. A seeding
    /// failure rolls the trip record back as well.
    pub async fn create(&self, spec: NewTrip) -> BookingResult<Trip> {
        let trip = self
            .store
            .transact(move |docs| {
                validate_references(
                    docs,
                    Some(spec.vehicle_id),
                    Some(spec.departure_location),
                    Some(spec.arrival_location),
                )?;

                let trip = Trip {
                    id: Uuid::new_v4(),
                    vehicle_id: spec.vehicle_id,
                    departure_location: spec.departure_location,
                    arrival_location: spec.arrival_location,
                    departure_time: spec.departure_time,
                    arrival_time: spec.arrival_time,
                    price: spec.price,
                    distance: spec.distance,
                    total_seats: spec.total_seats,
                    created_at: Utc::now(),
                };
                docs.trips.insert(trip.id, trip.clone());
                roadbook_ledger::seed_seats(docs, trip.id, trip.total_seats)?;
                Ok(trip)
            })
            .await?;

        tracing::info!(trip_id = %trip.id, total_seats = trip.total_seats, "trip created");
        Ok(trip)
    }

    /// Delete a trip and every seat bound to it.
    pub async fn delete(&self, trip_id: Uuid) -> BookingResult<()> {
        self.store
            .transact(move |docs| {
                docs.trips
                    .remove(&trip_id)
                    .ok_or_else(|| BookingError::NotFound("Trip not found".to_string()))?;
                docs.seats.retain(|_, seat| seat.trip_id != trip_id);
                Ok(())
            })
            .await
    }

    /// Apply an allowlisted patch. Reference changes are validated like at
    /// creation; the seat count is not patchable.
    pub async fn update(&self, trip_id: Uuid, patch: TripPatch) -> BookingResult<Trip> {
        self.store
            .transact(move |docs| {
                validate_references(
                    docs,
                    patch.vehicle_id,
                    patch.departure_location,
                    patch.arrival_location,
                )?;
                let trip = docs.trip_mut(trip_id)?;
                trip.apply_patch(&patch);
                Ok(trip.clone())
            })
            .await
    }

    pub async fn find(&self, trip_id: Uuid) -> BookingResult<Trip> {
        self.store
            .read(move |docs| docs.trip(trip_id).map(|trip| trip.clone()))
            .await
    }

    pub async fn list(&self) -> Vec<Trip> {
        self.store
            .read(|docs| {
                let mut trips: Vec<Trip> = docs.trips.values().cloned().collect();
                trips.sort_by_key(|trip| trip.departure_time);
                trips
            })
            .await
    }

    /// Filtered trip listing. No match is an empty list, never an error.
    pub async fn search(&self, filters: TripSearch) -> BookingResult<Vec<Trip>> {
        let day_window = match filters.departure_date {
            Some(day) => Some(local_day_window(day)?),
            None => None,
        };
        let departure_query = filters.departure_location.map(|q| q.to_lowercase());
        let arrival_query = filters.arrival_location.map(|q| q.to_lowercase());

        let trips = self
            .store
            .read(move |docs| {
                let mut trips: Vec<Trip> = docs
                    .trips
                    .values()
                    .filter(|trip| {
                        location_matches(docs, trip.departure_location, &departure_query)
                            && location_matches(docs, trip.arrival_location, &arrival_query)
                            && day_window
                                .map(|(start, end)| {
                                    trip.departure_time >= start && trip.departure_time < end
                                })
                                .unwrap_or(true)
                    })
                    .cloned()
                    .collect();
                trips.sort_by_key(|trip| trip.departure_time);
                trips
            })
            .await;
        Ok(trips)
    }
}

fn location_matches(docs: &Documents, location_id: Uuid, query: &Option<String>) -> bool {
    match query {
        Some(query) => docs
            .locations
            .get(&location_id)
            .map(|location| location.name.to_lowercase().contains(query))
            .unwrap_or(false),
        None => true,
    }
}

fn validate_references(
    docs: &Documents,
    vehicle_id: Option<Uuid>,
    departure_location: Option<Uuid>,
    arrival_location: Option<Uuid>,
) -> BookingResult<()> {
    if let Some(id) = vehicle_id {
        if !docs.vehicles.contains_key(&id) {
            return Err(BookingError::NotFound("Vehicle not found".to_string()));
        }
    }
    if let Some(id) = departure_location {
        if !docs.locations.contains_key(&id) {
            return Err(BookingError::NotFound(
                "Departure location not found".to_string(),
            ));
        }
    }
    if let Some(id) = arrival_location {
        if !docs.locations.contains_key(&id) {
            return Err(BookingError::NotFound(
                "Arrival location not found".to_string(),
            ));
        }
    }
    Ok(())
}

/// The calendar day `[00:00:00, 23:59:59.999]` in server-local time,
/// expressed as a half-open UTC window.
fn local_day_window(day: NaiveDate) -> BookingResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start = Local
        .from_local_datetime(&day.and_time(NaiveTime::MIN))
        .earliest()
        .ok_or_else(|| BookingError::Validation("Invalid departure date".to_string()))?;
    let end = day
        .checked_add_days(Days::new(1))
        .and_then(|next| Local.from_local_datetime(&next.and_time(NaiveTime::MIN)).earliest())
        .ok_or_else(|| BookingError::Validation("Invalid departure date".to_string()))?;
    Ok((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}
