use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use roadbook_core::models::{Seat, SeatStatus};
use roadbook_core::store::{Documents, Store};
use roadbook_core::{BookingError, BookingResult};

/// Seat availability for one trip.
#[derive(Debug, Serialize)]
pub struct AvailableSeats {
    pub total: usize,
    pub seats: Vec<Seat>,
}

// ----------------------------------------------------------------------------
// Transition helpers
//
// These run inside a store transaction on behalf of whichever workflow holds
// it, so a caller can combine a seat transition with its own writes in one
// atomic unit.
// ----------------------------------------------------------------------------

/// Create `count` seats numbered 1..=count, all AVAILABLE, bound to the trip.
pub fn seed_seats(docs: &mut Documents, trip_id: Uuid, count: i32) -> BookingResult<Vec<Seat>> {
    if count < 1 {
        return Err(BookingError::Validation(
            "A trip needs at least one seat".to_string(),
        ));
    }

    let mut seats = Vec::with_capacity(count as usize);
    for seat_number in 1..=count {
        let seat = Seat {
            id: Uuid::new_v4(),
            trip_id,
            seat_number,
            status: SeatStatus::Available,
            updated_at: Utc::now(),
        };
        docs.seats.insert(seat.id, seat.clone());
        seats.push(seat);
    }
    Ok(seats)
}

/// The conditional update guarding the reservation race: set BOOKED only if
/// the seat is currently AVAILABLE. The caller holds the transaction, so the
/// check and the write cannot interleave with another reservation.
pub fn book_if_available(docs: &mut Documents, seat_id: Uuid) -> BookingResult<()> {
    let seat = docs.seat_mut(seat_id)?;
    match seat.status {
        SeatStatus::Available => {
            seat.status = SeatStatus::Booked;
            seat.updated_at = Utc::now();
            Ok(())
        }
        SeatStatus::Booked => Err(BookingError::Conflict("Seat already booked".to_string())),
        SeatStatus::Unavailable => Err(BookingError::Conflict("Seat is unavailable".to_string())),
    }
}

/// Return a seat to AVAILABLE (cancellation, refund, reassignment).
pub fn release(docs: &mut Documents, seat_id: Uuid) -> BookingResult<()> {
    set_unconditional(docs, seat_id, SeatStatus::Available)
}

/// Unconditional status write. Callers are responsible for not racing
/// conflicting transitions on the same seat; reservation goes through
/// [`book_if_available`] instead.
pub fn set_unconditional(
    docs: &mut Documents,
    seat_id: Uuid,
    status: SeatStatus,
) -> BookingResult<()> {
    let seat = docs.seat_mut(seat_id)?;
    seat.status = status;
    seat.updated_at = Utc::now();
    Ok(())
}

// ----------------------------------------------------------------------------
// Async facade
// ----------------------------------------------------------------------------

/// Seat availability state per trip.
pub struct SeatLedger<S: Store> {
    store: Arc<S>,
}

impl<S: Store> SeatLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn find(&self, seat_id: Uuid) -> BookingResult<Seat> {
        self.store
            .read(move |docs| docs.seat(seat_id).map(|seat| seat.clone()))
            .await
    }

    pub async fn list_by_trip(&self, trip_id: Uuid) -> Vec<Seat> {
        self.store
            .read(move |docs| {
                let mut seats: Vec<Seat> = docs
                    .seats
                    .values()
                    .filter(|seat| seat.trip_id == trip_id)
                    .cloned()
                    .collect();
                seats.sort_by_key(|seat| seat.seat_number);
                seats
            })
            .await
    }

    pub async fn list_available(&self, trip_id: Uuid) -> AvailableSeats {
        self.store
            .read(move |docs| {
                let mut seats: Vec<Seat> = docs
                    .seats
                    .values()
                    .filter(|seat| {
                        seat.trip_id == trip_id && seat.status == SeatStatus::Available
                    })
                    .cloned()
                    .collect();
                seats.sort_by_key(|seat| seat.seat_number);
                AvailableSeats {
                    total: seats.len(),
                    seats,
                }
            })
            .await
    }

    /// Administrative status override.
    pub async fn set_status(&self, seat_id: Uuid, status: SeatStatus) -> BookingResult<Seat> {
        tracing::debug!(%seat_id, ?status, "overriding seat status");
        self.store
            .transact(move |docs| {
                set_unconditional(docs, seat_id, status)?;
                docs.seat(seat_id).map(|seat| seat.clone())
            })
            .await
    }
}
