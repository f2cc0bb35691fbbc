use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Booked,
    Unavailable,
}

/// One physical seat on one trip. Seats are created in bulk when the trip is
/// created and only ever deleted by the trip's cascading delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub seat_number: i32,
    pub status: SeatStatus,
    pub updated_at: DateTime<Utc>,
}

/// One scheduled vehicle run between two locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub departure_location: Uuid,
    pub arrival_location: Uuid,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub price: i32,
    pub distance: i32,
    pub total_seats: i32,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    pub fn apply_patch(&mut self, patch: &TripPatch) {
        if let Some(vehicle_id) = patch.vehicle_id {
            self.vehicle_id = vehicle_id;
        }
        if let Some(departure_location) = patch.departure_location {
            self.departure_location = departure_location;
        }
        if let Some(arrival_location) = patch.arrival_location {
            self.arrival_location = arrival_location;
        }
        if let Some(departure_time) = patch.departure_time {
            self.departure_time = departure_time;
        }
        if let Some(arrival_time) = patch.arrival_time {
            self.arrival_time = arrival_time;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(distance) = patch.distance {
            self.distance = distance;
        }
    }
}

/// Everything needed to create a trip.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTrip {
    pub vehicle_id: Uuid,
    pub departure_location: Uuid,
    pub arrival_location: Uuid,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub price: i32,
    pub distance: i32,
    pub total_seats: i32,
}

/// Explicit allowlist of patchable trip fields. `total_seats` is absent on
/// purpose: the seat count is fixed by the seats seeded at creation time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripPatch {
    pub vehicle_id: Option<Uuid>,
    pub departure_location: Option<Uuid>,
    pub arrival_location: Option<Uuid>,
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub price: Option<i32>,
    pub distance: Option<i32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Booked,
    Cancelled,
    Completed,
}

impl TicketStatus {
    /// COMPLETED and CANCELLED admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, TicketStatus::Cancelled | TicketStatus::Completed)
    }
}

/// One user's claim on one seat for one trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub trip_id: Uuid,
    pub seat_id: Uuid,
    pub status: TicketStatus,
    pub booked_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Paypal,
    Cash,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// One payment attempt against one ticket. Never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub amount: i32,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_date: DateTime<Utc>,
    pub order_id: Option<String>,
    pub capture_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub contact_phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub license_plate: String,
    pub description: Option<String>,
}
