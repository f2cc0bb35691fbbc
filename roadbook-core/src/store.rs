use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::BookingError;
use crate::models::{Location, Payment, Seat, Ticket, Trip, Vehicle};

/// The full document set visible to one transaction.
///
/// Workflow code never touches storage directly: it receives a `&Documents`
/// (reads) or `&mut Documents` (transactions) from the store and works
/// against that view. Inside a transaction every staged write commits
/// together or not at all.
#[derive(Debug, Clone, Default)]
pub struct Documents {
    pub trips: HashMap<Uuid, Trip>,
    pub seats: HashMap<Uuid, Seat>,
    pub tickets: HashMap<Uuid, Ticket>,
    pub payments: HashMap<Uuid, Payment>,
    pub locations: HashMap<Uuid, Location>,
    pub vehicles: HashMap<Uuid, Vehicle>,
}

impl Documents {
    pub fn trip(&self, id: Uuid) -> Result<&Trip, BookingError> {
        self.trips
            .get(&id)
            .ok_or_else(|| BookingError::NotFound("Trip not found".to_string()))
    }

    pub fn trip_mut(&mut self, id: Uuid) -> Result<&mut Trip, BookingError> {
        self.trips
            .get_mut(&id)
            .ok_or_else(|| BookingError::NotFound("Trip not found".to_string()))
    }

    pub fn seat(&self, id: Uuid) -> Result<&Seat, BookingError> {
        self.seats
            .get(&id)
            .ok_or_else(|| BookingError::NotFound("Seat not found".to_string()))
    }

    pub fn seat_mut(&mut self, id: Uuid) -> Result<&mut Seat, BookingError> {
        self.seats
            .get_mut(&id)
            .ok_or_else(|| BookingError::NotFound("Seat not found".to_string()))
    }

    pub fn ticket(&self, id: Uuid) -> Result<&Ticket, BookingError> {
        self.tickets
            .get(&id)
            .ok_or_else(|| BookingError::NotFound("Ticket not found".to_string()))
    }

    pub fn ticket_mut(&mut self, id: Uuid) -> Result<&mut Ticket, BookingError> {
        self.tickets
            .get_mut(&id)
            .ok_or_else(|| BookingError::NotFound("Ticket not found".to_string()))
    }

    pub fn payment(&self, id: Uuid) -> Result<&Payment, BookingError> {
        self.payments
            .get(&id)
            .ok_or_else(|| BookingError::NotFound("Payment not found".to_string()))
    }

    pub fn payment_mut(&mut self, id: Uuid) -> Result<&mut Payment, BookingError> {
        self.payments
            .get_mut(&id)
            .ok_or_else(|| BookingError::NotFound("Payment not found".to_string()))
    }
}

/// Transactional document store contract.
///
/// `transact` is the multi-document transaction: the closure runs against a
/// private draft of the document set, and the draft replaces the committed
/// state only when the closure returns `Ok`. Concurrent transactions
/// serialize, which is what makes a check-then-set inside one closure an
/// atomic conditional update.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Run a read-only closure against a consistent snapshot of the store.
    async fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Documents) -> R + Send + 'static,
        R: Send + 'static;

    /// Run a closure as one all-or-nothing transaction.
    async fn transact<F, R>(&self, f: F) -> Result<R, BookingError>
    where
        F: FnOnce(&mut Documents) -> Result<R, BookingError> + Send + 'static,
        R: Send + 'static;
}
