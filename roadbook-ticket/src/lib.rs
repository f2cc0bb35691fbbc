use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use roadbook_core::models::{SeatStatus, Ticket, TicketStatus};
use roadbook_core::store::Store;
use roadbook_core::{BookingError, BookingResult};

/// Orchestrates seat reservation into a ticket record.
///
/// Per-ticket state machine: BOOKED → COMPLETED (payment) or BOOKED →
/// CANCELLED (refund/cancel); COMPLETED and CANCELLED are terminal. The
/// payment-driven COMPLETED transition lives in the payment workflow so the
/// seat-booking intent stays visible at one call site.
pub struct TicketFlow<S: Store> {
    store: Arc<S>,
}

impl<S: Store> TicketFlow<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Bind an available seat to a new BOOKED ticket.
    ///
    /// The seat check and the booking write run in one transaction, so two
    /// concurrent reservations of the same seat cannot both succeed.
    pub async fn reserve(
        &self,
        user_id: Uuid,
        trip_id: Uuid,
        seat_id: Uuid,
    ) -> BookingResult<Ticket> {
        let ticket = self
            .store
            .transact(move |docs| {
                docs.trip(trip_id)?;
                let seat = docs.seat(seat_id)?;
                if seat.trip_id != trip_id {
                    return Err(BookingError::Validation(
                        "Seat does not belong to this trip".to_string(),
                    ));
                }

                roadbook_ledger::book_if_available(docs, seat_id)?;

                let now = Utc::now();
                let ticket = Ticket {
                    id: Uuid::new_v4(),
                    user_id,
                    trip_id,
                    seat_id,
                    status: TicketStatus::Booked,
                    booked_at: now,
                    updated_at: now,
                };
                docs.tickets.insert(ticket.id, ticket.clone());
                Ok(ticket)
            })
            .await?;

        tracing::info!(ticket_id = %ticket.id, %seat_id, "seat reserved");
        Ok(ticket)
    }

    /// Move a ticket to a different seat. A no-op when the target equals the
    /// current seat; otherwise the old seat is released and the new one
    /// booked in the same transaction.
    pub async fn reassign_seat(&self, ticket_id: Uuid, new_seat_id: Uuid) -> BookingResult<Ticket> {
        self.store
            .transact(move |docs| {
                let ticket = docs.ticket(ticket_id)?.clone();
                if ticket.seat_id == new_seat_id {
                    return Ok(ticket);
                }
                if ticket.status != TicketStatus::Booked {
                    return Err(BookingError::Conflict(
                        "Ticket is no longer open for changes".to_string(),
                    ));
                }

                let new_seat = docs.seat(new_seat_id)?;
                if new_seat.status == SeatStatus::Booked {
                    return Err(BookingError::Conflict("Seat already booked".to_string()));
                }

                roadbook_ledger::release(docs, ticket.seat_id)?;
                roadbook_ledger::set_unconditional(docs, new_seat_id, SeatStatus::Booked)?;

                let ticket = docs.ticket_mut(ticket_id)?;
                ticket.seat_id = new_seat_id;
                ticket.updated_at = Utc::now();
                Ok(ticket.clone())
            })
            .await
    }

    /// Status-driven transition. Moving to CANCELLED releases the bound seat
    /// as a side effect; no other target touches seat state here.
    pub async fn set_status(&self, ticket_id: Uuid, status: TicketStatus) -> BookingResult<Ticket> {
        self.store
            .transact(move |docs| {
                let (current, seat_id) = {
                    let ticket = docs.ticket(ticket_id)?;
                    (ticket.status, ticket.seat_id)
                };
                if current == status {
                    return docs.ticket(ticket_id).map(|ticket| ticket.clone());
                }
                if current.is_terminal() {
                    return Err(BookingError::Conflict(
                        "Ticket already cancelled or completed".to_string(),
                    ));
                }

                if status == TicketStatus::Cancelled && docs.seats.contains_key(&seat_id) {
                    roadbook_ledger::release(docs, seat_id)?;
                }

                let ticket = docs.ticket_mut(ticket_id)?;
                ticket.status = status;
                ticket.updated_at = Utc::now();
                Ok(ticket.clone())
            })
            .await
    }

    /// Deletion path: remove the ticket record and release its seat.
    pub async fn cancel_with_seat_release(&self, ticket_id: Uuid) -> BookingResult<()> {
        self.store
            .transact(move |docs| {
                let ticket = docs
                    .tickets
                    .remove(&ticket_id)
                    .ok_or_else(|| BookingError::NotFound("Ticket not found".to_string()))?;
                if docs.seats.contains_key(&ticket.seat_id) {
                    roadbook_ledger::release(docs, ticket.seat_id)?;
                }
                Ok(())
            })
            .await
    }

    pub async fn find(&self, ticket_id: Uuid) -> BookingResult<Ticket> {
        self.store
            .read(move |docs| docs.ticket(ticket_id).map(|ticket| ticket.clone()))
            .await
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Vec<Ticket> {
        self.store
            .read(move |docs| {
                let mut tickets: Vec<Ticket> = docs
                    .tickets
                    .values()
                    .filter(|ticket| ticket.user_id == user_id)
                    .cloned()
                    .collect();
                tickets.sort_by(|a, b| b.booked_at.cmp(&a.booked_at));
                tickets
            })
            .await
    }

    pub async fn list(&self) -> Vec<Ticket> {
        self.store
            .read(|docs| {
                let mut tickets: Vec<Ticket> = docs.tickets.values().cloned().collect();
                tickets.sort_by(|a, b| b.booked_at.cmp(&a.booked_at));
                tickets
            })
            .await
    }
}
