use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use roadbook_core::models::{Payment, PaymentMethod, PaymentStatus, SeatStatus, TicketStatus};
use roadbook_core::provider::PaymentProvider;
use roadbook_core::store::Store;
use roadbook_core::{BookingError, BookingResult};

/// A payment submission as observed at the checkout boundary. The status is
/// the outcome the boundary saw from the provider (PENDING for cash on
/// delivery, COMPLETED for a captured PayPal order, FAILED for a declined
/// one); order and capture identifiers are the provider's opaque strings.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
    pub ticket_id: Uuid,
    pub amount: i32,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub order_id: Option<String>,
    pub capture_id: Option<String>,
}

/// Drives payment capture/refund bookkeeping and the ticket/seat transitions
/// that hang off it.
///
/// Per-payment state machine: PENDING → COMPLETED → REFUNDED and
/// PENDING → FAILED; everything else is terminal. The administrative
/// overwrite deliberately bypasses these guards.
pub struct PaymentFlow<S: Store> {
    store: Arc<S>,
    provider: Arc<dyn PaymentProvider>,
}

impl<S: Store> PaymentFlow<S> {
    pub fn new(store: Arc<S>, provider: Arc<dyn PaymentProvider>) -> Self {
        Self { store, provider }
    }

    /// Record a payment against a ticket. When the payment completed, the
    /// ticket completes and the seat is confirmed BOOKED (idempotent — the
    /// reservation already booked it); the ticket, seat and payment writes
    /// commit together.
    pub async fn submit(&self, user_id: Uuid, request: PaymentRequest) -> BookingResult<Payment> {
        let payment = self
            .store
            .transact(move |docs| {
                let ticket = docs.ticket(request.ticket_id)?.clone();
                if ticket.status == TicketStatus::Completed {
                    return Err(BookingError::Conflict(
                        "Ticket already completed".to_string(),
                    ));
                }
                if ticket.user_id != user_id {
                    return Err(BookingError::Forbidden(
                        "Ticket belongs to another user".to_string(),
                    ));
                }
                if request.payment_method == PaymentMethod::Paypal && request.order_id.is_none() {
                    return Err(BookingError::Validation(
                        "PayPal payments need an order id".to_string(),
                    ));
                }
                if request.payment_status == PaymentStatus::Refunded {
                    return Err(BookingError::Validation(
                        "Refunds go through the refund flow".to_string(),
                    ));
                }

                let completed = request.payment_status == PaymentStatus::Completed;
                {
                    let ticket = docs.ticket_mut(request.ticket_id)?;
                    ticket.status = if completed {
                        TicketStatus::Completed
                    } else {
                        TicketStatus::Booked
                    };
                    ticket.updated_at = Utc::now();
                }
                if completed && docs.seats.contains_key(&ticket.seat_id) {
                    roadbook_ledger::set_unconditional(docs, ticket.seat_id, SeatStatus::Booked)?;
                }

                let payment = Payment {
                    id: Uuid::new_v4(),
                    ticket_id: request.ticket_id,
                    user_id,
                    amount: request.amount,
                    payment_method: request.payment_method,
                    payment_status: request.payment_status,
                    payment_date: Utc::now(),
                    order_id: request.order_id,
                    capture_id: request.capture_id,
                };
                docs.payments.insert(payment.id, payment.clone());
                Ok(payment)
            })
            .await?;

        tracing::info!(
            payment_id = %payment.id,
            status = ?payment.payment_status,
            "payment recorded"
        );
        Ok(payment)
    }

    /// Reverse a completed payment: payment → REFUNDED, ticket → CANCELLED,
    /// seat → AVAILABLE, all in one transaction. The external reversal runs
    /// first; a declined outcome leaves every record untouched.
    pub async fn refund(&self, payment_id: Uuid, user_id: Uuid) -> BookingResult<Payment> {
        let payment = self
            .store
            .read(move |docs| docs.payment(payment_id).map(|payment| payment.clone()))
            .await?;
        if payment.user_id != user_id {
            return Err(BookingError::Forbidden(
                "Payment belongs to another user".to_string(),
            ));
        }
        if payment.payment_status != PaymentStatus::Completed {
            return Err(BookingError::Conflict(
                "Only completed payments can be refunded".to_string(),
            ));
        }

        if payment.payment_method == PaymentMethod::Paypal {
            if let Some(capture_id) = payment.capture_id.as_deref() {
                let accepted = self
                    .provider
                    .refund_capture(capture_id)
                    .await
                    .map_err(|err| BookingError::Internal(err.to_string()))?;
                if !accepted {
                    return Err(BookingError::Internal(
                        "Payment provider declined the refund".to_string(),
                    ));
                }
            }
        }

        let refunded = self
            .store
            .transact(move |docs| {
                let ticket_id = {
                    let payment = docs.payment_mut(payment_id)?;
                    // Re-check inside the transaction so a concurrent refund
                    // cannot double-fire between the provider call and here.
                    if payment.payment_status != PaymentStatus::Completed {
                        return Err(BookingError::Conflict(
                            "Only completed payments can be refunded".to_string(),
                        ));
                    }
                    payment.payment_status = PaymentStatus::Refunded;
                    payment.payment_date = Utc::now();
                    payment.ticket_id
                };

                let seat_id = match docs.tickets.get_mut(&ticket_id) {
                    Some(ticket) => {
                        ticket.status = TicketStatus::Cancelled;
                        ticket.updated_at = Utc::now();
                        Some(ticket.seat_id)
                    }
                    None => None,
                };
                if let Some(seat_id) = seat_id {
                    if docs.seats.contains_key(&seat_id) {
                        roadbook_ledger::release(docs, seat_id)?;
                    }
                }

                docs.payment(payment_id).map(|payment| payment.clone())
            })
            .await?;

        tracing::info!(payment_id = %payment_id, "payment refunded");
        Ok(refunded)
    }

    /// Administrative correction: unconditional status + timestamp
    /// overwrite, bypassing the refund state machine.
    pub async fn admin_update_status(
        &self,
        payment_id: Uuid,
        status: PaymentStatus,
    ) -> BookingResult<Payment> {
        self.store
            .transact(move |docs| {
                let payment = docs.payment_mut(payment_id)?;
                payment.payment_status = status;
                payment.payment_date = Utc::now();
                Ok(payment.clone())
            })
            .await
    }

    /// Attach the provider's order id to the payment waiting for one.
    ///
    /// The lookup is not scoped to a payment id: it is only correct while at
    /// most one payment awaits an external identifier, which is why it logs
    /// at warn level every time it fires.
    pub async fn attach_external_order_id(&self, order_id: String) -> BookingResult<Payment> {
        tracing::warn!("attaching order id to the first payment found without one");
        self.store
            .transact(move |docs| {
                let target = docs
                    .payments
                    .values()
                    .find(|payment| payment.order_id.is_none())
                    .map(|payment| payment.id)
                    .ok_or_else(|| {
                        BookingError::NotFound("No payment awaiting an order id".to_string())
                    })?;
                let payment = docs.payment_mut(target)?;
                payment.order_id = Some(order_id);
                Ok(payment.clone())
            })
            .await
    }

    pub async fn find_by_ticket(&self, ticket_id: Uuid) -> BookingResult<Payment> {
        self.store
            .read(move |docs| {
                docs.payments
                    .values()
                    .find(|payment| payment.ticket_id == ticket_id)
                    .cloned()
                    .ok_or_else(|| BookingError::NotFound("Payment not found".to_string()))
            })
            .await
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Vec<Payment> {
        self.store
            .read(move |docs| {
                let mut payments: Vec<Payment> = docs
                    .payments
                    .values()
                    .filter(|payment| payment.user_id == user_id)
                    .cloned()
                    .collect();
                payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
                payments
            })
            .await
    }

    pub async fn list(&self) -> Vec<Payment> {
        self.store
            .read(|docs| {
                let mut payments: Vec<Payment> = docs.payments.values().cloned().collect();
                payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
                payments
            })
            .await
    }
}
