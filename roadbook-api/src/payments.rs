use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use roadbook_core::models::{Payment, PaymentStatus};
use roadbook_payment::PaymentRequest;

use crate::error::AppError;
use crate::middleware::auth::{require_admin, require_user, AuthUser};
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AttachOrderIdRequest {
    pub order_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: PaymentStatus,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let user_routes = Router::new()
        .route("/v1/payments", post(submit_payment))
        .route("/v1/payments/mine", get(my_payments))
        .route("/v1/payments/refund/{id}", put(refund_payment))
        .route("/v1/payments/order-id", put(attach_order_id))
        .route_layer(from_fn_with_state(state.clone(), require_user));

    let admin_routes = Router::new()
        .route("/v1/payments", get(list_payments))
        .route("/v1/payments/{id}/status", patch(update_payment_status))
        .route_layer(from_fn_with_state(state, require_admin));

    user_routes.merge(admin_routes)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/payments
/// Record a payment outcome for one of the caller's tickets.
async fn submit_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<PaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), AppError> {
    let payment = state.payments.submit(user.id, req).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /v1/payments/mine
async fn my_payments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Json<Vec<Payment>> {
    Json(state.payments.list_by_user(user.id).await)
}

/// PUT /v1/payments/refund/{id}
/// Reverse a completed payment; cancels the ticket and releases the seat.
async fn refund_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<Payment>, AppError> {
    Ok(Json(state.payments.refund(payment_id, user.id).await?))
}

/// PUT /v1/payments/order-id
/// Late attachment of the provider's order id to the payment waiting for it.
async fn attach_order_id(
    State(state): State<AppState>,
    Json(req): Json<AttachOrderIdRequest>,
) -> Result<Json<Payment>, AppError> {
    Ok(Json(state.payments.attach_external_order_id(req.order_id).await?))
}

/// GET /v1/payments
async fn list_payments(State(state): State<AppState>) -> Json<Vec<Payment>> {
    Json(state.payments.list().await)
}

/// PATCH /v1/payments/{id}/status
/// Administrative correction, bypasses the refund state machine.
async fn update_payment_status(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
    Json(req): Json<UpdatePaymentStatusRequest>,
) -> Result<Json<Payment>, AppError> {
    Ok(Json(
        state
            .payments
            .admin_update_status(payment_id, req.payment_status)
            .await?,
    ))
}
