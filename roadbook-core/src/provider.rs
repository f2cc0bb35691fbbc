use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Payment provider unavailable: {0}")]
    Unavailable(String),
}

/// Opaque external payment service.
///
/// The workflow never constructs or parses the provider's wire protocol; it
/// only consumes a boolean-like outcome for a previously captured payment.
/// Order and capture identifiers are carried as plain strings supplied by
/// the checkout boundary.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Reverse a captured payment. `Ok(true)` means the provider accepted
    /// the refund, `Ok(false)` that it declined.
    async fn refund_capture(&self, capture_id: &str) -> Result<bool, ProviderError>;
}

/// Provider used for cash sales and development wiring; accepts everything.
pub struct OfflineProvider;

#[async_trait]
impl PaymentProvider for OfflineProvider {
    async fn refund_capture(&self, _capture_id: &str) -> Result<bool, ProviderError> {
        Ok(true)
    }
}
