/// Failure taxonomy shared by every workflow crate.
///
/// All variants except `Internal` are recoverable by the caller: the boundary
/// can map each to a distinct response without knowing anything about HTTP.
/// `Internal` is reserved for unexpected failures (a collaborator down, a
/// transaction aborted mid-flight) after the store has rolled back.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal service error: {0}")]
    Internal(String),
}
