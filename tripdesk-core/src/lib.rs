pub mod session;

pub use session::SessionId;

/// Error taxonomy shared by every tripdesk crate.
///
/// Capacity shortfalls get their own variant so callers can always tell a
/// lost admission race apart from a malformed request; the booking workflow
/// surfaces them verbatim instead of collapsing them into `Validation`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Insufficient capacity: available {available}, requested {requested}")]
    CapacityExceeded { available: i32, requested: i32 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream provider failed: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Stable machine-readable code used in API envelopes and logs.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Validation(_) | CoreError::CapacityExceeded { .. } => "VALIDATION_ERROR",
            CoreError::NotFound(_) => "NOT_FOUND",
            CoreError::Upstream(_) => "UPSTREAM_FAIL",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
