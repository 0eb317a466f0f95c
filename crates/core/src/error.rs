use crate::types::{DbId, Timestamp};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing or invalid credentials.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// The caller does not own the resource it is acting on.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The entity is not in a state that allows the requested transition.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("No available parking slots")]
    NoCapacity,

    #[error("Invalid interval: exit time {exit} precedes entry time {entry}")]
    InvalidInterval { entry: Timestamp, exit: Timestamp },

    /// The storage layer failed or aborted the transaction. Nothing was applied.
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
