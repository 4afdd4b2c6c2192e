//! Domain error taxonomy for KMT.
//!
//! These errors describe why an operation on a request was rejected. Storage
//! failures live in `kmt-db`'s `DatabaseError`, which wraps `CoreError`; the
//! CLI converges both into `anyhow`.

use thiserror::Error;

use crate::enums::{RequestStatus, WorkflowAction};

/// Errors that can be raised by any KMT crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed caller input (empty items, non-positive quantity, blank reason).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity is absent, soft-deleted, or not visible to the caller.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// The actor's role or area does not permit the operation.
    #[error("Forbidden: actor {actor_id} may not {operation}")]
    Forbidden { actor_id: String, operation: String },

    /// The workflow action has no edge out of the request's current status.
    #[error("Invalid state transition: request {id} is {from}, cannot {action}")]
    InvalidTransition {
        id: String,
        from: RequestStatus,
        action: WorkflowAction,
    },

    /// Soft-delete requested on a request that is already soft-deleted.
    #[error("Request {id} is already deleted")]
    AlreadyDeleted { id: String },

    /// Recover or purge requested on a request that is not soft-deleted.
    #[error("Request {id} is not deleted")]
    NotDeleted { id: String },

    /// Another mutation on the same request is in flight or committed first.
    #[error("Conflict: {id} was modified concurrently; retry")]
    Conflict { id: String },

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    pub fn not_found(entity_type: &str, id: &str) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    pub fn forbidden(actor_id: &str, operation: impl Into<String>) -> Self {
        Self::Forbidden {
            actor_id: actor_id.to_string(),
            operation: operation.into(),
        }
    }

    /// Only conflicts are safe to retry: nothing was committed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
