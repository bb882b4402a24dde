//! # DomainError
//!
//! Centralized error handling for the word-draw ecosystem.
//! Storage adapters translate driver failures into these variants so the
//! services never see a database-specific error type.

use thiserror::Error;

/// The primary error type for all domain and service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Resource not found (e.g., Word, Draw)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., empty word text, language code too long)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// The acting user does not own the resource
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource already exists (e.g., duplicate word, second pending draw)
    #[error("conflict: {0}")]
    Conflict(String),

    /// A state machine transition was attempted that is not allowed.
    #[error("invalid state transition: {entity} {id} from {from} to {to}")]
    InvalidTransition {
        entity: String,
        id: String,
        from: String,
        to: String,
    },

    /// Infrastructure failure (e.g., database unreachable, corrupt row)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound(entity.to_string(), id.to_string())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// A specialized Result type for word-draw logic.
pub type Result<T> = std::result::Result<T, DomainError>;
