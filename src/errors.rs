// Copyright 2025 Cowboy AI, LLC.

//! Error types for command, session and dispatch operations

use thiserror::Error;

/// Errors that can occur in domain operations
///
/// Every public operation in this crate returns a [`DomainResult`]; the
/// `Display` output of a variant is the human-readable failure message a
/// CLI frontend shows to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Input failed a pattern, predicate or required-field check
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Invariant violation
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Business rule violation
    #[error("Business rule violation: {rule}")]
    BusinessRuleViolation {
        /// Description of the violated rule
        rule: String,
    },

    /// Invalid state transition
    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        /// Current state
        from: String,
        /// Attempted target state
        to: String,
        /// Why the transition was refused
        reason: String,
    },

    /// Invalid operation
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// Reason why the operation is invalid
        reason: String,
    },

    /// No handler is registered under the given id
    #[error("Handler not found: {0}")]
    HandlerNotFound(String),

    /// A handler is already registered under the given id
    #[error("Handler already registered: {0}")]
    AlreadyRegistered(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Unexpected fault, e.g. a handler that panicked
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl DomainError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::ValidationError(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        DomainError::InternalError(msg.into())
    }

    /// Check if this is a lookup error
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::HandlerNotFound(_))
    }

    /// Check if this is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            DomainError::ValidationError(_)
                | DomainError::InvariantViolation(_)
                | DomainError::BusinessRuleViolation { .. }
        )
    }

    /// Check if an operation was attempted from the wrong lifecycle state
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidStateTransition { .. } | DomainError::InvalidOperation { .. }
        )
    }

    /// Check if this is an internal fault
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            DomainError::InternalError(_) | DomainError::SerializationError(_)
        )
    }
}
