//! Domain error types.

use store::StoreError;
use thiserror::Error;

use crate::repair::{RepairState, Role};

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The requested state transition is not reachable from the current
    /// state.
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: RepairState, to: RepairState },

    /// The payload or a state precondition was violated. Carries the
    /// machine-readable field/rule pair where one applies.
    #[error("{message}")]
    Validation {
        field: Option<&'static str>,
        rule: Option<&'static str>,
        message: String,
    },

    /// The acting role lacks the privilege for the requested transition.
    #[error("Role {role} is not allowed to {action}")]
    Forbidden { role: Role, action: &'static str },

    /// An idempotency or uniqueness rule was violated.
    #[error("{0}")]
    Conflict(String),

    /// A collaborator (email dispatch, directory lookup) failed.
    #[error("Dependency failure: {0}")]
    Dependency(String),

    /// An error occurred in the underlying store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError {
    /// A validation error without a field/rule pair.
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation {
            field: None,
            rule: None,
            message: message.into(),
        }
    }

    /// A validation error tied to a specific field and rule.
    pub fn field_validation(
        field: &'static str,
        rule: &'static str,
        message: impl Into<String>,
    ) -> Self {
        DomainError::Validation {
            field: Some(field),
            rule: Some(rule),
            message: message.into(),
        }
    }

    /// A not-found error for the given entity kind and id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
