//! Errors raised by the booking domain model.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Business-rule failure. Deterministic: the same input against the same
/// state always fails the same way. Storage and rendering failures are
/// modelled by the infrastructure crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("malformed identifier: {0}")]
    InvalidId(String),

    /// Names what was looked up, e.g. `attendee ada@example.com`.
    #[error("{0} does not exist")]
    NotFound(String),

    /// Illegal lifecycle transition (confirming a cancelled registration,
    /// checking in a revoked ticket).
    #[error("illegal state change: {0}")]
    InvariantViolation(String),

    /// The record is in a state that forbids this write right now, e.g. a
    /// QR code that is already assigned.
    #[error("conflicting update: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_missing_thing() {
        assert_eq!(
            DomainError::not_found("attendee ada@example.com").to_string(),
            "attendee ada@example.com does not exist"
        );
    }
}
