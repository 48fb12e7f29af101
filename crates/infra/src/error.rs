//! Errors surfaced by the booking service.
//!
//! Collaborator errors (`StoreError`, `ArtifactError`, `CapacityError`) are
//! converted into `BookingError` at the service boundary so callers only
//! ever match on one enum.

use thiserror::Error;

use eventive_core::{DomainError, Email, EventId, MerchandiseItemId, TicketTypeId};

use crate::artifact::ArtifactError;
use crate::capacity::CapacityError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("capacity exceeded for event {event}: requested {requested}, available {available}")]
    CapacityExceeded {
        event: EventId,
        requested: u32,
        available: u32,
    },

    #[error("unknown merchandise item {0}")]
    UnknownItem(MerchandiseItemId),

    #[error("invalid quantity {quantity} for merchandise item {item}")]
    InvalidQuantity { item: MerchandiseItemId, quantity: i64 },

    #[error("ticket issuance failed for attendee {attendee_index} ({email}): {source}")]
    TicketIssuance {
        attendee_index: usize,
        email: Email,
        #[source]
        source: IssueError,
    },

    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("capacity backend failure: {0}")]
    Capacity(String),

    #[error("store failure: {0}")]
    Store(String),
}

impl BookingError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

/// Why a single ticket could not be issued.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("no attendee at index {0}")]
    MissingAttendee(usize),

    #[error("unknown ticket type {0}")]
    UnknownTicketType(TicketTypeId),

    #[error("included merchandise could not be resolved: {0}")]
    IncludedMerchandise(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("issuing worker panicked")]
    Panicked,
}

impl From<DomainError> for BookingError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::Validation(msg),
            DomainError::InvariantViolation(msg) => Self::InvariantViolation(msg),
            DomainError::NotFound(what) => Self::NotFound(what),
            DomainError::Conflict(msg) => Self::Conflict(msg),
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Domain(domain) => domain.into(),
            StoreError::Backend(msg) => Self::Store(msg),
        }
    }
}

impl From<CapacityError> for BookingError {
    fn from(err: CapacityError) -> Self {
        match err {
            CapacityError::CapacityExceeded {
                event,
                requested,
                available,
            } => Self::CapacityExceeded {
                event,
                requested,
                available,
            },
            CapacityError::UnknownEvent(event) => Self::Validation(format!("unknown event {event}")),
            CapacityError::Backend(msg) => Self::Capacity(msg),
        }
    }
}
