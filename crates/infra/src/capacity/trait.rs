use std::sync::Arc;

use thiserror::Error;

use eventive_core::{EventId, ReservationId};

/// Slots held against an event's capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub id: ReservationId,
    pub event: EventId,
    pub slots: u32,
}

impl Reservation {
    pub fn new(event: EventId, slots: u32) -> Self {
        Self {
            id: ReservationId::new(),
            event,
            slots,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CapacityError {
    #[error("capacity exceeded for event {event}: requested {requested}, available {available}")]
    CapacityExceeded {
        event: EventId,
        requested: u32,
        available: u32,
    },

    #[error("unknown event {0}")]
    UnknownEvent(EventId),

    #[error("capacity backend failure: {0}")]
    Backend(String),
}

/// Atomic admission control per event.
///
/// Implementations must:
/// - perform the capacity check and the increment as one atomic step
/// - leave the counter untouched when rejecting
/// - treat an event without declared capacity as unlimited (still counting)
/// - saturate at zero on release
pub trait CapacityGate: Send + Sync {
    fn reserve(&self, event: &EventId, requested: u32) -> Result<Reservation, CapacityError>;

    fn release(&self, reservation: &Reservation) -> Result<(), CapacityError>;

    /// Slots currently held for the event.
    fn reserved(&self, event: &EventId) -> Result<u32, CapacityError>;
}

impl<S> CapacityGate for Arc<S>
where
    S: CapacityGate + ?Sized,
{
    fn reserve(&self, event: &EventId, requested: u32) -> Result<Reservation, CapacityError> {
        (**self).reserve(event, requested)
    }

    fn release(&self, reservation: &Reservation) -> Result<(), CapacityError> {
        (**self).release(reservation)
    }

    fn reserved(&self, event: &EventId) -> Result<u32, CapacityError> {
        (**self).reserved(event)
    }
}
