use std::sync::Arc;

use thiserror::Error;

use eventive_booking::{Registration, Ticket};
use eventive_core::{DomainError, DomainResult, Email, EventId, RegistrationId, TicketId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Mutation applied to a record under the store's write lock.
pub type RegistrationUpdate<'a> = &'a mut dyn FnMut(&mut Registration) -> DomainResult<()>;
pub type TicketUpdate<'a> = &'a mut dyn FnMut(&mut Ticket) -> DomainResult<()>;

/// Registration and ticket persistence.
///
/// Implementations must:
/// - insert a registration (rows and bundles included) atomically
/// - apply `update_*` closures atomically: the stored record changes only if
///   the closure returns `Ok`, and no other write interleaves
/// - return list lookups newest first
pub trait BookingStore: Send + Sync {
    fn insert_registration(&self, registration: Registration) -> Result<(), StoreError>;

    fn get_registration(&self, id: RegistrationId) -> Result<Option<Registration>, StoreError>;

    /// Registrations booked by `email` for `event`, newest first.
    fn registrations_for(&self, email: &Email, event: &EventId) -> Result<Vec<Registration>, StoreError>;

    /// Attendee slots held by the event's non-cancelled registrations.
    fn reserved_slots(&self, event: &EventId) -> Result<u32, StoreError>;

    fn update_registration(
        &self,
        id: RegistrationId,
        update: RegistrationUpdate<'_>,
    ) -> Result<Registration, StoreError>;

    fn delete_registration(&self, id: RegistrationId) -> Result<Option<Registration>, StoreError>;

    fn insert_ticket(&self, ticket: Ticket) -> Result<(), StoreError>;

    fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>, StoreError>;

    fn update_ticket(&self, id: TicketId, update: TicketUpdate<'_>) -> Result<Ticket, StoreError>;

    fn tickets_for_registration(&self, id: RegistrationId) -> Result<Vec<Ticket>, StoreError>;

    /// Tickets held by `email` across all events, newest first.
    fn tickets_for_email(&self, email: &Email) -> Result<Vec<Ticket>, StoreError>;

    /// Remove and return every ticket of a registration.
    fn remove_tickets_for_registration(&self, id: RegistrationId) -> Result<Vec<Ticket>, StoreError>;
}

impl<S> BookingStore for Arc<S>
where
    S: BookingStore + ?Sized,
{
    fn insert_registration(&self, registration: Registration) -> Result<(), StoreError> {
        (**self).insert_registration(registration)
    }

    fn get_registration(&self, id: RegistrationId) -> Result<Option<Registration>, StoreError> {
        (**self).get_registration(id)
    }

    fn registrations_for(&self, email: &Email, event: &EventId) -> Result<Vec<Registration>, StoreError> {
        (**self).registrations_for(email, event)
    }

    fn reserved_slots(&self, event: &EventId) -> Result<u32, StoreError> {
        (**self).reserved_slots(event)
    }

    fn update_registration(
        &self,
        id: RegistrationId,
        update: RegistrationUpdate<'_>,
    ) -> Result<Registration, StoreError> {
        (**self).update_registration(id, update)
    }

    fn delete_registration(&self, id: RegistrationId) -> Result<Option<Registration>, StoreError> {
        (**self).delete_registration(id)
    }

    fn insert_ticket(&self, ticket: Ticket) -> Result<(), StoreError> {
        (**self).insert_ticket(ticket)
    }

    fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        (**self).get_ticket(id)
    }

    fn update_ticket(&self, id: TicketId, update: TicketUpdate<'_>) -> Result<Ticket, StoreError> {
        (**self).update_ticket(id, update)
    }

    fn tickets_for_registration(&self, id: RegistrationId) -> Result<Vec<Ticket>, StoreError> {
        (**self).tickets_for_registration(id)
    }

    fn tickets_for_email(&self, email: &Email) -> Result<Vec<Ticket>, StoreError> {
        (**self).tickets_for_email(email)
    }

    fn remove_tickets_for_registration(&self, id: RegistrationId) -> Result<Vec<Ticket>, StoreError> {
        (**self).remove_tickets_for_registration(id)
    }
}
