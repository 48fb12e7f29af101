//! Read-only catalog collaborators (events, ticket types, merchandise).
//!
//! The engine never writes to the catalog; it only reads declared capacity,
//! prices and included merchandise.

pub mod in_memory;

use std::sync::Arc;

use eventive_booking::{Event, MerchandiseItem, TicketType};
use eventive_core::{EventId, MerchandiseItemId, TicketTypeId};

pub use in_memory::{CatalogError, CatalogSeed, InMemoryCatalog};

pub trait EventCatalog: Send + Sync {
    fn get_event(&self, id: &EventId) -> Option<Event>;
}

pub trait TicketTypeCatalog: Send + Sync {
    fn get_ticket_type(&self, id: &TicketTypeId) -> Option<TicketType>;
    fn ticket_types_for_event(&self, event: &EventId) -> Vec<TicketType>;
}

pub trait MerchandiseCatalog: Send + Sync {
    fn get_item(&self, id: &MerchandiseItemId) -> Option<MerchandiseItem>;
}

/// Everything the booking service reads.
pub trait Catalog: EventCatalog + TicketTypeCatalog + MerchandiseCatalog {}

impl<T> Catalog for T where T: EventCatalog + TicketTypeCatalog + MerchandiseCatalog + ?Sized {}

impl<S> EventCatalog for Arc<S>
where
    S: EventCatalog + ?Sized,
{
    fn get_event(&self, id: &EventId) -> Option<Event> {
        (**self).get_event(id)
    }
}

impl<S> TicketTypeCatalog for Arc<S>
where
    S: TicketTypeCatalog + ?Sized,
{
    fn get_ticket_type(&self, id: &TicketTypeId) -> Option<TicketType> {
        (**self).get_ticket_type(id)
    }

    fn ticket_types_for_event(&self, event: &EventId) -> Vec<TicketType> {
        (**self).ticket_types_for_event(event)
    }
}

impl<S> MerchandiseCatalog for Arc<S>
where
    S: MerchandiseCatalog + ?Sized,
{
    fn get_item(&self, id: &MerchandiseItemId) -> Option<MerchandiseItem> {
        (**self).get_item(id)
    }
}
