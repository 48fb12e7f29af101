//! `eventive-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error model, money and email addresses shared by
//! the booking and ticketing modules.

pub mod email;
pub mod error;
pub mod id;
pub mod money;

pub use email::Email;
pub use error::{DomainError, DomainResult};
pub use id::{BundleId, EventId, MerchandiseItemId, RegistrationId, ReservationId, TicketId, TicketTypeId};
pub use money::Money;
