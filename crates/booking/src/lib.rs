//! Booking & ticketing domain module.
//!
//! This crate contains the business rules for registrations, attendee rows,
//! merchandise bundles and tickets, implemented purely as deterministic domain
//! logic (no IO, no HTTP, no storage). Orchestration (capacity reservation,
//! persistence, compensation) lives in `eventive-infra`.

pub mod caller;
pub mod catalog;
pub mod merchandise;
pub mod registration;
pub mod request;
pub mod ticket;

pub use caller::Caller;
pub use catalog::{Event, MerchandiseItem, TicketType};
pub use merchandise::{LineItem, MerchandiseBundle, MerchandiseSelection};
pub use registration::{AttendeeRow, PaymentStatus, Registration, RegistrationStatus};
pub use request::{AttendeeRequest, BookingRequest, ValidatedAttendee, ValidatedBooking};
pub use ticket::{ArtifactRef, Ticket, TicketStatus};
