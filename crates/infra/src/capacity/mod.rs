//! Capacity gate: the only shared-mutable-state touchpoint of a booking.
//!
//! A reservation is one atomic check-and-increment of an event's reserved
//! counter; `release` is its compensating action.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryCapacityGate;
pub use postgres::PostgresCapacityGate;
pub use r#trait::{CapacityError, CapacityGate, Reservation};
