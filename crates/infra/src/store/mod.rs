//! Persistence boundary for registrations and tickets.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryBookingStore;
pub use r#trait::{BookingStore, StoreError};
