//! Infrastructure layer: collaborator traits and adapters, the capacity gate,
//! QR artifacts, ticket issuance and the booking orchestration.

pub mod artifact;
pub mod booking_service;
pub mod capacity;
pub mod catalog;
pub mod config;
pub mod error;
pub mod issuer;
pub mod qr;
pub mod resolver;
pub mod store;
pub mod views;

#[cfg(test)]
mod integration_tests;

pub use booking_service::{BookingOptions, BookingResult, BookingService, IssuedTicket};
pub use error::{BookingError, IssueError};
