use axum::{routing::get, Router};

pub mod artifacts;
pub mod bookings;
pub mod events;
pub mod registrations;
pub mod system;
pub mod tickets;

/// Router for all caller-aware endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/bookings", bookings::router())
        .nest("/registrations", registrations::router())
        .nest("/tickets", tickets::router())
        .nest("/events", events::router())
        .nest("/artifacts", artifacts::router())
}
