use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use eventive_core::EventId;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/:id/ticket-types", get(list_ticket_types))
        .route("/:id/capacity", get(reserved_capacity))
}

fn parse_event_id(raw: &str) -> Result<EventId, axum::response::Response> {
    EventId::parse(raw).map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}

pub async fn list_ticket_types(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let event = match parse_event_id(&id) {
        Ok(event) => event,
        Err(resp) => return resp,
    };

    match services.run(move |booking| booking.ticket_types(&event)).await {
        Ok(types) => Json(types).into_response(),
        Err(resp) => resp,
    }
}

pub async fn reserved_capacity(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let event = match parse_event_id(&id) {
        Ok(event) => event,
        Err(resp) => return resp,
    };

    let response_event = event.clone();
    match services.run(move |booking| booking.reserved(&event)).await {
        Ok(reserved) => Json(serde_json::json!({
            "event_id": response_event,
            "reserved": reserved,
        }))
        .into_response(),
        Err(resp) => resp,
    }
}
