use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use eventive_infra::BookingError;

pub fn booking_error_to_response(err: BookingError) -> axum::response::Response {
    match err {
        BookingError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        BookingError::CapacityExceeded {
            ref event,
            requested,
            available,
        } => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": "capacity_exceeded",
                "message": err.to_string(),
                "event_id": event,
                "requested": requested,
                "available": available,
            })),
        )
            .into_response(),
        BookingError::UnknownItem(_) => json_error(StatusCode::BAD_REQUEST, "unknown_item", err.to_string()),
        BookingError::InvalidQuantity { .. } => {
            json_error(StatusCode::BAD_REQUEST, "invalid_quantity", err.to_string())
        }
        BookingError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        BookingError::Unauthenticated => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "authentication required")
        }
        BookingError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
        BookingError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        BookingError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        BookingError::TicketIssuance { .. } => server_error("ticket_issuance_failed", err),
        BookingError::Artifact(_) => server_error("artifact_error", err),
        BookingError::Capacity(_) => server_error("capacity_backend_error", err),
        BookingError::Store(_) => server_error("store_error", err),
    }
}

fn server_error(code: &'static str, err: BookingError) -> axum::response::Response {
    tracing::error!(error = %err, code, "request failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, code, err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
