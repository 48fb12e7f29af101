use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use eventive_booking::BookingRequest;

use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/", post(create_booking))
}

pub async fn create_booking(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<BookingRequest>,
) -> axum::response::Response {
    match services.run(move |booking| booking.create_booking(&body)).await {
        Ok(result) => (StatusCode::CREATED, Json(result)).into_response(),
        Err(resp) => resp,
    }
}
