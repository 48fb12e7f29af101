use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use eventive_core::Email;

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(get_registration))
        .route("/:id", get(get_registration_by_id))
        .route("/:id/cancel", post(cancel_registration))
        .route("/:id/confirm", post(confirm_registration))
        .route("/:id/attendees/merchandise", put(update_attendee_merchandise))
}

pub async fn get_registration(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::EmailEventQuery>,
) -> axum::response::Response {
    let (email, event) = match query.parse() {
        Ok(parsed) => parsed,
        Err(resp) => return resp,
    };

    match services
        .run(move |booking| booking.get_registration(&email, &event))
        .await
    {
        Ok(found) => Json(dto::RegistrationLookup::from(found)).into_response(),
        Err(resp) => resp,
    }
}

pub async fn get_registration_by_id(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_registration_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.run(move |booking| booking.registration(id)).await {
        Ok(detail) => Json(detail).into_response(),
        Err(resp) => resp,
    }
}

pub async fn cancel_registration(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_registration_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let caller = caller.into_caller();
    match services
        .run(move |booking| booking.cancel_registration(&caller, id))
        .await
    {
        Ok(detail) => Json(detail).into_response(),
        Err(resp) => resp,
    }
}

pub async fn confirm_registration(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_registration_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let caller = caller.into_caller();
    match services.run(move |booking| booking.confirm_registration(&caller, id)).await {
        Ok(detail) => Json(detail).into_response(),
        Err(resp) => resp,
    }
}

pub async fn update_attendee_merchandise(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateMerchandiseRequest>,
) -> axum::response::Response {
    let id = match dto::parse_registration_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let attendee = match Email::parse(&body.attendee_email) {
        Ok(email) => email,
        Err(e) => {
            return errors::json_error(axum::http::StatusCode::BAD_REQUEST, "validation_error", e.to_string());
        }
    };

    let caller = caller.into_caller();
    match services
        .run(move |booking| booking.update_attendee_merchandise(&caller, id, &attendee, &body.merchandise))
        .await
    {
        Ok(detail) => Json(detail).into_response(),
        Err(resp) => resp,
    }
}
