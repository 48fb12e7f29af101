use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::app::dto;
use crate::app::services::AppServices;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(get_ticket))
        .route("/status", get(ticket_status))
        .route("/mine", get(my_tickets))
        .route("/:id/download", get(download_ticket))
        .route("/:id/check-in", post(check_in))
}

pub async fn get_ticket(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::EmailEventQuery>,
) -> axum::response::Response {
    let (email, event) = match query.parse() {
        Ok(parsed) => parsed,
        Err(resp) => return resp,
    };

    match services.run(move |booking| booking.get_ticket(&email, &event)).await {
        Ok(found) => Json(dto::TicketLookup::from(found)).into_response(),
        Err(resp) => resp,
    }
}

pub async fn ticket_status(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::EmailEventQuery>,
) -> axum::response::Response {
    let (email, event) = match query.parse() {
        Ok(parsed) => parsed,
        Err(resp) => return resp,
    };

    match services.run(move |booking| booking.has_ticket(&email, &event)).await {
        Ok(found) => Json(dto::TicketStatusResponse::from(found)).into_response(),
        Err(resp) => resp,
    }
}

pub async fn my_tickets(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> axum::response::Response {
    let caller = caller.into_caller();
    match services.run(move |booking| booking.my_tickets(&caller)).await {
        Ok(tickets) => Json(tickets).into_response(),
        Err(resp) => resp,
    }
}

pub async fn download_ticket(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_ticket_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let caller = caller.into_caller();
    match services
        .run(move |booking| booking.download_ticket(&caller, id))
        .await
    {
        Ok(download) => Json(download).into_response(),
        Err(resp) => resp,
    }
}

pub async fn check_in(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_ticket_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let caller = caller.into_caller();
    match services.run(move |booking| booking.check_in(&caller, id)).await {
        Ok(ticket) => Json(ticket).into_response(),
        Err(resp) => resp,
    }
}
