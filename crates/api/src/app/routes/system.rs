use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::context::CallerContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(caller): Extension<CallerContext>) -> impl IntoResponse {
    let caller = caller.caller();
    Json(serde_json::json!({
        "authenticated": !caller.is_guest(),
        "email": caller.email().map(|e| e.as_str().to_string()),
    }))
}
