use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};

use eventive_infra::artifact::validate_name;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/:name", get(get_artifact))
}

/// Serve a stored QR image.
pub async fn get_artifact(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
) -> axum::response::Response {
    if validate_name(&name).is_err() {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", format!("artifact {name}"));
    }

    let lookup = name.clone();
    match services.run(move |booking| booking.artifact(&lookup)).await {
        Ok(Some(bytes)) => (StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", format!("artifact {name}")),
        Err(resp) => resp,
    }
}
