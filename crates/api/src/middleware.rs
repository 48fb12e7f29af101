use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use eventive_booking::Caller;
use eventive_core::Email;

use crate::context::CallerContext;

/// Header carrying the authenticated user's email, set by the fronting
/// identity proxy.
pub const USER_HEADER: &str = "x-eventive-user";

pub async fn caller_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let caller = extract_caller(req.headers())?;
    req.extensions_mut().insert(CallerContext::new(caller));
    Ok(next.run(req).await)
}

fn extract_caller(headers: &HeaderMap) -> Result<Caller, StatusCode> {
    let Some(header) = headers.get(USER_HEADER) else {
        return Ok(Caller::guest());
    };

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;
    let value = header.trim();
    if value.is_empty() {
        return Ok(Caller::guest());
    }

    Email::parse(value)
        .map(Caller::user)
        .map_err(|_| StatusCode::UNAUTHORIZED)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn missing_header_is_a_guest() {
        assert!(extract_caller(&HeaderMap::new()).unwrap().is_guest());
    }

    #[test]
    fn valid_header_is_a_user() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_HEADER, HeaderValue::from_static("Ada@Example.com"));
        let caller = extract_caller(&headers).unwrap();
        assert_eq!(caller.email().unwrap().as_str(), "ada@example.com");
    }

    #[test]
    fn malformed_header_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_HEADER, HeaderValue::from_static("not-an-email"));
        assert_eq!(extract_caller(&headers), Err(StatusCode::UNAUTHORIZED));
    }
}
