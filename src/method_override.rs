//! HTML forms can only send GET and POST. A POST carrying `_method=PUT|PATCH|DELETE`,
//! either in the query string or as a hidden form field, is re-dispatched with that
//! method before routing.

use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::{HeaderMap, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Name of the query parameter / form field that carries the override.
pub const OVERRIDE_FIELD: &str = "_method";

// Upper bound on a buffered form body. Blog bodies are the largest field.
const MAX_FORM_BYTES: usize = 2 * 1024 * 1024;

/// override_method
///
/// Must wrap the router from the outside (routing picks the handler by method, so a
/// `route_layer` would run too late). Only POST requests are eligible.
pub async fn override_method(request: Request, next: Next) -> Response {
    if request.method() != Method::POST {
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();
    let mut target = parts.uri.query().and_then(method_from_urlencoded);

    let body = if target.is_none() && is_form(&parts.headers) {
        let bytes = match to_bytes(body, MAX_FORM_BYTES).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!("form body could not be buffered: {}", e);
                return StatusCode::PAYLOAD_TOO_LARGE.into_response();
            }
        };
        target = std::str::from_utf8(&bytes)
            .ok()
            .and_then(method_from_urlencoded);
        Body::from(bytes)
    } else {
        body
    };

    if let Some(method) = target {
        tracing::debug!(uri = %parts.uri, %method, "method override");
        parts.method = method;
    }
    next.run(Request::from_parts(parts, body)).await
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
}

/// Extracts an allowed override from `application/x-www-form-urlencoded` text.
pub fn method_from_urlencoded(encoded: &str) -> Option<Method> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(encoded).ok()?;
    let (_, value) = pairs.into_iter().find(|(key, _)| key == OVERRIDE_FIELD)?;
    match value.trim().to_ascii_uppercase().as_str() {
        "PUT" => Some(Method::PUT),
        "PATCH" => Some(Method::PATCH),
        "DELETE" => Some(Method::DELETE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_allowed_methods() {
        assert_eq!(method_from_urlencoded("_method=PUT"), Some(Method::PUT));
        assert_eq!(method_from_urlencoded("a=1&_method=delete"), Some(Method::DELETE));
        assert_eq!(method_from_urlencoded("_method=patch"), Some(Method::PATCH));
    }

    #[test]
    fn ignores_other_values() {
        assert_eq!(method_from_urlencoded("_method=GET"), None);
        assert_eq!(method_from_urlencoded("_method=CONNECT"), None);
        assert_eq!(method_from_urlencoded("title=PUT"), None);
        assert_eq!(method_from_urlencoded(""), None);
    }
}
