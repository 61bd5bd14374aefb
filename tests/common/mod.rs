#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, Response, StatusCode, header},
};
use restful_blog::{AppConfig, AppState, InMemoryRepository, auth::SESSION_COOKIE, create_router};
use std::sync::Arc;
use tower::ServiceExt;

/// A router wired to a fresh in-memory store, plus a handle on that store for assertions.
pub struct TestApp {
    pub router: Router,
    pub repo: Arc<InMemoryRepository>,
    pub config: AppConfig,
}

impl TestApp {
    pub fn new() -> Self {
        let repo = Arc::new(InMemoryRepository::new());
        let config = AppConfig::default();
        let state = AppState {
            repo: repo.clone(),
            config: config.clone(),
        };
        TestApp {
            router: create_router(state),
            repo,
            config,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, uri: &str, session: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(cookie) = session {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, form: &str, session: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = session {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    /// Registers a user through the HTTP surface and returns the `Cookie` header value
    /// carrying the new session.
    pub async fn register(&self, username: &str, password: &str) -> String {
        let form = format!("username={username}&password={password}");
        let response = self.post_form("/register", &form, None).await;
        assert_eq!(location(&response), "/blogs", "registration should succeed");
        session_cookie(&response).expect("registration sets a session cookie")
    }
}

/// The `Location` header of a redirect.
pub fn location(response: &Response<Body>) -> &str {
    assert_eq!(response.status(), StatusCode::SEE_OTHER, "expected a redirect");
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("redirect carries a Location header")
}

/// The session cookie set by a response, formatted for a `Cookie` request header.
/// `None` if the response does not set a non-empty session cookie.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| {
            pair.starts_with(&format!("{SESSION_COOKIE}="))
                && pair.len() > SESSION_COOKIE.len() + 1
        })
        .map(str::to_string)
}

/// Whether the response instructs the client to drop the session cookie.
pub fn clears_session(response: &Response<Body>) -> bool {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&format!("{SESSION_COOKIE}=;")) || v == format!("{SESSION_COOKIE}="))
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
