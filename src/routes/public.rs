use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Reading posts, the account forms, and creating and updating posts need no session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /
        .route("/", get(handlers::root))
        // GET/POST /blogs
        .route("/blogs", get(handlers::list_blogs).post(handlers::create_blog))
        // GET/PUT /blogs/{id}
        // PUT is normally reached as POST + `_method=PUT` from the edit form.
        .route(
            "/blogs/{id}",
            get(handlers::show_blog).put(handlers::update_blog),
        )
        // --- Accounts ---
        .route(
            "/register",
            get(handlers::register_form).post(handlers::register),
        )
        .route("/login", get(handlers::login_form).post(handlers::login))
        .route("/logout", get(handlers::logout))
}
