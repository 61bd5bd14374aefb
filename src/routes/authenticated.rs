use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get},
};

/// Authenticated Router Module
///
/// Every route here sits behind the gate installed in `create_router`, which requires
/// a valid session and otherwise redirects to `/login` before the handler runs.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /blogs/new
        // Static segment, takes priority over the public `/blogs/{id}`.
        .route("/blogs/new", get(handlers::new_blog))
        // GET /blogs/{id}/edit
        .route("/blogs/{id}/edit", get(handlers::edit_blog))
        // DELETE /blogs/{id}
        // Merged with the public GET/PUT on the same path.
        .route("/blogs/{id}", delete(handlers::delete_blog))
}
