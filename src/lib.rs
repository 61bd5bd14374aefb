use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use tower_cookies::CookieManagerLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod method_override;
pub mod models;
pub mod repository;
pub mod sanitizer;
pub mod views;

// Module for routing segregation (Public, Authenticated).
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI description of the HTTP surface, generated from the `#[utoipa::path]`
/// annotations on the handlers and served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::root, handlers::list_blogs, handlers::new_blog, handlers::create_blog,
        handlers::show_blog, handlers::edit_blog, handlers::update_blog, handlers::delete_blog,
        handlers::register_form, handlers::register, handlers::login_form, handlers::login,
        handlers::logout
    ),
    components(schemas(models::Blog, models::BlogForm, models::Credentials)),
    tags((name = "restful-blog", description = "Server-rendered blog"))
)]
pub struct ApiDoc;

/// AppState
///
/// The single container of shared services, cloned into every request. There is no
/// other process-wide state: the store handle is built once in `main` and injected here.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: the document store client.
    pub repo: RepositoryState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors such as `AuthUser` pull individual services out of the state.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// The authorization gate for `authenticated_routes`.
///
/// *Mechanism*: the `AuthUser` extractor runs before this function body. Without a valid
/// session it rejects with a redirect to `/login`, so the wrapped handler (and any
/// store mutation it would perform) never runs. The resolved user is stored in the
/// request extensions; gated handlers read it with `Extension<AuthUser>` instead of
/// resolving the session a second time.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// create_router
///
/// Assembles the route table, the authorization gate, method override, cookie handling
/// and the observability layers around the given state.
pub fn create_router(state: AppState) -> Router {
    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 1. Route table
    let routes = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: No gate.
        .merge(public::public_routes())
        // Protected Routes: behind `auth_middleware`.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    // 2. Method override has to see the request before routing picks a handler, so the
    // route table is mounted as the fallback of an outer router that carries the layer.
    Router::new()
        .fallback_service(routes)
        .layer(middleware::from_fn(method_override::override_method))
        // 3. Session cookies for the extractors and the login/logout handlers.
        .layer(CookieManagerLayer::new())
        // 4. Observability and Correlation Layers (outermost).
        .layer(
            ServiceBuilder::new()
                // 4a. Request ID Generation.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 4b. Request Tracing: one span per request, tagged with the request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 4c. Request ID Propagation back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
}

/// trace_span_logger
///
/// Builds the `TraceLayer` span so every log line of a request carries its method,
/// uri and `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
