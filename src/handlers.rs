use crate::{
    AppState,
    auth::{self, AuthUser, OptionalUser},
    models::{BlogForm, Credentials},
    views::{self, Page},
};
use axum::{
    Extension, Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;
use uuid::Uuid;

const BLOGS_PATH: &str = "/blogs";
const REGISTER_PATH: &str = "/register";

/// Post identifiers arrive as raw path segments; anything that is not a UUID is
/// treated exactly like an identifier that matches no post.
fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

fn to_list() -> Response {
    Redirect::to(BLOGS_PATH).into_response()
}

// --- Blog Handlers ---

/// root
///
/// [Public Route] The site root is the post list.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 303, description = "Redirect to /blogs"))
)]
pub async fn root() -> Redirect {
    Redirect::to(BLOGS_PATH)
}

/// list_blogs
///
/// [Public Route] Renders every post. A store failure is logged and renders an empty list.
#[utoipa::path(
    get,
    path = "/blogs",
    responses((status = 200, description = "Post list page", body = String, content_type = "text/html"))
)]
pub async fn list_blogs(user: OptionalUser, State(state): State<AppState>) -> Page {
    let blogs = state.repo.list_blogs().await.unwrap_or_else(|e| {
        tracing::error!("list_blogs error: {:?}", e);
        vec![]
    });
    views::blogs::index(user.user(), &blogs)
}

/// new_blog
///
/// [Authenticated Route] Renders the empty creation form.
#[utoipa::path(
    get,
    path = "/blogs/new",
    responses(
        (status = 200, description = "Creation form", body = String, content_type = "text/html"),
        (status = 303, description = "Anonymous: redirect to /login")
    )
)]
pub async fn new_blog(Extension(user): Extension<AuthUser>) -> Page {
    views::blogs::new(Some(&user), &BlogForm::default())
}

/// create_blog
///
/// [Public Route] Sanitizes the body and inserts a new post. On a store failure the
/// creation form is rendered again with the submitted values and no error message.
#[utoipa::path(
    post,
    path = "/blogs",
    request_body(content = BlogForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Created: redirect to /blogs"),
        (status = 200, description = "Store failure: creation form again", body = String, content_type = "text/html")
    )
)]
pub async fn create_blog(
    user: OptionalUser,
    State(state): State<AppState>,
    Form(form): Form<BlogForm>,
) -> Response {
    let form = form.sanitized();
    match state.repo.create_blog(form.clone()).await {
        Ok(blog) => {
            tracing::info!(blog_id = %blog.id, "blog created");
            to_list()
        }
        Err(e) => {
            tracing::error!("create_blog error: {:?}", e);
            views::blogs::new(user.user(), &form).into_response()
        }
    }
}

/// show_blog
///
/// [Public Route] Renders one post. Unknown or malformed identifiers go back to the list.
#[utoipa::path(
    get,
    path = "/blogs/{id}",
    params(("id" = String, Path, description = "Blog post identifier")),
    responses(
        (status = 200, description = "Post page", body = String, content_type = "text/html"),
        (status = 303, description = "Not found: redirect to /blogs")
    )
)]
pub async fn show_blog(
    user: OptionalUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return to_list();
    };
    match state.repo.get_blog(id).await {
        Ok(blog) => views::blogs::show(user.user(), &blog).into_response(),
        Err(e) => {
            tracing::debug!("show_blog {} failed: {}", id, e);
            to_list()
        }
    }
}

/// edit_blog
///
/// [Authenticated Route] Renders the edit form pre-filled with the stored post.
#[utoipa::path(
    get,
    path = "/blogs/{id}/edit",
    params(("id" = String, Path, description = "Blog post identifier")),
    responses(
        (status = 200, description = "Edit form", body = String, content_type = "text/html"),
        (status = 303, description = "Not found: redirect to /blogs; anonymous: redirect to /login")
    )
)]
pub async fn edit_blog(
    Extension(user): Extension<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return to_list();
    };
    match state.repo.get_blog(id).await {
        Ok(blog) => views::blogs::edit(Some(&user), &blog).into_response(),
        Err(e) => {
            tracing::debug!("edit_blog {} failed: {}", id, e);
            to_list()
        }
    }
}

/// update_blog
///
/// [Public Route] Sanitizes the body and replaces the post's fields in place.
/// Success lands on the post's page, any failure (including no such post) on the list.
#[utoipa::path(
    put,
    path = "/blogs/{id}",
    params(("id" = String, Path, description = "Blog post identifier")),
    request_body(content = BlogForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Redirect to /blogs/{id} on success, /blogs on failure"))
)]
pub async fn update_blog(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Form(form): Form<BlogForm>,
) -> Redirect {
    let Some(id) = parse_id(&raw_id) else {
        return Redirect::to(BLOGS_PATH);
    };
    match state.repo.update_blog(id, form.sanitized()).await {
        Ok(blog) => Redirect::to(&format!("{}/{}", BLOGS_PATH, blog.id)),
        Err(e) => {
            tracing::debug!("update_blog {} failed: {}", id, e);
            Redirect::to(BLOGS_PATH)
        }
    }
}

/// delete_blog
///
/// [Authenticated Route] Removes the post. The response is the same redirect whether or
/// not anything was deleted.
#[utoipa::path(
    delete,
    path = "/blogs/{id}",
    params(("id" = String, Path, description = "Blog post identifier")),
    responses((status = 303, description = "Redirect to /blogs; anonymous: redirect to /login"))
)]
pub async fn delete_blog(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    if let Some(id) = parse_id(&id) {
        match state.repo.delete_blog(id).await {
            Ok(()) => tracing::info!(blog_id = %id, "blog deleted"),
            Err(e) => tracing::debug!("delete_blog {} failed: {}", id, e),
        }
    }
    Redirect::to(BLOGS_PATH)
}

// --- Authentication Handlers ---

/// register_form
///
/// [Public Route] Renders the sign-up form.
#[utoipa::path(
    get,
    path = "/register",
    responses((status = 200, description = "Sign-up form", body = String, content_type = "text/html"))
)]
pub async fn register_form(user: OptionalUser) -> Page {
    views::auth::register(user.user())
}

/// register
///
/// [Public Route] Creates an account and signs the new user in. Failures (duplicate
/// username, empty fields, store errors) are logged and send the client back to the form.
#[utoipa::path(
    post,
    path = "/register",
    request_body(content = Credentials, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Redirect to /blogs on success, /register on failure"))
)]
pub async fn register(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(credentials): Form<Credentials>,
) -> Redirect {
    let user = match auth::register(&state.repo, credentials).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("registration failed: {}", e);
            return Redirect::to(REGISTER_PATH);
        }
    };
    tracing::info!(user_id = %user.id, username = %user.username, "user registered");

    if let Err(e) = auth::start_session(&cookies, &state.config, &user) {
        tracing::error!("could not start session after registration: {}", e);
        return Redirect::to(auth::LOGIN_PATH);
    }
    Redirect::to(BLOGS_PATH)
}

/// login_form
///
/// [Public Route] Renders the login form.
#[utoipa::path(
    get,
    path = "/login",
    responses((status = 200, description = "Login form", body = String, content_type = "text/html"))
)]
pub async fn login_form(user: OptionalUser) -> Page {
    views::auth::login(user.user())
}

/// login
///
/// [Public Route] Verifies credentials; success authenticates the session.
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = Credentials, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Redirect to /blogs on success, /login on failure"))
)]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(credentials): Form<Credentials>,
) -> Redirect {
    let user = match auth::authenticate(&state.repo, credentials).await {
        Ok(user) => user,
        Err(e) => {
            tracing::debug!("login failed: {}", e);
            return Redirect::to(auth::LOGIN_PATH);
        }
    };

    match auth::start_session(&cookies, &state.config, &user) {
        Ok(()) => Redirect::to(BLOGS_PATH),
        Err(e) => {
            tracing::error!("could not start session: {}", e);
            Redirect::to(auth::LOGIN_PATH)
        }
    }
}

/// logout
///
/// [Public Route] Clears the session unconditionally.
#[utoipa::path(
    get,
    path = "/logout",
    responses((status = 303, description = "Redirect to /blogs"))
)]
pub async fn logout(cookies: Cookies) -> Redirect {
    auth::end_session(&cookies);
    Redirect::to(BLOGS_PATH)
}
