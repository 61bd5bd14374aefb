mod common;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{TestApp, body_text, clears_session, location, session_cookie};
use restful_blog::{
    AppConfig, AppState, InMemoryRepository, create_router,
    error::StoreError,
    models::{Blog, BlogForm, User},
    repository::Repository,
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::test;
use tower::ServiceExt;
use uuid::Uuid;

/// In-memory store that counts how often sessions are resolved to users.
#[derive(Default)]
struct CountingRepository {
    inner: InMemoryRepository,
    user_lookups: AtomicUsize,
}

#[async_trait]
impl Repository for CountingRepository {
    async fn list_blogs(&self) -> Result<Vec<Blog>, StoreError> {
        self.inner.list_blogs().await
    }
    async fn get_blog(&self, id: Uuid) -> Result<Blog, StoreError> {
        self.inner.get_blog(id).await
    }
    async fn create_blog(&self, blog: BlogForm) -> Result<Blog, StoreError> {
        self.inner.create_blog(blog).await
    }
    async fn update_blog(&self, id: Uuid, blog: BlogForm) -> Result<Blog, StoreError> {
        self.inner.update_blog(id, blog).await
    }
    async fn delete_blog(&self, id: Uuid) -> Result<(), StoreError> {
        self.inner.delete_blog(id).await
    }
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        self.inner.create_user(username, password_hash).await
    }
    async fn find_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        self.inner.find_user_by_username(username).await
    }
    async fn get_user(&self, id: Uuid) -> Result<User, StoreError> {
        self.user_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_user(id).await
    }
}

fn blog(title: &str, image: &str, body: &str) -> BlogForm {
    BlogForm {
        title: title.to_string(),
        image: image.to_string(),
        body: body.to_string(),
    }
}

// --- Dispatcher ---

#[test]
async fn test_root_redirects_to_list() {
    let app = TestApp::new();
    let response = app.get("/", None).await;
    assert_eq!(location(&response), "/blogs");
}

#[test]
async fn test_health_check() {
    let app = TestApp::new();
    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new();
    let response = app.get("/nowhere", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
async fn test_openapi_document_lists_blog_routes() {
    let app = TestApp::new();
    let response = app.get("/api-docs/openapi.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let doc: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    let paths = doc["paths"].as_object().unwrap();
    for path in ["/", "/blogs", "/blogs/new", "/blogs/{id}", "/blogs/{id}/edit", "/login"] {
        assert!(paths.contains_key(path), "missing {path}");
    }
}

// --- List & Show ---

#[test]
async fn test_list_renders_every_post() {
    let app = TestApp::new();
    app.repo.create_blog(blog("First", "a.png", "<p>one</p>")).await.unwrap();
    app.repo.create_blog(blog("Second", "b.png", "<p>two</p>")).await.unwrap();

    let response = app.get("/blogs", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("First"));
    assert!(html.contains("Second"));
    assert!(html.contains("Login"), "anonymous navigation is shown");
    assert!(!html.contains(r#"href="/blogs/new""#));

    let session = app.register("nav", "pw").await;
    let html = body_text(app.get("/blogs", Some(&session)).await).await;
    assert!(html.contains(r#"href="/blogs/new""#));
}

#[test]
async fn test_show_returns_the_matching_post() {
    let app = TestApp::new();
    let other = app.repo.create_blog(blog("Other", "o.png", "nope")).await.unwrap();
    let wanted = app
        .repo
        .create_blog(blog("Wanted", "w.png", "<em>the body</em>"))
        .await
        .unwrap();

    let response = app.get(&format!("/blogs/{}", wanted.id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Wanted"));
    assert!(html.contains("<em>the body</em>"));
    assert!(!html.contains(&other.title));
}

#[test]
async fn test_show_unknown_or_malformed_id_redirects_to_list() {
    let app = TestApp::new();

    let missing = app.get(&format!("/blogs/{}", Uuid::new_v4()), None).await;
    assert_eq!(location(&missing), "/blogs");

    let malformed = app.get("/blogs/not-an-id", None).await;
    assert_eq!(location(&malformed), "/blogs");
}

#[test]
async fn test_title_is_escaped_when_rendered() {
    let app = TestApp::new();
    let post = app
        .repo
        .create_blog(blog("<script>alert(1)</script>", "x.png", "fine"))
        .await
        .unwrap();

    let html = body_text(app.get(&format!("/blogs/{}", post.id), None).await).await;
    assert!(!html.contains("<script>alert(1)</script>"));
    assert!(html.contains("&lt;script&gt;"));
}

// --- Authorization Gate ---

#[test]
async fn test_protected_routes_redirect_anonymous_to_login() {
    let app = TestApp::new();
    let post = app.repo.create_blog(blog("Keep", "k.png", "me")).await.unwrap();

    let new_form = app.get("/blogs/new", None).await;
    assert_eq!(location(&new_form), "/login");

    let edit_form = app.get(&format!("/blogs/{}/edit", post.id), None).await;
    assert_eq!(location(&edit_form), "/login");
}

#[test]
async fn test_anonymous_delete_does_not_touch_the_store() {
    let app = TestApp::new();
    let post = app.repo.create_blog(blog("Keep", "k.png", "me")).await.unwrap();

    let response = app
        .post_form(&format!("/blogs/{}", post.id), "_method=DELETE", None)
        .await;
    assert_eq!(location(&response), "/login");
    assert!(app.repo.get_blog(post.id).await.is_ok());
}

#[test]
async fn test_gated_pages_resolve_the_session_once() {
    let repo = Arc::new(CountingRepository::default());
    let router = create_router(AppState {
        repo: repo.clone(),
        config: AppConfig::default(),
    });
    let send = |request: Request<Body>| router.clone().oneshot(request);

    let registered = send(
        Request::post("/register")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("username=olga&password=pw"))
            .unwrap(),
    )
    .await
    .unwrap();
    let session = session_cookie(&registered).expect("registration sets a session cookie");
    let post = repo.create_blog(blog("Mine", "m.png", "text")).await.unwrap();

    for uri in ["/blogs/new".to_string(), format!("/blogs/{}/edit", post.id)] {
        repo.user_lookups.store(0, Ordering::SeqCst);
        let response = send(
            Request::get(uri.as_str())
                .header(header::COOKIE, session.as_str())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("olga"));
        assert_eq!(repo.user_lookups.load(Ordering::SeqCst), 1, "{uri}");
    }
}

#[test]
async fn test_tampered_session_is_anonymous() {
    let app = TestApp::new();
    let session = app.register("alice", "secret").await;
    let tampered = format!("{session}x");

    let response = app.get("/blogs/new", Some(&tampered)).await;
    assert_eq!(location(&response), "/login");
}

// --- Create / Update / Delete ---

#[test]
async fn test_create_sanitizes_body_and_redirects() {
    let app = TestApp::new();
    let session = app.register("writer", "pw").await;

    let response = app
        .post_form(
            "/blogs",
            "title=A&image=u&body=%3Cscript%3Ex%3C%2Fscript%3Ehello",
            Some(&session),
        )
        .await;
    assert_eq!(location(&response), "/blogs");

    let stored = app.repo.list_blogs().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].title, "A");
    assert_eq!(stored[0].image, "u");
    assert_eq!(stored[0].body, "hello");
}

#[test]
async fn test_create_stores_title_and_image_verbatim() {
    let app = TestApp::new();

    let response = app
        .post_form(
            "/blogs",
            "title=%3Cb%3ET%3C%2Fb%3E+%26+co&image=javascript%3Avoid(0)&body=%3Cb%3Eok%3C%2Fb%3E",
            None,
        )
        .await;
    assert_eq!(location(&response), "/blogs");

    let stored = &app.repo.list_blogs().await.unwrap()[0];
    assert_eq!(stored.title, "<b>T</b> & co");
    assert_eq!(stored.image, "javascript:void(0)");
    assert_eq!(stored.body, "<b>ok</b>");
}

#[test]
async fn test_update_via_hidden_method_field() {
    let app = TestApp::new();
    let post = app.repo.create_blog(blog("Old", "old.png", "old")).await.unwrap();

    let response = app
        .post_form(
            &format!("/blogs/{}", post.id),
            "_method=PUT&title=New&image=new.png&body=%3Cp+onclick%3D%22x()%22%3Enew%3C%2Fp%3E",
            None,
        )
        .await;
    assert_eq!(location(&response), format!("/blogs/{}", post.id));

    let updated = app.repo.get_blog(post.id).await.unwrap();
    assert_eq!(updated.id, post.id);
    assert_eq!(updated.created_at, post.created_at);
    assert_eq!(updated.title, "New");
    assert_eq!(updated.image, "new.png");
    assert_eq!(updated.body, "<p>new</p>");
}

#[test]
async fn test_update_via_query_override() {
    let app = TestApp::new();
    let post = app.repo.create_blog(blog("Old", "old.png", "old")).await.unwrap();

    let response = app
        .post_form(
            &format!("/blogs/{}?_method=PUT", post.id),
            "title=Queried&image=q.png&body=q",
            None,
        )
        .await;
    assert_eq!(location(&response), format!("/blogs/{}", post.id));
    assert_eq!(app.repo.get_blog(post.id).await.unwrap().title, "Queried");
}

#[test]
async fn test_update_of_missing_post_redirects_to_list() {
    let app = TestApp::new();

    let response = app
        .post_form(
            &format!("/blogs/{}", Uuid::new_v4()),
            "_method=PUT&title=x&image=y&body=z",
            None,
        )
        .await;
    assert_eq!(location(&response), "/blogs");
    assert!(app.repo.list_blogs().await.unwrap().is_empty());
}

#[test]
async fn test_delete_removes_post() {
    let app = TestApp::new();
    let session = app.register("deleter", "pw").await;
    let post = app.repo.create_blog(blog("Doomed", "d.png", "bye")).await.unwrap();

    let response = app
        .post_form(&format!("/blogs/{}", post.id), "_method=DELETE", Some(&session))
        .await;
    assert_eq!(location(&response), "/blogs");
    assert!(app.repo.get_blog(post.id).await.is_err());
}

#[test]
async fn test_delete_of_missing_post_still_redirects_to_list() {
    let app = TestApp::new();
    let session = app.register("deleter", "pw").await;

    let missing = app
        .post_form(&format!("/blogs/{}", Uuid::new_v4()), "_method=DELETE", Some(&session))
        .await;
    assert_eq!(location(&missing), "/blogs");

    let malformed = app
        .post_form("/blogs/garbage", "_method=DELETE", Some(&session))
        .await;
    assert_eq!(location(&malformed), "/blogs");
}

#[test]
async fn test_edit_form_is_prefilled() {
    let app = TestApp::new();
    let session = app.register("editor", "pw").await;
    let post = app.repo.create_blog(blog("Draft", "draft.png", "text")).await.unwrap();

    let response = app.get(&format!("/blogs/{}/edit", post.id), Some(&session)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"value="Draft""#));
    assert!(html.contains(r#"name="_method" value="PUT""#));
}

// --- Authentication ---

#[test]
async fn test_session_lifecycle() {
    let app = TestApp::new();
    app.register("bob", "hunter2").await;

    // Login
    let login = app.post_form("/login", "username=bob&password=hunter2", None).await;
    assert_eq!(location(&login), "/blogs");
    let session = session_cookie(&login).expect("login sets the session cookie");

    // Authenticated for subsequent requests
    let new_form = app.get("/blogs/new", Some(&session)).await;
    assert_eq!(new_form.status(), StatusCode::OK);
    assert!(body_text(new_form).await.contains("bob"));

    // Logout clears the cookie
    let logout = app.get("/logout", Some(&session)).await;
    assert_eq!(location(&logout), "/blogs");
    assert!(clears_session(&logout));

    // Anonymous again
    let after = app.get("/blogs/new", None).await;
    assert_eq!(location(&after), "/login");
}

#[test]
async fn test_login_with_bad_credentials_redirects_back() {
    let app = TestApp::new();
    app.register("carol", "right").await;

    let wrong_password = app.post_form("/login", "username=carol&password=wrong", None).await;
    assert_eq!(location(&wrong_password), "/login");
    assert!(session_cookie(&wrong_password).is_none());

    let unknown_user = app.post_form("/login", "username=nobody&password=x", None).await;
    assert_eq!(location(&unknown_user), "/login");
}

#[test]
async fn test_duplicate_registration_is_rejected() {
    let app = TestApp::new();
    app.register("dave", "first").await;

    let second = app
        .post_form("/register", "username=dave&password=second", None)
        .await;
    assert_eq!(location(&second), "/register");
    assert!(session_cookie(&second).is_none());

    // The first password still works, so no second account replaced the first.
    let login = app.post_form("/login", "username=dave&password=first", None).await;
    assert_eq!(location(&login), "/blogs");
    let login = app.post_form("/login", "username=dave&password=second", None).await;
    assert_eq!(location(&login), "/login");
}

#[test]
async fn test_registration_with_empty_fields_redirects_back() {
    let app = TestApp::new();
    let response = app.post_form("/register", "username=&password=", None).await;
    assert_eq!(location(&response), "/register");
}

#[test]
async fn test_forms_render() {
    let app = TestApp::new();
    for uri in ["/login", "/register"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains(r#"name="password""#));
    }
}
