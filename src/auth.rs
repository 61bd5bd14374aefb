use std::convert::Infallible;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tower_cookies::{Cookie, Cookies, cookie::SameSite};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::{AuthError, StoreError},
    models::{Credentials, User},
    repository::RepositoryState,
};

/// Name of the cookie carrying the signed session token.
pub const SESSION_COOKIE: &str = "blog_session";

/// Where anonymous requests to protected routes are sent.
pub const LOGIN_PATH: &str = "/login";

/// Claims
///
/// Payload of the session token stored in [`SESSION_COOKIE`]. Signed with the
/// configured session secret (HS256) and validated on every request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's id. Re-resolved against the store on each request.
    pub sub: Uuid,
    /// Expiration Time (exp).
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request. Extracting it from a request with
/// no valid session rejects with a redirect to the login page, so a handler taking an
/// `AuthUser` never runs for anonymous callers.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// OptionalUser
///
/// The current user, if any. Never rejects; handed to every view so the layout can
/// show the right navigation.
#[derive(Debug, Clone, Default)]
pub struct OptionalUser(pub Option<AuthUser>);

impl OptionalUser {
    pub fn user(&self) -> Option<&AuthUser> {
        self.0.as_ref()
    }
}

/// Resolves the session attached to a request.
///
/// 1. Read the session cookie (requires `CookieManagerLayer` on the router).
/// 2. Verify the token signature and expiry.
/// 3. Look the user up again, so a removed account loses its session.
async fn resolve_session<S>(parts: &mut Parts, state: &S) -> Option<AuthUser>
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    let cookies = Cookies::from_request_parts(parts, state).await.ok()?;
    let token = cookies.get(SESSION_COOKIE)?.value().to_string();

    let config = AppConfig::from_ref(state);
    let claims = match decode_token(&config, &token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("rejecting session token: {}", e);
            return None;
        }
    };

    let repo = RepositoryState::from_ref(state);
    match repo.get_user(claims.sub).await {
        Ok(user) => Some(user.into()),
        Err(e) => {
            tracing::debug!("session user {} could not be loaded: {}", claims.sub, e);
            None
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match resolve_session(parts, state).await {
            Some(user) => Ok(user),
            None => Err(Redirect::to(LOGIN_PATH).into_response()),
        }
    }
}

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(resolve_session(parts, state).await))
    }
}

// --- Session Tokens ---

/// Signs a session token for `user_id`, valid for `config.session_ttl_secs`.
pub fn issue_token(config: &AppConfig, user_id: Uuid) -> Result<String, AuthError> {
    let now = Utc::now().timestamp().max(0) as usize;
    let exp = usize::try_from(config.session_ttl_secs)
        .ok()
        .and_then(|ttl| now.checked_add(ttl))
        .ok_or(AuthError::SessionLifetime(config.session_ttl_secs))?;
    let claims = Claims {
        sub: user_id,
        iat: now,
        exp,
    };
    let key = EncodingKey::from_secret(config.session_secret.as_bytes());
    Ok(encode(&Header::default(), &claims, &key)?)
}

/// Verifies signature and expiry of a session token.
pub fn decode_token(config: &AppConfig, token: &str) -> Result<Claims, AuthError> {
    let key = DecodingKey::from_secret(config.session_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;
    Ok(decode::<Claims>(token, &key, &validation)?.claims)
}

/// Moves the client's session to the authenticated state.
pub fn start_session(cookies: &Cookies, config: &AppConfig, user: &User) -> Result<(), AuthError> {
    let token = issue_token(config, user.id)?;
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.env == crate::config::Env::Production)
        .build();
    cookies.add(cookie);
    Ok(())
}

/// Moves the client's session back to anonymous. Safe to call when no session exists.
pub fn end_session(cookies: &Cookies) {
    cookies.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
}

// --- Credentials ---

/// Hashes a password into a PHC string (Argon2id, random salt).
/// Runs on the blocking pool since hashing is deliberately slow.
pub async fn hash_password(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Hashing(e.to_string()))?
}

/// Checks a password against a stored PHC string. A malformed hash never verifies.
pub async fn verify_password(password: String, password_hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || {
        let parsed = match PasswordHash::new(&password_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("stored password hash is malformed: {}", e);
                return false;
            }
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
    .await
    .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// register
///
/// Creates a new account. Username uniqueness is left to the store; a duplicate comes
/// back as [`AuthError::UsernameTaken`] and no second account is written.
pub async fn register(repo: &RepositoryState, credentials: Credentials) -> Result<User, AuthError> {
    let Credentials { username, password } = credentials;
    if username.is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    let password_hash = hash_password(password).await?;
    match repo.create_user(&username, &password_hash).await {
        Ok(user) => Ok(user),
        Err(StoreError::Duplicate(_)) => Err(AuthError::UsernameTaken(username)),
        Err(e) => Err(e.into()),
    }
}

/// authenticate
///
/// Verifies a username/password pair. Unknown users and wrong passwords are
/// indistinguishable to the caller.
pub async fn authenticate(
    repo: &RepositoryState,
    credentials: Credentials,
) -> Result<User, AuthError> {
    let Credentials { username, password } = credentials;
    if username.is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    let user = match repo.find_user_by_username(&username).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => return Err(AuthError::InvalidCredentials),
        Err(e) => return Err(e.into()),
    };

    if verify_password(password, user.password_hash.clone()).await? {
        Ok(user)
    } else {
        Err(AuthError::InvalidCredentials)
    }
}
