use thiserror::Error;

/// Failures reported by a [`Repository`](crate::repository::Repository) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// A unique constraint rejected the write (currently only `users.username`).
    #[error("duplicate value for {0}")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Failures of the registration and login flows.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username and password must not be empty")]
    MissingCredentials,

    #[error("username {0:?} is already registered")]
    UsernameTaken(String),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("session lifetime of {0}s does not fit in a token")]
    SessionLifetime(u64),

    #[error("session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}
