use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::sanitizer;

// --- Stored Records ---

/// Blog
///
/// A blog post as held by the document store. `id` and `created_at` are assigned
/// on insert and never change; the remaining fields are replaced wholesale on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Blog {
    pub id: Uuid,
    pub title: String,
    // Image URL, stored verbatim.
    pub image: String,
    // Sanitized rich text.
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// User
///
/// An account record. The password hash is a PHC string produced by `auth::hash_password`
/// and is never rendered or logged.
#[derive(Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    // Unique across all accounts, enforced by the store.
    pub username: String,
    pub password_hash: String,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

// --- Form Payloads ---

/// BlogForm
///
/// Fields submitted by the new and edit forms (POST /blogs, PUT /blogs/{id}).
/// Absent fields deserialize as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct BlogForm {
    pub title: String,
    pub image: String,
    pub body: String,
}

impl BlogForm {
    /// Returns the form with its body passed through the sanitizer.
    /// Title and image are deliberately left as submitted.
    pub fn sanitized(self) -> Self {
        Self {
            body: sanitizer::sanitize(&self.body),
            ..self
        }
    }
}

/// Credentials
///
/// Username/password pair submitted by the register and login forms.
#[derive(Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    #[schema(format = Password)]
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
