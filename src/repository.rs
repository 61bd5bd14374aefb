use crate::{
    error::StoreError,
    models::{Blog, BlogForm, User},
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Repository Trait
///
/// The contract between handlers and the document store. Handlers only ever see this
/// trait, so the Postgres-backed store and the in-memory store are interchangeable.
///
/// **Send + Sync + async_trait** are required so that `Arc<dyn Repository>` can be
/// shared across Axum's request tasks.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Blog posts ---
    // All posts in creation order. No filtering, no pagination.
    async fn list_blogs(&self) -> Result<Vec<Blog>, StoreError>;
    async fn get_blog(&self, id: Uuid) -> Result<Blog, StoreError>;
    // Assigns a fresh identifier and creation timestamp.
    async fn create_blog(&self, blog: BlogForm) -> Result<Blog, StoreError>;
    // Replaces title, image and body in place. NotFound if no post has `id`.
    async fn update_blog(&self, id: Uuid, blog: BlogForm) -> Result<Blog, StoreError>;
    async fn delete_blog(&self, id: Uuid) -> Result<(), StoreError>;

    // --- Accounts ---
    // Duplicate if the username is already taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;
    async fn find_user_by_username(&self, username: &str) -> Result<User, StoreError>;
    async fn get_user(&self, id: Uuid) -> Result<User, StoreError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL. The schema lives in `migrations/`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using an initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const BLOG_COLUMNS: &str = "id, title, image, body, created_at";

/// Maps a unique-constraint violation to `StoreError::Duplicate`, everything else to `Database`.
fn classify(err: sqlx::Error, field: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Duplicate(field.to_string())
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_blogs(&self) -> Result<Vec<Blog>, StoreError> {
        let sql = format!("SELECT {BLOG_COLUMNS} FROM blogs ORDER BY created_at ASC, id ASC");
        Ok(sqlx::query_as::<_, Blog>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_blog(&self, id: Uuid) -> Result<Blog, StoreError> {
        let sql = format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE id = $1");
        sqlx::query_as::<_, Blog>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn create_blog(&self, blog: BlogForm) -> Result<Blog, StoreError> {
        let sql = format!(
            "INSERT INTO blogs (id, title, image, body, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) RETURNING {BLOG_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Blog>(&sql)
            .bind(Uuid::new_v4())
            .bind(blog.title)
            .bind(blog.image)
            .bind(blog.body)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_blog(&self, id: Uuid, blog: BlogForm) -> Result<Blog, StoreError> {
        let sql = format!(
            "UPDATE blogs SET title = $2, image = $3, body = $4 \
             WHERE id = $1 RETURNING {BLOG_COLUMNS}"
        );
        sqlx::query_as::<_, Blog>(&sql)
            .bind(id)
            .bind(blog.title)
            .bind(blog.image)
            .bind(blog.body)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn delete_blog(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        match result.rows_affected() {
            0 => Err(StoreError::NotFound),
            _ => Ok(()),
        }
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3) \
             RETURNING id, username, password_hash",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "username"))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn get_user(&self, id: Uuid) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>("SELECT id, username, password_hash FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }
}

/// InMemoryRepository
///
/// A process-local store with the same semantics as `PostgresRepository`.
/// Used by the test suite and by `DATABASE_URL=memory` local runs.
#[derive(Default)]
pub struct InMemoryRepository {
    blogs: RwLock<Vec<Blog>>,
    users: RwLock<Vec<User>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_blogs(&self) -> Result<Vec<Blog>, StoreError> {
        Ok(self.blogs.read().await.clone())
    }

    async fn get_blog(&self, id: Uuid) -> Result<Blog, StoreError> {
        self.blogs
            .read()
            .await
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create_blog(&self, blog: BlogForm) -> Result<Blog, StoreError> {
        let created = Blog {
            id: Uuid::new_v4(),
            title: blog.title,
            image: blog.image,
            body: blog.body,
            created_at: Utc::now(),
        };
        self.blogs.write().await.push(created.clone());
        Ok(created)
    }

    async fn update_blog(&self, id: Uuid, blog: BlogForm) -> Result<Blog, StoreError> {
        let mut blogs = self.blogs.write().await;
        let existing = blogs
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(StoreError::NotFound)?;
        existing.title = blog.title;
        existing.image = blog.image;
        existing.body = blog.body;
        Ok(existing.clone())
    }

    async fn delete_blog(&self, id: Uuid) -> Result<(), StoreError> {
        let mut blogs = self.blogs.write().await;
        let before = blogs.len();
        blogs.retain(|b| b.id != id);
        if blogs.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username == username) {
            return Err(StoreError::Duplicate("username".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_user(&self, id: Uuid) -> Result<User, StoreError> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}
