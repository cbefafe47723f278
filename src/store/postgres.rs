//! PostgreSQL implementation of [`ContentStore`] on top of `sqlx`.
//!
//! The pool is created lazily and holds at most one connection: topics are
//! published one after another, and each publish borrows the connection for
//! the lifetime of its transaction. An uncommitted [`sqlx::Transaction`] is
//! rolled back when dropped, so the connection goes back to the pool on every
//! exit path.
//!
//! The schema is expected to key `users`, `categories` and `posts` by `uuid`
//! columns; `"categoryId"` and `"authorId"` are bound as uuids too.

use super::{ContentStore, StoreError, StoreTx};
use crate::config::DatabaseSettings;
use crate::models::{NewCategory, NewPost};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;

/// How long to wait for the pooled connection before failing a publish.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// A `sqlx` connection pool pointed at the CMS database.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Build the pool without connecting; the first `begin` opens the connection.
    pub fn connect_lazy(settings: &DatabaseSettings) -> Self {
        let options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.database);

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy_with(options);

        Self { pool }
    }
}

impl ContentStore for PgStore {
    type Tx<'s> = PgTx;

    #[instrument(level = "debug", skip_all)]
    async fn begin(&self) -> Result<PgTx, StoreError> {
        let tx = self.pool.begin().await?;
        debug!("Opened transaction");
        Ok(PgTx { tx })
    }
}

/// One open PostgreSQL transaction.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

impl StoreTx for PgTx {
    /// Decodes `users.id` as a `uuid`. A text or integer id column fails
    /// here with a decode error rather than at insert time.
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<Uuid>, StoreError> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(id)
    }

    async fn find_category_containing(&mut self, name: &str) -> Result<Option<Uuid>, StoreError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM categories WHERE name ILIKE $1 ORDER BY created_at LIMIT 1",
        )
        .bind(format!("%{name}%"))
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn insert_category(&mut self, category: &NewCategory) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO categories (id, name, slug, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4)",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(category.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn slug_exists(&mut self, slug: &str) -> Result<bool, StoreError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM posts WHERE slug = $1)")
                .bind(slug)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    async fn insert_post(&mut self, post: &NewPost) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO posts (id, title, slug, content, author, image, "categoryId", "authorId", "createdAt", "updatedAt")
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)"#,
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(&post.author)
        .bind(&post.image)
        .bind(post.category_id)
        .bind(post.author_id)
        .bind(post.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
