//! Transactional access to the CMS schema.
//!
//! The publisher only ever talks to the database through one transaction at
//! a time, so the seam is two traits:
//!
//! - [`ContentStore`]: something that can open a transaction
//! - [`StoreTx`]: the handful of reads and writes a publish needs, plus
//!   `commit`/`rollback`
//!
//! # Implementations
//!
//! | Store | Module | Notes |
//! |-------|--------|-------|
//! | PostgreSQL | [`postgres`] | `sqlx` pool capped at one connection |
//! | In-memory | `memory` | test builds only; staged writes, honours rollback |
//!
//! # Schema
//!
//! ```sql
//! users(id, email)
//! categories(id, name, slug, created_at, updated_at)
//! posts(id, title, slug, content, author, image,
//!       "categoryId", "authorId", "createdAt", "updatedAt")
//! ```

use crate::models::{NewCategory, NewPost};
use thiserror::Error;
use uuid::Uuid;

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// A database failure inside a publish.
///
/// Recovered per topic: the transaction is rolled back and the run goes on.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Opens transactions against the content schema.
pub trait ContentStore {
    /// The transaction handle. Dropping it without `commit` discards its writes.
    type Tx<'s>: StoreTx
    where
        Self: 's;

    async fn begin(&self) -> Result<Self::Tx<'_>, StoreError>;
}

/// Operations available inside one publish transaction.
pub trait StoreTx {
    /// Id of the user with exactly this email.
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<Uuid>, StoreError>;

    /// Id of the first category whose name contains `name`, ignoring case.
    async fn find_category_containing(&mut self, name: &str) -> Result<Option<Uuid>, StoreError>;

    async fn insert_category(&mut self, category: &NewCategory) -> Result<(), StoreError>;

    /// Whether any post already uses `slug`.
    async fn slug_exists(&mut self, slug: &str) -> Result<bool, StoreError>;

    async fn insert_post(&mut self, post: &NewPost) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}
