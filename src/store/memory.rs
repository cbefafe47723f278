//! In-memory [`ContentStore`] for tests.
//!
//! A transaction works on a staged copy of the committed rows; `commit`
//! swaps the copy in and `rollback` (or dropping the handle) throws it away.
//! Clones share the same committed state, so a test can hand one clone to a
//! publisher and inspect the other.

use super::{ContentStore, StoreError, StoreTx};
use crate::models::{NewCategory, NewPost};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub users: Vec<(Uuid, String)>,
    pub categories: Vec<NewCategory>,
    pub posts: Vec<NewPost>,
}

#[derive(Default)]
struct Inner {
    committed: Mutex<Snapshot>,
    fail_post_inserts: AtomicBool,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// A store that already contains an admin user with `email`.
    pub fn with_admin(email: &str) -> (Self, Uuid) {
        let store = Self::default();
        let id = store.add_user(email);
        (store, id)
    }

    pub fn add_user(&self, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.inner
            .committed
            .lock()
            .unwrap()
            .users
            .push((id, email.to_string()));
        id
    }

    pub fn add_category(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.committed.lock().unwrap().categories.push(NewCategory {
            id,
            name: name.to_string(),
            slug: crate::text::category_slug(name),
            created_at: Utc::now(),
        });
        id
    }

    /// Mark a slug as taken by a pre-existing post.
    pub fn add_post_with_slug(&self, slug: &str) {
        self.inner.committed.lock().unwrap().posts.push(NewPost {
            id: Uuid::new_v4(),
            title: slug.to_string(),
            slug: slug.to_string(),
            content: String::new(),
            author: "seed".to_string(),
            image: None,
            category_id: Uuid::nil(),
            author_id: Uuid::nil(),
            created_at: Utc::now(),
        });
    }

    /// Make every subsequent `insert_post` fail.
    pub fn fail_post_inserts(&self) {
        self.inner.fail_post_inserts.store(true, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.committed.lock().unwrap().clone()
    }

    pub fn commits(&self) -> usize {
        self.inner.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.inner.rollbacks.load(Ordering::SeqCst)
    }
}

pub struct MemoryTx<'s> {
    store: &'s MemoryStore,
    staged: Snapshot,
}

impl ContentStore for MemoryStore {
    type Tx<'s> = MemoryTx<'s>;

    async fn begin(&self) -> Result<MemoryTx<'_>, StoreError> {
        Ok(MemoryTx {
            store: self,
            staged: self.snapshot(),
        })
    }
}

fn injected(message: &str) -> StoreError {
    StoreError::Database(sqlx::Error::Protocol(message.to_string()))
}

impl StoreTx for MemoryTx<'_> {
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<Uuid>, StoreError> {
        Ok(self
            .staged
            .users
            .iter()
            .find(|(_, e)| e == email)
            .map(|(id, _)| *id))
    }

    async fn find_category_containing(&mut self, name: &str) -> Result<Option<Uuid>, StoreError> {
        let needle = name.to_lowercase();
        Ok(self
            .staged
            .categories
            .iter()
            .find(|c| c.name.to_lowercase().contains(&needle))
            .map(|c| c.id))
    }

    async fn insert_category(&mut self, category: &NewCategory) -> Result<(), StoreError> {
        self.staged.categories.push(category.clone());
        Ok(())
    }

    async fn slug_exists(&mut self, slug: &str) -> Result<bool, StoreError> {
        Ok(self.staged.posts.iter().any(|p| p.slug == slug))
    }

    async fn insert_post(&mut self, post: &NewPost) -> Result<(), StoreError> {
        if self.store.inner.fail_post_inserts.load(Ordering::SeqCst) {
            return Err(injected("injected insert failure"));
        }
        if self.staged.posts.iter().any(|p| p.slug == post.slug) {
            return Err(injected("duplicate key value violates unique constraint \"posts_slug_key\""));
        }
        if !self.staged.categories.iter().any(|c| c.id == post.category_id) {
            return Err(injected("foreign key violation on \"categoryId\""));
        }
        self.staged.posts.push(post.clone());
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        *self.store.inner.committed.lock().unwrap() = self.staged;
        self.store.inner.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.store.inner.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
