//! Publishing generated articles into the CMS.
//!
//! A publish runs in one transaction:
//!
//! 1. Resolve the admin author by email (absent → fatal for the run)
//! 2. [`resolve_category`]: reuse the first matching category or create it
//! 3. [`allocate_slug`]: probe `base`, `base-1`, `base-2`, … until free
//! 4. Insert the post and commit
//!
//! Any failure rolls the transaction back, so a topic either lands as one
//! complete post (plus, at most, its new category) or leaves no trace.

use crate::config::Config;
use crate::models::{ArticleDraft, NewCategory, NewPost, PublishedPost};
use crate::store::{ContentStore, StoreError, StoreTx};
use crate::text::{category_slug, slugify, truncate_chars};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const MAX_TITLE_CHARS: usize = 255;
const MAX_IMAGE_CHARS: usize = 255;

/// Slug base used when a title has no sluggable characters at all.
const FALLBACK_SLUG: &str = "untitled";

/// Why a publish failed.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The configured admin account does not exist. Nothing can ever be
    /// stored without it, so this aborts the run.
    #[error("admin user ({email}) not found in the database")]
    MissingAdmin { email: String },

    /// Any other database failure. The transaction was rolled back.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PublishError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingAdmin { .. })
    }
}

/// Writes drafts into a [`ContentStore`].
#[derive(Debug)]
pub struct Publisher<S> {
    store: S,
    admin_email: String,
    category: String,
    author_label: String,
}

impl<S: ContentStore> Publisher<S> {
    pub fn new(store: S, config: &Config) -> Self {
        Self::with_settings(
            store,
            &config.admin_email,
            &config.category,
            &config.author_label,
        )
    }

    pub fn with_settings(store: S, admin_email: &str, category: &str, author_label: &str) -> Self {
        Self {
            store,
            admin_email: admin_email.to_string(),
            category: category.to_string(),
            author_label: author_label.to_string(),
        }
    }

    /// Store one draft as a post.
    ///
    /// # Returns
    ///
    /// The stored post's id and final slug, or a [`PublishError`]. After an
    /// error nothing from this call is left in the database.
    #[instrument(level = "info", skip_all, fields(title = %truncate_chars(&draft.title, 30)))]
    pub async fn publish(&self, draft: &ArticleDraft) -> Result<PublishedPost, PublishError> {
        let mut tx = self.store.begin().await?;

        let author_id = match tx.find_user_by_email(&self.admin_email).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                discard(tx).await;
                return Err(PublishError::MissingAdmin {
                    email: self.admin_email.clone(),
                });
            }
            Err(e) => {
                discard(tx).await;
                return Err(e.into());
            }
        };
        debug!(admin = %self.admin_email, "Using admin user");

        match self.write_post(&mut tx, author_id, draft).await {
            Ok(published) => {
                tx.commit().await?;
                info!(slug = %published.slug, id = %published.id, "Article stored in database");
                Ok(published)
            }
            Err(e) => {
                discard(tx).await;
                Err(e.into())
            }
        }
    }

    async fn write_post<T: StoreTx>(
        &self,
        tx: &mut T,
        author_id: Uuid,
        draft: &ArticleDraft,
    ) -> Result<PublishedPost, StoreError> {
        let now = Utc::now();
        let category_id = resolve_category(tx, &self.category, now).await?;
        let slug = allocate_slug(tx, &draft.title).await?;

        let post = NewPost {
            id: Uuid::new_v4(),
            title: truncate_chars(&draft.title, MAX_TITLE_CHARS).to_string(),
            slug,
            content: draft.content.clone(),
            author: self.author_label.clone(),
            image: draft
                .image
                .as_deref()
                .filter(|i| !i.is_empty())
                .map(|i| truncate_chars(i, MAX_IMAGE_CHARS).to_string()),
            category_id,
            author_id,
            created_at: now,
        };
        tx.insert_post(&post).await?;

        Ok(PublishedPost {
            id: post.id,
            title: post.title,
            slug: post.slug,
            category_id,
        })
    }
}

/// Roll back, logging instead of failing: the caller already has an error to report.
async fn discard<T: StoreTx>(tx: T) {
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, "Rollback failed; the transaction is dropped anyway");
    }
}

/// Find a category whose name contains `name` (ignoring case) or create one.
///
/// The match is a substring match, so asking for "news" reuses an existing
/// "Fake News" category. Two concurrent writers could both miss and both
/// insert; runs are expected to be sequential.
pub async fn resolve_category<T: StoreTx>(
    tx: &mut T,
    name: &str,
    now: DateTime<Utc>,
) -> Result<Uuid, StoreError> {
    if let Some(id) = tx.find_category_containing(name).await? {
        debug!(category = %name, %id, "Reusing existing category");
        return Ok(id);
    }

    let category = NewCategory {
        id: Uuid::new_v4(),
        name: name.to_string(),
        slug: category_slug(name),
        created_at: now,
    };
    tx.insert_category(&category).await?;
    info!(category = %name, id = %category.id, "Created category");
    Ok(category.id)
}

/// Pick the first free slug among `base`, `base-1`, `base-2`, ….
///
/// Probes one candidate per round-trip, which is fine for the handful of
/// collisions a news title realistically has.
pub async fn allocate_slug<T: StoreTx>(tx: &mut T, title: &str) -> Result<String, StoreError> {
    let mut base = slugify(title);
    if base.is_empty() {
        base = FALLBACK_SLUG.to_string();
    }

    let mut candidate = base.clone();
    let mut counter = 1u32;
    while tx.slug_exists(&candidate).await? {
        candidate = format!("{base}-{counter}");
        counter += 1;
    }

    if counter > 1 {
        debug!(%base, slug = %candidate, "Disambiguated slug");
    }
    Ok(candidate)
}
