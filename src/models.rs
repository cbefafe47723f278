//! Data models shared across the pipeline.
//!
//! - [`Topic`]: a headline/summary pair handed to the generator
//! - [`GeneratedArticle`]: the title/body pair the model produced
//! - [`ArticleDraft`]: what the publisher stores
//! - [`NewCategory`] / [`NewPost`]: rows written inside a publish transaction
//! - [`PublishedPost`]: what a successful publish reports back

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A news topic waiting to be expanded into an article.
///
/// Topics are transient: they are produced by one of the sources in
/// [`crate::topics`] and consumed once by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Topic {
    /// The headline the article is written about.
    pub headline: String,
    /// Extra context for the model. Sources without a summary repeat the headline.
    pub summary: String,
    /// Optional image URL carried through to the stored post.
    pub image: Option<String>,
}

impl Topic {
    /// A topic whose summary is its own headline.
    pub fn from_headline(headline: impl Into<String>) -> Self {
        let headline = headline.into();
        Self {
            summary: headline.clone(),
            headline,
            image: None,
        }
    }
}

/// Article text produced by the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArticle {
    pub title: String,
    /// HTML fragment, usually a sequence of `<p>` elements.
    pub body: String,
}

/// An article ready to be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    pub image: Option<String>,
}

/// A category row about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// A post row about to be inserted. `created_at` doubles as `updatedAt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub author: String,
    pub image: Option<String>,
    pub category_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// The outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub category_id: Uuid,
}
