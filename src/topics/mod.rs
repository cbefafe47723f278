//! Topic sources.
//!
//! Each source produces a list of [`Topic`]s; the pipeline does not care
//! which one ran.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Fixed | [`fixed`] | built-in list | no network |
//! | File | [`fixed`] | one headline per line | `#` comments and blank lines skipped |
//! | Generated | [`generated`] | completion API | numbered list of 25 headlines |
//! | News | [`news`] | news search API | needs `--query` and `NEWS_API_KEY` |
//!
//! Whatever the source, headlines are de-duplicated (ignoring case) and the
//! list is cut to `--limit` when one is given.

pub mod fixed;
pub mod generated;
pub mod news;

use crate::config::TopicSettings;
use crate::llm::{Complete, GenerationError};
use crate::models::Topic;
use clap::ValueEnum;
use itertools::Itertools;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, instrument};

/// Where topics come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TopicSource {
    /// The built-in headline list
    Fixed,
    /// A headline file (`--topics-file`)
    File,
    /// Headlines invented by the model
    Generated,
    /// Results of a news search (`--query`)
    News,
}

/// Failure to produce any topics.
#[derive(Debug, Error)]
pub enum TopicError {
    #[error("failed to read topics file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to generate topics: {0}")]
    Generation(#[from] GenerationError),

    #[error("news search returned HTTP {status}: {detail}")]
    NewsStatus { status: u16, detail: String },

    #[error("news search request failed: {0}")]
    NewsTransport(#[from] reqwest::Error),

    #[error("malformed news search response: {0}")]
    NewsMalformed(String),

    #[error("news search needs a query and an API key")]
    NewsNotConfigured,

    #[error("file source needs a topics file")]
    FileNotConfigured,
}

/// Load topics from the configured source.
///
/// # Arguments
///
/// * `settings` - Source selection and its parameters
/// * `client` - Completion client, used only by the generated source
#[instrument(level = "info", skip_all, fields(source = ?settings.source))]
pub async fn load<C: Complete>(
    settings: &TopicSettings,
    client: &C,
) -> Result<Vec<Topic>, TopicError> {
    let topics = match settings.source {
        TopicSource::Fixed => fixed::builtin(),
        TopicSource::File => {
            let path = settings.file.as_ref().ok_or(TopicError::FileNotConfigured)?;
            fixed::from_file(path).await?
        }
        TopicSource::Generated => generated::generate(client, generated::TOPIC_COUNT).await?,
        TopicSource::News => {
            let (Some(query), Some(key)) = (&settings.query, &settings.news_api_key) else {
                return Err(TopicError::NewsNotConfigured);
            };
            news::NewsClient::new(&settings.news_api_url, key)?
                .search(query)
                .await?
        }
    };

    let topics = finalize(topics, settings.limit);
    info!(count = topics.len(), "Loaded topics");
    Ok(topics)
}

/// Drop blank and repeated headlines, then apply the limit.
pub fn finalize(topics: Vec<Topic>, limit: Option<usize>) -> Vec<Topic> {
    topics
        .into_iter()
        .filter(|t| !t.headline.trim().is_empty())
        .unique_by(|t| t.headline.trim().to_lowercase())
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}
