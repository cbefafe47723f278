//! Fixed topic lists: the built-in headlines and headline files.

use super::TopicError;
use crate::models::Topic;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Headlines used by `--source fixed`.
pub const STATIC_TOPICS: &[&str] = &[
    "PM Modi Meets Victims of Flood-Hit Districts",
    "Parliament Passes Landmark Digital Data Protection Bill",
    "India Wins Bid to Host 2036 Summit on Climate Finance",
    "RBI Holds Repo Rate Steady Amid Easing Inflation",
    "Monsoon Session Opens With Debate on Farm Reforms",
    "Election Commission Announces Dates for State Polls",
    "India and Japan Sign Semiconductor Cooperation Pact",
    "New Metro Lines Open in Three Cities",
];

/// The built-in list as topics. Each headline doubles as its summary.
pub fn builtin() -> Vec<Topic> {
    STATIC_TOPICS.iter().copied().map(Topic::from_headline).collect()
}

/// Read topics from a file with one headline per line.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn from_file(path: &Path) -> Result<Vec<Topic>, TopicError> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|source| TopicError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let topics = parse_headlines(&text);
    info!(count = topics.len(), "Read headlines from file");
    Ok(topics)
}

/// One topic per non-blank line; lines starting with `#` are comments.
pub fn parse_headlines(text: &str) -> Vec<Topic> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(Topic::from_headline)
        .collect()
}
