//! Topics invented by the model.
//!
//! The model is asked for a numbered list of headlines; every line shaped
//! like `N. Headline` becomes a topic whose summary is its own headline.

use crate::llm::{ChatMessage, Complete, CompletionRequest, GenerationError};
use crate::models::Topic;
use tracing::{info, instrument, warn};

/// How many headlines to ask for.
pub const TOPIC_COUNT: usize = 25;

const TOPIC_TEMPERATURE: f32 = 0.7;
const TOPIC_MAX_TOKENS: u32 = 1024;

const TOPIC_INSTRUCTION: &str = "You are a news editor specializing in Indian politics. \
Generate {count} unique, realistic, and current political news headlines for India. \
Focus on current events, elections, government policies, international relations, and political developments. \
Ensure all titles are distinct and not repeated. Provide them as a numbered list from 1 to {count}.";

/// Ask the model for `count` headlines.
#[instrument(level = "info", skip_all, fields(count = count))]
pub async fn generate<C: Complete>(client: &C, count: usize) -> Result<Vec<Topic>, GenerationError> {
    let request = CompletionRequest {
        messages: vec![
            ChatMessage::system(TOPIC_INSTRUCTION.replace("{count}", &count.to_string())),
            ChatMessage::user(format!(
                "Generate {count} unique political news headlines for India."
            )),
        ],
        temperature: TOPIC_TEMPERATURE,
        max_tokens: TOPIC_MAX_TOKENS,
    };

    info!("Generating topics");
    let text = client.complete(&request).await?;
    let headlines = parse_numbered_list(&text, count);

    if headlines.len() < count {
        warn!(got = headlines.len(), wanted = count, "Model returned fewer topics than requested");
    } else {
        info!(count = headlines.len(), "Generated topics");
    }
    Ok(headlines.into_iter().map(Topic::from_headline).collect())
}

/// Pull headlines out of `1. Foo` / `2. Bar` lines, keeping at most `max`.
pub fn parse_numbered_list(text: &str, max: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with(|c: char| c.is_ascii_digit()))
        .filter_map(|line| line.split_once(". "))
        .map(|(_, title)| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .take(max)
        .collect()
}
