//! Article generation: topic in, title and HTML body out.
//!
//! One completion request per topic, no retries. The model is asked for a
//! ~400 word article in `<p>` markup; whether it also wrote its own title is
//! decided afterwards by [`split_title_and_body`].

use crate::llm::{ChatMessage, Complete, CompletionRequest, GenerationError};
use crate::models::GeneratedArticle;
use crate::text::{clean_text, truncate_for_log};
use tracing::{debug, info, instrument};

/// Built-in editorial directive used when no `--style-file` is given.
pub const DEFAULT_STYLE: &str = "You are a seasoned journalist writing for a national news platform. \
Craft a compelling 400-word news article from the headline and summary you are given. \
Lead with the most newsworthy fact, attribute claims to official sources and named experts, \
and give opposing viewpoints a fair hearing. \
Maintain factual accuracy and a clear, confident tone. \
Format the article in clean <p> HTML tags for web display. \
Don't write the word count at the end of the article.";

const ARTICLE_TEMPERATURE: f32 = 0.3;
const ARTICLE_MAX_TOKENS: u32 = 1024;

/// A first line at least this long is treated as body text, not a title.
const MAX_TITLE_CHARS: usize = 100;

/// Expands topics into articles through a [`Complete`] implementation.
#[derive(Debug)]
pub struct ArticleGenerator<C> {
    client: C,
    style: String,
}

impl<C: Complete> ArticleGenerator<C> {
    pub fn new(client: C, style: impl Into<String>) -> Self {
        Self {
            client,
            style: style.into(),
        }
    }

    /// Generate an article for one topic.
    ///
    /// # Arguments
    ///
    /// * `headline` - Cleaned topic headline, embedded verbatim in the prompt
    /// * `summary` - Cleaned topic summary, embedded verbatim in the prompt
    ///
    /// # Returns
    ///
    /// The title/body pair, or the [`GenerationError`] from the single attempt.
    #[instrument(level = "info", skip_all, fields(headline = %truncate_for_log(headline, 50)))]
    pub async fn generate(
        &self,
        headline: &str,
        summary: &str,
    ) -> Result<GeneratedArticle, GenerationError> {
        let request = self.article_request(headline, summary);
        info!("Generating article content");

        let completion = self.client.complete(&request).await?;
        let article = split_title_and_body(&completion, headline);
        debug!(
            title = %article.title,
            body_bytes = article.body.len(),
            model_title = article.title != headline,
            "Parsed completion"
        );
        Ok(article)
    }

    #[cfg(test)]
    pub fn client(&self) -> &C {
        &self.client
    }

    fn article_request(&self, headline: &str, summary: &str) -> CompletionRequest {
        let user_prompt = format!(
            "Please generate a news article based on the following:\n\n\
             Original Headline: {headline}\n\
             Data Summary: {summary}\n"
        );
        CompletionRequest {
            messages: vec![
                ChatMessage::system(self.style.clone()),
                ChatMessage::user(user_prompt),
            ],
            temperature: ARTICLE_TEMPERATURE,
            max_tokens: ARTICLE_MAX_TOKENS,
        }
    }
}

/// Decide whether the model wrote its own title.
///
/// The completion is trimmed and split on its first line break. When the
/// first line is shorter than 100 characters and, once cleaned and
/// lowercased, differs from the headline, it becomes the title and the rest
/// becomes the body. Otherwise the headline is kept and the whole completion
/// is the body.
///
/// This is a heuristic over free-form model output, not a format contract: a
/// short opening sentence with no title above it will be taken for a title.
pub fn split_title_and_body(completion: &str, headline: &str) -> GeneratedArticle {
    let full = completion.trim();

    if let Some((first, rest)) = full.split_once('\n') {
        let first = first.trim();
        let distinct = clean_text(first).to_lowercase() != clean_text(headline).to_lowercase();
        if first.chars().count() < MAX_TITLE_CHARS && distinct {
            return GeneratedArticle {
                title: first.to_string(),
                body: rest.trim().to_string(),
            };
        }
    }

    GeneratedArticle {
        title: headline.to_string(),
        body: full.to_string(),
    }
}
