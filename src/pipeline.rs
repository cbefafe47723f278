//! The per-topic loop.
//!
//! Topics are processed strictly one after another:
//!
//! 1. Clean the headline and summary
//! 2. Generate the article (one completion call)
//! 3. Clean the returned title
//! 4. Publish in one transaction
//!
//! A generation or storage failure is logged, recorded in the
//! [`RunSummary`], and the loop moves on. Only a fatal [`PublishError`]
//! (missing admin account) stops the run.

use crate::generator::ArticleGenerator;
use crate::llm::Complete;
use crate::models::{ArticleDraft, PublishedPost, Topic};
use crate::publisher::{PublishError, Publisher};
use crate::store::ContentStore;
use crate::text::{clean_text, truncate_for_log};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// A run stopped before its last topic.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("run aborted at topic {index}: {source}")]
    Fatal {
        index: usize,
        #[source]
        source: PublishError,
    },
}

/// Which step a topic failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Generation,
    Storage,
}

/// A topic that did not make it into the database.
#[derive(Debug, Clone, Serialize)]
pub struct TopicFailure {
    pub headline: String,
    pub stage: FailureStage,
    pub error: String,
}

/// Outcome of a whole run.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub published: Vec<PublishedPost>,
    pub failures: Vec<TopicFailure>,
}

impl RunSummary {
    /// Log the end-of-run tally, one line per post and per failure.
    pub fn log(&self) {
        info!(
            total = self.total,
            successful = self.published.len(),
            failed = self.failures.len(),
            "Generation summary"
        );
        for post in &self.published {
            info!(title = %post.title, slug = %post.slug, id = %post.id, "Published");
        }
        for failure in &self.failures {
            warn!(
                headline = %failure.headline,
                stage = ?failure.stage,
                error = %failure.error,
                "Failed"
            );
        }
    }
}

/// Generator and publisher wired together.
#[derive(Debug)]
pub struct Pipeline<C, S> {
    generator: ArticleGenerator<C>,
    publisher: Publisher<S>,
    delay: Duration,
}

impl<C: Complete, S: ContentStore> Pipeline<C, S> {
    pub fn new(generator: ArticleGenerator<C>, publisher: Publisher<S>, delay: Duration) -> Self {
        Self {
            generator,
            publisher,
            delay,
        }
    }

    /// Process every topic in order.
    ///
    /// # Returns
    ///
    /// The [`RunSummary`] once the last topic is done, or
    /// [`PipelineError::Fatal`] if the run had to stop early.
    #[instrument(level = "info", skip_all, fields(topics = topics.len()))]
    pub async fn run(&self, topics: &[Topic]) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary {
            total: topics.len(),
            ..Default::default()
        };
        info!("Starting article generation");

        for (i, topic) in topics.iter().enumerate() {
            info!(
                index = i + 1,
                of = topics.len(),
                topic = %truncate_for_log(&topic.headline, 60),
                "Processing topic"
            );

            match self.process(topic).await {
                Ok(post) => summary.published.push(post),
                Err(TopicOutcome::Failed(failure)) => summary.failures.push(failure),
                Err(TopicOutcome::Fatal(source)) => {
                    error!(index = i + 1, error = %source, "Fatal error; aborting run");
                    return Err(PipelineError::Fatal {
                        index: i + 1,
                        source,
                    });
                }
            }

            if !self.delay.is_zero() && i + 1 < topics.len() {
                tokio::time::sleep(self.delay).await;
            }
        }

        Ok(summary)
    }

    async fn process(&self, topic: &Topic) -> Result<PublishedPost, TopicOutcome> {
        let headline = clean_text(&topic.headline);
        let summary = clean_text(&topic.summary);

        let article = match self.generator.generate(&headline, &summary).await {
            Ok(article) => article,
            Err(e) => {
                warn!(
                    topic = %truncate_for_log(&headline, 60),
                    error = %e,
                    "Skipping database storage due to generation failure"
                );
                return Err(TopicOutcome::Failed(TopicFailure {
                    headline,
                    stage: FailureStage::Generation,
                    error: e.to_string(),
                }));
            }
        };

        let draft = ArticleDraft {
            title: clean_text(&article.title),
            content: article.body,
            image: topic.image.clone(),
        };

        match self.publisher.publish(&draft).await {
            Ok(post) => Ok(post),
            Err(e) if e.is_fatal() => Err(TopicOutcome::Fatal(e)),
            Err(e) => {
                error!(topic = %truncate_for_log(&headline, 60), error = %e, "Database error");
                Err(TopicOutcome::Failed(TopicFailure {
                    headline,
                    stage: FailureStage::Storage,
                    error: e.to_string(),
                }))
            }
        }
    }
}

enum TopicOutcome {
    Failed(TopicFailure),
    Fatal(PublishError),
}
