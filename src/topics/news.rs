//! News search topic source.
//!
//! Queries a NewsAPI-compatible `everything` endpoint and turns each article
//! into a topic: title → headline, description → summary, `urlToImage` →
//! image.

use super::TopicError;
use crate::models::Topic;
use crate::text::truncate_for_log;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

const NEWS_LANGUAGE: &str = "en";
const NEWS_PAGE_SIZE: u32 = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Placeholder title NewsAPI uses for articles that were taken down.
const REMOVED_MARKER: &str = "[Removed]";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<NewsArticle>,
}

#[allow(non_snake_case)]
#[derive(Debug, Deserialize)]
struct NewsArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    source: Option<NewsSource>,
    urlToImage: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsSource {
    name: Option<String>,
}

/// Client for the news search endpoint.
#[derive(Debug)]
pub struct NewsClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl NewsClient {
    pub fn new(api_url: &str, api_key: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Search for `query` and convert the hits into topics.
    #[instrument(level = "info", skip_all, fields(query = %query))]
    pub async fn search(&self, query: &str) -> Result<Vec<Topic>, TopicError> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| TopicError::NewsMalformed(format!("bad endpoint {}: {e}", self.api_url)))?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("language", NEWS_LANGUAGE)
            .append_pair("pageSize", &NEWS_PAGE_SIZE.to_string())
            .append_pair("apiKey", &self.api_key);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or_else(|| truncate_for_log(&body, 200));
            warn!(status = status.as_u16(), %detail, "News search failed");
            return Err(TopicError::NewsStatus {
                status: status.as_u16(),
                detail,
            });
        }

        let parsed: SearchResponse = serde_json::from_str(&body)
            .map_err(|e| TopicError::NewsMalformed(e.to_string()))?;
        let topics = to_topics(parsed.articles);
        info!(count = topics.len(), "Fetched news topics");
        Ok(topics)
    }
}

fn to_topics(articles: Vec<NewsArticle>) -> Vec<Topic> {
    articles
        .into_iter()
        .filter_map(|article| {
            let headline = article.title?.trim().to_string();
            if headline.is_empty() || headline == REMOVED_MARKER {
                return None;
            }
            debug!(
                %headline,
                source = article.source.as_ref().and_then(|s| s.name.as_deref()).unwrap_or("unknown"),
                url = article.url.as_deref().unwrap_or(""),
                "News article"
            );
            let summary = article
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| headline.clone());
            Some(Topic {
                headline,
                summary,
                image: article.urlToImage.filter(|i| !i.is_empty()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_search_maps_articles_to_topics() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .and(query_param("q", "monsoon session"))
            .and(query_param("language", "en"))
            .and(query_param("pageSize", "100"))
            .and(query_param("apiKey", "news-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "articles": [
                    {
                        "title": "Monsoon Session Opens",
                        "description": "Lawmakers return to Delhi.",
                        "url": "https://example.com/a",
                        "source": {"name": "Example Times"},
                        "urlToImage": "https://example.com/a.jpg"
                    },
                    {"title": "[Removed]", "description": "[Removed]"},
                    {"title": "No Description", "description": null, "urlToImage": ""},
                    {"title": null}
                ]
            })))
            .mount(&server)
            .await;

        let client = NewsClient::new(&format!("{}/v2/everything", server.uri()), "news-key").unwrap();
        let topics = client.search("monsoon session").await.unwrap();

        assert_eq!(
            topics,
            [
                Topic {
                    headline: "Monsoon Session Opens".to_string(),
                    summary: "Lawmakers return to Delhi.".to_string(),
                    image: Some("https://example.com/a.jpg".to_string()),
                },
                Topic::from_headline("No Description"),
            ]
        );
    }

    #[tokio::test]
    async fn test_search_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "status": "error",
                "code": "apiKeyInvalid",
                "message": "Your API key is invalid."
            })))
            .mount(&server)
            .await;

        let client = NewsClient::new(&format!("{}/v2/everything", server.uri()), "bad").unwrap();
        match client.search("anything").await {
            Err(TopicError::NewsStatus { status, detail }) => {
                assert_eq!(status, 401);
                assert_eq!(detail, "Your API key is invalid.");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_search_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = NewsClient::new(&format!("{}/v2/everything", server.uri()), "k").unwrap();
        assert!(matches!(
            client.search("anything").await,
            Err(TopicError::NewsMalformed(_))
        ));
    }
}
