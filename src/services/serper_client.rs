use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::resilience::{retry_with_backoff, ApiCache, RetryPolicy};
use crate::services::collaborators::WebSearch;

#[derive(Serialize)]
struct SearchQuery {
    q: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

/// Serper-backed web search. Per-query responses are cached for the
/// configured TTL; only successful responses are cached.
pub struct SerperClient {
    client: reqwest::Client,
    api_key: String,
    url: String,
    cache: ApiCache<String>,
    retry: RetryPolicy,
}

impl SerperClient {
    pub fn new(
        api_key: String,
        timeout: Duration,
        cache_ttl: Duration,
        retry: RetryPolicy,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(SerperClient {
            client,
            api_key,
            url: "https://google.serper.dev/search".to_string(),
            cache: ApiCache::new(cache_ttl),
            retry,
        })
    }

    async fn search_one(&self, query: &str) -> anyhow::Result<String> {
        let key = ApiCache::<String>::key("serper_search", &[query]);
        if let Some(hit) = self.cache.get(&key) {
            log::debug!("Search cache hit for query: {}", query);
            return Ok(hit);
        }

        let text = retry_with_backoff(self.retry, "serper search", || {
            let q = query.to_string();
            async move {
                let response = self
                    .client
                    .post(&self.url)
                    .header("X-API-KEY", &self.api_key)
                    .json(&SearchQuery { q })
                    .send()
                    .await?
                    .error_for_status()?;
                let parsed: SearchResponse = response.json().await?;
                let lines: Vec<String> = parsed
                    .organic
                    .iter()
                    .filter(|r| !r.link.is_empty())
                    .map(|r| format!("- {}: {} | {}", r.title, r.link, r.snippet))
                    .collect();
                log::info!("Search returned {} organic results", lines.len());
                Ok(lines.join("\n"))
            }
        })
        .await?;

        self.cache.set(&key, text.clone());
        Ok(text)
    }
}

#[async_trait]
impl WebSearch for SerperClient {
    async fn search(&self, queries: &[String]) -> anyhow::Result<String> {
        let mut sections = Vec::with_capacity(queries.len());
        for query in queries {
            match self.search_one(query).await {
                Ok(text) => sections.push(text),
                // One bad query should not sink the whole batch.
                Err(e) => log::warn!("Search failed for query '{}': {:#}", query, e),
            }
        }
        if sections.is_empty() {
            anyhow::bail!("All {} search queries failed", queries.len());
        }
        Ok(sections.join("\n"))
    }
}
