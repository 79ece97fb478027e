use std::time::Duration;

use async_trait::async_trait;
use fake_user_agent::get_rua;

use crate::services::collaborators::{FetchedPage, PageFetcher};

/// Plain reqwest GET with a browser-like header set, to reduce
/// block-on-sight behavior by target servers.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()?;
        Ok(HttpPageFetcher { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, get_rua())
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .header(reqwest::header::REFERER, "https://www.google.com/")
            .header("DNT", "1")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();
        let body = response.text().await?;

        log::debug!("Fetched {} ({}, {} bytes)", url, status, body.len());
        Ok(FetchedPage {
            status,
            content_type,
            body,
        })
    }
}
