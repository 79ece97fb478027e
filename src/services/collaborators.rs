use async_trait::async_trait;

/// Generative text-completion collaborator. Takes an execution role, a
/// natural-language task description, and optional prior-task context;
/// returns free text. No output schema is enforced here; all structure is
/// recovered by the parsing cascade.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(
        &self,
        role: &str,
        task: &str,
        context: Option<&str>,
    ) -> anyhow::Result<String>;
}

/// Web search collaborator. Takes a list of query strings; returns free text
/// expected (not guaranteed) to enumerate URLs.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, queries: &[String]) -> anyhow::Result<String>;
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl FetchedPage {
    pub fn is_html(&self) -> bool {
        self.content_type.contains("text/html")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// GET a URL with a conventional browser-like header set. Raises only on
/// network-level failure; HTTP error statuses come back in the page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> anyhow::Result<FetchedPage>;
}

/// Best-guess contact address discovery for a company website. An empty
/// string means nothing plausible was found.
#[async_trait]
pub trait ContactFinder: Send + Sync {
    async fn find_email(&self, website: &str) -> anyhow::Result<String>;
}
