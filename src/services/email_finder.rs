use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::resilience::{retry_with_backoff, ApiCache, RetryPolicy};
use crate::services::collaborators::{ContactFinder, PageFetcher};

const CONTACT_PATHS: &[&str] = &[
    "/contact",
    "/contact-us",
    "/about/contact",
    "/about-us/contact",
    "/support",
    "/help",
    "/team",
    "/about",
    "/company",
    "/imprint",
];

const CONTACT_KEYWORDS: &[&str] = &["contact", "team", "about us", "about", "support", "help"];

/// Role-based addresses worth preferring over personal ones.
const PRIORITY_PREFIXES: &[&str] = &[
    "contact@", "info@", "hello@", "sales@", "support@", "office@", "admin@",
];

const MAX_CONTACT_PAGES: usize = 3;

/// Finds a contact address by scraping the company's own pages: homepage
/// first, then up to three contact-ish pages on the same domain.
pub struct ScrapingEmailFinder {
    fetcher: Arc<dyn PageFetcher>,
    cache: ApiCache<String>,
    retry: RetryPolicy,
}

impl ScrapingEmailFinder {
    pub fn new(fetcher: Arc<dyn PageFetcher>, cache_ttl: Duration, retry: RetryPolicy) -> Self {
        ScrapingEmailFinder {
            fetcher,
            cache: ApiCache::new(cache_ttl),
            retry,
        }
    }

    async fn fetch_html(&self, url: &str) -> anyhow::Result<Option<String>> {
        let page = retry_with_backoff(self.retry, "contact page fetch", || async {
            self.fetcher.fetch(url).await
        })
        .await?;
        if !page.is_success() || !page.is_html() {
            log::debug!(
                "Skipping {} for email discovery (status {}, content type '{}')",
                url,
                page.status,
                page.content_type
            );
            return Ok(None);
        }
        Ok(Some(page.body))
    }
}

#[async_trait]
impl ContactFinder for ScrapingEmailFinder {
    async fn find_email(&self, website: &str) -> anyhow::Result<String> {
        let homepage = ensure_scheme(website);
        let domain = extract_domain(&homepage);
        let key = ApiCache::<String>::key("find_email", &[&domain]);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let Some(body) = self.fetch_html(&homepage).await? else {
            return Ok(String::new());
        };
        let (mut emails, contact_links) = harvest_page(&body, &homepage, &domain);

        // A role-based address on the homepage is good enough to stop early.
        if let Some(best) = best_email(&emails) {
            if PRIORITY_PREFIXES.iter().any(|p| best.starts_with(p)) {
                self.cache.set(&key, best.clone());
                return Ok(best);
            }
        }

        for link in contact_links.into_iter().take(MAX_CONTACT_PAGES) {
            let jitter_ms = rand::thread_rng().gen_range(1000..2000);
            tokio::time::sleep(Duration::from_millis(jitter_ms)).await;

            match self.fetch_html(&link).await {
                Ok(Some(body)) => {
                    let (more, _) = harvest_page(&body, &link, &domain);
                    emails.extend(more);
                }
                Ok(None) => {}
                Err(e) => log::warn!("Error fetching contact page {}: {:#}", link, e),
            }
        }

        let found = best_email(&emails).unwrap_or_default();
        self.cache.set(&key, found.clone());
        Ok(found)
    }
}

fn ensure_scheme(website: &str) -> String {
    if website.starts_with("http://") || website.starts_with("https://") {
        website.to_string()
    } else {
        format!("https://{website}")
    }
}

fn extract_domain(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or("").to_lowercase();
            host.strip_prefix("www.").unwrap_or(&host).to_string()
        }
        Err(_) => url.to_lowercase(),
    }
}

/// Extracts candidate emails and same-domain contact-page links from one
/// page. Pure function over the markup so the document never crosses an
/// await point.
fn harvest_page(html: &str, page_url: &str, domain: &str) -> (Vec<String>, Vec<String>) {
    let document = Html::parse_document(html);
    let a_selector = Selector::parse("a[href]").unwrap();

    let mut emails: Vec<String> = Vec::new();
    let mut push_email = |email: String| {
        let email = email.to_lowercase();
        if is_valid_email(&email) && !emails.contains(&email) {
            emails.push(email);
        }
    };

    for link in document.select(&a_selector) {
        if let Some(address) = link
            .value()
            .attr("href")
            .and_then(|href| href.strip_prefix("mailto:"))
        {
            let address = address.split('?').next().unwrap_or("").trim();
            push_email(address.to_string());
        }
    }

    let text: String = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");

    let email_re = Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap();
    for m in email_re.find_iter(&text) {
        push_email(m.as_str().to_string());
    }

    // Obfuscated "name [at] domain [dot] com" writing.
    let obfuscated_re = Regex::new(
        r"([a-zA-Z0-9._%+-]+)\s*[\[({]at[\])}]\s*([a-zA-Z0-9.-]+)\s*[\[({]dot[\])}]\s*([a-zA-Z]{2,})",
    )
    .unwrap();
    for caps in obfuscated_re.captures_iter(&text) {
        push_email(format!("{}@{}.{}", &caps[1], &caps[2], &caps[3]));
    }

    let mut contact_links: Vec<String> = Vec::new();
    let base = Url::parse(page_url).ok();
    for link in document.select(&a_selector) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if href.is_empty() || href == "#" {
            continue;
        }
        if href.starts_with("javascript:") || href.starts_with("mailto:") || href.starts_with("tel:")
        {
            continue;
        }
        let Some(absolute) = base.as_ref().and_then(|b| b.join(href).ok()) else {
            continue;
        };
        if extract_domain(absolute.as_str()) != domain {
            continue;
        }
        let path = absolute.path().to_lowercase();
        let link_text = link.text().collect::<String>().trim().to_lowercase();
        let path_match = CONTACT_PATHS.iter().any(|p| path.contains(p));
        let text_match = CONTACT_KEYWORDS.iter().any(|k| link_text.contains(k));
        if (path_match || text_match) && !contact_links.contains(&absolute.to_string()) {
            contact_links.push(absolute.to_string());
        }
    }

    (emails, contact_links)
}

fn is_valid_email(email: &str) -> bool {
    let shape_re = Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    if !shape_re.is_match(email) {
        return false;
    }
    const FALSE_POSITIVES: &[&str] = &[
        "example.",
        "yourname@",
        "your@",
        "user@",
        "test@",
        "sample@",
        "domain.com",
        "wixpress.com",
        "wordpress.com",
        "sentry.io",
        "localhost",
        "mysite.com",
    ];
    let lowered = email.to_lowercase();
    if FALSE_POSITIVES.iter().any(|p| lowered.contains(p)) {
        return false;
    }
    if email.len() < 6 || email.len() > 64 || email.matches('@').count() != 1 {
        return false;
    }
    true
}

fn best_email(emails: &[String]) -> Option<String> {
    for prefix in PRIORITY_PREFIXES {
        if let Some(email) = emails.iter().find(|e| e.starts_with(prefix)) {
            return Some(email.clone());
        }
    }
    emails.first().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::collaborators::FetchedPage;

    #[test]
    fn valid_emails_pass_and_placeholders_fail() {
        assert!(is_valid_email("info@acmemillwork.com"));
        assert!(is_valid_email("jane.doe@acme.co"));
        assert!(!is_valid_email("test@acme.com"));
        assert!(!is_valid_email("someone@example.com"));
        assert!(!is_valid_email("noreply@sentry.io"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b.c"));
    }

    #[test]
    fn best_email_prefers_role_addresses() {
        let emails = vec![
            "jane@acme.com".to_string(),
            "info@acme.com".to_string(),
            "bob@acme.com".to_string(),
        ];
        assert_eq!(best_email(&emails).unwrap(), "info@acme.com");
        assert_eq!(
            best_email(&["jane@acme.com".to_string()]).unwrap(),
            "jane@acme.com"
        );
        assert!(best_email(&[]).is_none());
    }

    #[test]
    fn harvest_collects_mailto_text_and_obfuscated_emails() {
        let html = r#"
            <html><body>
              <a href="mailto:info@acme.com?subject=Hi">Email us</a>
              <p>Reach sales@acme.com or jane [at] acme [dot] com</p>
              <a href="/contact-us">Contact</a>
              <a href="https://twitter.com/acme">Twitter</a>
            </body></html>"#;
        let (emails, links) = harvest_page(html, "https://acme.com/", "acme.com");
        assert!(emails.contains(&"info@acme.com".to_string()));
        assert!(emails.contains(&"sales@acme.com".to_string()));
        assert!(emails.contains(&"jane@acme.com".to_string()));
        assert_eq!(links, vec!["https://acme.com/contact-us"]);
    }

    struct CannedFetcher {
        body: String,
    }

    #[async_trait]
    impl PageFetcher for CannedFetcher {
        async fn fetch(&self, _url: &str) -> anyhow::Result<FetchedPage> {
            Ok(FetchedPage {
                status: 200,
                content_type: "text/html; charset=utf-8".to_string(),
                body: self.body.clone(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn finds_role_address_on_homepage_without_crawling() {
        let fetcher = Arc::new(CannedFetcher {
            body: r#"<a href="mailto:contact@acme.com">mail</a>"#.to_string(),
        });
        let finder =
            ScrapingEmailFinder::new(fetcher, Duration::from_secs(3600), RetryPolicy::default());
        let email = finder.find_email("acme.com").await.unwrap();
        assert_eq!(email, "contact@acme.com");
    }

    #[tokio::test(start_paused = true)]
    async fn non_html_page_yields_empty_result() {
        struct PdfFetcher;
        #[async_trait]
        impl PageFetcher for PdfFetcher {
            async fn fetch(&self, _url: &str) -> anyhow::Result<FetchedPage> {
                Ok(FetchedPage {
                    status: 200,
                    content_type: "application/pdf".to_string(),
                    body: String::new(),
                })
            }
        }
        let finder = ScrapingEmailFinder::new(
            Arc::new(PdfFetcher),
            Duration::from_secs(3600),
            RetryPolicy::default(),
        );
        assert_eq!(finder.find_email("https://acme.com").await.unwrap(), "");
    }
}
