//! Turns one source URL into zero or more candidate records. The text
//! cascade over the collaborator's output comes first; only when it yields
//! nothing is the page fetched directly and handed to the structural
//! fallback extractor.

use crate::domain::lead::CandidateRecord;
use crate::domain::profile::ClientProfile;
use crate::parsing::{extract_companies_from_html, parse_company_list};
use crate::pipeline::tasks::{self, RESEARCH_ROLE};
use crate::services::collaborators::{PageFetcher, TextCompletion};

pub async fn extract_candidates(
    completion: &dyn TextCompletion,
    fetcher: &dyn PageFetcher,
    profile: &ClientProfile,
    url: &str,
) -> Vec<CandidateRecord> {
    let task = tasks::extraction_task(profile, url);
    let candidates = match completion.complete(RESEARCH_ROLE, &task, None).await {
        Ok(text) => parse_company_list(&text),
        Err(e) => {
            log::warn!("Extraction completion failed for {}: {:#}", url, e);
            Vec::new()
        }
    };
    if !candidates.is_empty() {
        log::info!("Extracted {} candidates from {}", candidates.len(), url);
        return candidates;
    }

    log::info!("Text extraction empty for {}, trying structural fallback", url);
    structural_fallback(fetcher, url).await
}

/// Fetch guarded by status and content type. Any failure degrades to zero
/// candidates for this URL.
async fn structural_fallback(fetcher: &dyn PageFetcher, url: &str) -> Vec<CandidateRecord> {
    match fetcher.fetch(url).await {
        Ok(page) if page.is_success() && page.is_html() => {
            let candidates = extract_companies_from_html(&page.body);
            log::info!(
                "Structural fallback found {} candidates on {}",
                candidates.len(),
                url
            );
            candidates
        }
        Ok(page) => {
            log::warn!(
                "Fallback fetch of {} unusable (status {}, content type '{}')",
                url,
                page.status,
                page.content_type
            );
            Vec::new()
        }
        Err(e) => {
            log::warn!("Fallback fetch of {} failed: {:#}", url, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::test_fixtures::profile_with_segments;
    use crate::services::collaborators::FetchedPage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedCompletion {
        text: String,
    }

    #[async_trait]
    impl TextCompletion for FixedCompletion {
        async fn complete(
            &self,
            _role: &str,
            _task: &str,
            _context: Option<&str>,
        ) -> anyhow::Result<String> {
            Ok(self.text.clone())
        }
    }

    struct CountingFetcher {
        page: FetchedPage,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageFetcher for CountingFetcher {
        async fn fetch(&self, _url: &str) -> anyhow::Result<FetchedPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchedPage {
                status: self.page.status,
                content_type: self.page.content_type.clone(),
                body: self.page.body.clone(),
            })
        }
    }

    fn html_page(body: &str) -> FetchedPage {
        FetchedPage {
            status: 200,
            content_type: "text/html; charset=utf-8".to_string(),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn parseable_completion_output_skips_the_fetch() {
        let completion = FixedCompletion {
            text: r#"[{"name":"Acme Corp","website":"https://acme.com"}]"#.to_string(),
        };
        let fetcher = CountingFetcher {
            page: html_page(""),
            calls: AtomicUsize::new(0),
        };
        let profile = profile_with_segments(&["Millwork Shops"]);
        let candidates =
            extract_candidates(&completion, &fetcher, &profile, "https://source.com").await;
        assert_eq!(
            candidates,
            vec![CandidateRecord {
                name: "Acme Corp".to_string(),
                website: "https://acme.com".to_string(),
            }]
        );
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unparseable_output_falls_back_to_table_rows() {
        let completion = FixedCompletion {
            text: "I could not find any structured company information on this page.".to_string(),
        };
        let fetcher = CountingFetcher {
            page: html_page(
                r#"<table class="wikitable">
                     <tr><td>1</td><td>Acme Corp</td><td>Baltimore, MD</td></tr>
                   </table>"#,
            ),
            calls: AtomicUsize::new(0),
        };
        let profile = profile_with_segments(&["Millwork Shops"]);
        let candidates =
            extract_candidates(&completion, &fetcher, &profile, "https://source.com").await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            candidates,
            vec![CandidateRecord {
                name: "Acme Corp".to_string(),
                website: String::new(),
            }]
        );
    }

    #[tokio::test]
    async fn non_html_fallback_degrades_to_zero_candidates() {
        let completion = FixedCompletion {
            text: "no companies here".to_string(),
        };
        let fetcher = CountingFetcher {
            page: FetchedPage {
                status: 200,
                content_type: "application/pdf".to_string(),
                body: String::new(),
            },
            calls: AtomicUsize::new(0),
        };
        let profile = profile_with_segments(&["Millwork Shops"]);
        let candidates =
            extract_candidates(&completion, &fetcher, &profile, "https://source.com/x.pdf").await;
        assert!(candidates.is_empty());
    }
}
