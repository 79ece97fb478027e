//! Drives the segment -> URL -> candidate loops, applies run-scoped
//! deduplication and validity filtering, and always hands the caller a
//! well-formed outcome.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::domain::lead::{filter_valid_leads, is_generic_name, normalize_website, LeadRecord};
use crate::domain::profile::{ClientProfile, SegmentProfile};
use crate::pipeline::{enrichment, extraction, search};
use crate::resilience::ErrorCollection;
use crate::services::collaborators::{ContactFinder, PageFetcher, TextCompletion, WebSearch};

/// What a run hands back. Callers branch on the variant instead of
/// inspecting a list-or-map payload.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RunOutcome {
    Leads(Vec<LeadRecord>),
    Empty { message: String },
    Failed { error: String, details: String },
}

pub struct Pipeline {
    completion: Arc<dyn TextCompletion>,
    analyzer: Option<Arc<dyn TextCompletion>>,
    web_search: Arc<dyn WebSearch>,
    fetcher: Arc<dyn PageFetcher>,
    contacts: Arc<dyn ContactFinder>,
    profile: ClientProfile,
    max_urls_per_segment: usize,
    courtesy_delay: Duration,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        completion: Arc<dyn TextCompletion>,
        analyzer: Option<Arc<dyn TextCompletion>>,
        web_search: Arc<dyn WebSearch>,
        fetcher: Arc<dyn PageFetcher>,
        contacts: Arc<dyn ContactFinder>,
        profile: ClientProfile,
        max_urls_per_segment: usize,
        courtesy_delay: Duration,
    ) -> Self {
        Pipeline {
            completion,
            analyzer,
            web_search,
            fetcher,
            contacts,
            profile,
            max_urls_per_segment,
            courtesy_delay,
        }
    }

    fn select_segments(&self, selected: &Option<Vec<String>>) -> Vec<&SegmentProfile> {
        match selected {
            Some(names) if !names.is_empty() => self
                .profile
                .target_segments
                .iter()
                .filter(|segment| names.contains(&segment.name))
                .collect(),
            _ => self.profile.target_segments.iter().collect(),
        }
    }

    /// Runs the whole pipeline for the selected segments (all segments when
    /// `selected` is None or empty).
    pub async fn run(&self, selected: Option<Vec<String>>) -> RunOutcome {
        log::info!("Starting lead generation | segments={:?}", selected);

        let mut run_errors = ErrorCollection::new();

        let Some(analyzer) = self.analyzer.as_deref() else {
            run_errors.add(
                "Collaborator setup",
                "CapabilityError",
                "no analysis collaborator configured for this run",
                true,
            );
            return RunOutcome::Failed {
                error: "Analysis capability unavailable".to_string(),
                details: run_errors.summary(),
            };
        };

        let segments = self.select_segments(&selected);
        if segments.is_empty() {
            log::warn!("None of the selected segments exist: {:?}", selected);
            return RunOutcome::Empty {
                message: "No valid segments selected or found.".to_string(),
            };
        }

        let mut processed_websites: HashSet<String> = HashSet::new();
        let mut leads: Vec<LeadRecord> = Vec::new();

        for segment in segments {
            log::info!(">>> Segment: {}", segment.name);

            let urls = search::find_source_urls(
                self.completion.as_ref(),
                self.web_search.as_ref(),
                &self.profile,
                segment,
            )
            .await;
            if urls.is_empty() {
                log::info!("No source URLs found for segment '{}'", segment.name);
                run_errors.add(
                    &format!("Search for segment '{}'", segment.name),
                    "SearchError",
                    "no candidate source URLs",
                    false,
                );
                continue;
            }

            for url in urls.iter().take(self.max_urls_per_segment) {
                log::info!("Processing source {}", url);
                let candidates = extraction::extract_candidates(
                    self.completion.as_ref(),
                    self.fetcher.as_ref(),
                    &self.profile,
                    url,
                )
                .await;
                if candidates.is_empty() {
                    run_errors.add(
                        &format!("Extraction from {url}"),
                        "ExtractionError",
                        "no candidates recovered",
                        false,
                    );
                    continue;
                }

                for candidate in candidates {
                    if candidate.name.trim().is_empty() || candidate.website.is_empty() {
                        log::debug!("Skipping candidate with missing fields: {:?}", candidate);
                        continue;
                    }
                    if is_generic_name(&candidate.name) {
                        log::debug!("Skipping generic candidate name '{}'", candidate.name);
                        continue;
                    }
                    let normalized = normalize_website(&candidate.website);
                    if !processed_websites.insert(normalized) {
                        log::debug!("Skipping duplicate website '{}'", candidate.website);
                        continue;
                    }

                    let lead = enrichment::enrich_candidate(
                        Some(analyzer),
                        self.contacts.as_ref(),
                        &self.profile,
                        segment,
                        &candidate,
                        url,
                    )
                    .await;
                    leads.push(lead);

                    tokio::time::sleep(self.courtesy_delay).await;
                }
            }

            if run_errors.has_fatal_errors() {
                log::error!("Fatal error mid-run, aborting after segment '{}'", segment.name);
                return RunOutcome::Failed {
                    error: "Run aborted on fatal error".to_string(),
                    details: run_errors.summary(),
                };
            }
        }

        if run_errors.has_errors() {
            log::warn!("{}", run_errors.summary());
        }

        let leads = filter_valid_leads(leads);
        if leads.is_empty() {
            log::info!("Pipeline finished but no leads extracted");
            return RunOutcome::Empty {
                message: "No leads found.".to_string(),
            };
        }
        log::info!("Pipeline done, {} leads", leads.len());
        RunOutcome::Leads(leads)
    }
}
