//! Per-candidate enrichment: contact discovery, pain-point generation, and
//! an optional review pass. The state machine is terminal in all cases;
//! transient network errors are retried inside the collaborators, never
//! here.

use std::fmt;

use crate::domain::lead::{CandidateRecord, LeadRecord};
use crate::domain::profile::{ClientProfile, SegmentProfile};
use crate::parsing::{is_failure_narrative, parse_analysis};
use crate::pipeline::tasks::{self, ANALYST_ROLE, REVIEWER_ROLE};
use crate::services::collaborators::{ContactFinder, TextCompletion};

/// Terminal state of one candidate's pass, carried into the lead's
/// `category` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentState {
    Analyzed,
    Reviewed,
    AnalysisFailed,
}

impl fmt::Display for EnrichmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EnrichmentState::Analyzed => "ANALYZED",
            EnrichmentState::Reviewed => "REVIEWED",
            EnrichmentState::AnalysisFailed => "ANALYSIS_FAILED",
        };
        write!(f, "{label}")
    }
}

/// Runs the `PENDING -> ANALYZED -> {REVIEWED | ANALYSIS_FAILED}` machine
/// for one candidate. Always returns a lead; internal errors become a
/// placeholder record with a segment-qualified failure narrative and an
/// empty contact email.
pub async fn enrich_candidate(
    analyzer: Option<&dyn TextCompletion>,
    contacts: &dyn ContactFinder,
    profile: &ClientProfile,
    segment: &SegmentProfile,
    candidate: &CandidateRecord,
    source_url: &str,
) -> LeadRecord {
    let Some(analyzer) = analyzer else {
        log::warn!(
            "No analysis collaborator for segment '{}', marking '{}' as failed",
            segment.name,
            candidate.name
        );
        return lead(
            candidate,
            segment,
            source_url,
            String::new(),
            format!(
                "Analysis skipped: no analysis collaborator available for segment '{}'",
                segment.name
            ),
            EnrichmentState::AnalysisFailed,
        );
    };

    match analyze_and_review(analyzer, contacts, profile, segment, candidate).await {
        Ok((email, pain_points, state)) => {
            lead(candidate, segment, source_url, email, pain_points, state)
        }
        Err(e) => {
            log::error!(
                "Enrichment failed for '{}' (segment '{}'): {:#}",
                candidate.name,
                segment.name,
                e
            );
            lead(
                candidate,
                segment,
                source_url,
                String::new(),
                format!(
                    "Analysis failed for segment '{}': enrichment error",
                    segment.name
                ),
                EnrichmentState::AnalysisFailed,
            )
        }
    }
}

async fn analyze_and_review(
    analyzer: &dyn TextCompletion,
    contacts: &dyn ContactFinder,
    profile: &ClientProfile,
    segment: &SegmentProfile,
    candidate: &CandidateRecord,
) -> anyhow::Result<(String, String, EnrichmentState)> {
    let discovered = if candidate.website.is_empty() {
        String::new()
    } else {
        contacts.find_email(&candidate.website).await?
    };

    let task = tasks::analysis_task(profile, segment, candidate);
    let raw = analyzer.complete(ANALYST_ROLE, &task, None).await?;
    let analysis = parse_analysis(&raw);

    // Scraped addresses beat whatever the collaborator wrote into its reply.
    let email = if discovered.is_empty() {
        analysis.email
    } else {
        discovered
    };
    let mut pain_points = analysis.pain_points;
    let mut state = EnrichmentState::Analyzed;

    if !segment.enable_review {
        log::debug!(
            "Review disabled for segment '{}', keeping analyzed pain points",
            segment.name
        );
        return Ok((email, pain_points, state));
    }
    if is_failure_narrative(&pain_points) {
        log::debug!(
            "Pain points for '{}' are a failure narrative, skipping review",
            candidate.name
        );
        return Ok((email, pain_points, state));
    }

    let review = tasks::review_task(profile, segment, candidate, &pain_points);
    let reviewed = analyzer
        .complete(REVIEWER_ROLE, &review, Some(&pain_points))
        .await?;
    let reviewed = reviewed.trim();
    if reviewed.is_empty() || is_failure_narrative(reviewed) {
        log::warn!(
            "Review pass for '{}' returned nothing usable, keeping analyzed points",
            candidate.name
        );
    } else if reviewed == pain_points {
        log::info!("Review validated pain points for '{}' unchanged", candidate.name);
        state = EnrichmentState::Reviewed;
    } else {
        pain_points = reviewed.to_string();
        state = EnrichmentState::Reviewed;
    }

    Ok((email, pain_points, state))
}

fn lead(
    candidate: &CandidateRecord,
    segment: &SegmentProfile,
    source_url: &str,
    contact_email: String,
    pain_points: String,
    state: EnrichmentState,
) -> LeadRecord {
    LeadRecord {
        name: candidate.name.clone(),
        website: candidate.website.clone(),
        contact_email,
        pain_points,
        source_url: source_url.to_string(),
        segment_name: segment.name.clone(),
        category: state.to_string(),
    }
}
