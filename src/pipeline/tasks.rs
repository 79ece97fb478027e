//! Instruction builders for the text-completion collaborator. Each builder
//! turns profile and segment data into a self-contained natural-language
//! task; all structure in the responses is recovered by the parsing cascade.

use crate::domain::lead::CandidateRecord;
use crate::domain::profile::{ClientProfile, SegmentProfile};

pub const RESEARCH_ROLE: &str =
    "You are a market research specialist who finds and extracts information about companies \
     from online sources.";

pub const ANALYST_ROLE: &str =
    "You are a business analyst who identifies concrete, segment-specific pain points that a \
     supplier's products can solve.";

pub const REVIEWER_ROLE: &str =
    "You are a senior lead qualification analyst who reviews and sharpens draft pain points \
     before they reach the sales team.";

/// Plan/execute instruction pair for one segment's search pass. Built once
/// per segment and consumed once.
pub struct SearchTaskSet {
    pub plan: String,
    pub execute: String,
}

pub fn search_tasks(profile: &ClientProfile, segment: &SegmentProfile) -> SearchTaskSet {
    let plan = format!(
        "Develop a list of 3-5 highly targeted search queries to find online sources \
         (articles, lists, directories, industry association member lists) that identify \
         companies fitting the profile of '{segment}'. These companies are potential clients \
         for {client}. Focus exclusively on companies headquartered and operating in the USA; \
         the geographic focus for this segment is {geo}. Example keywords to adapt: {keywords}. \
         Prioritize queries likely to surface sources listing multiple relevant companies.\n\
         Respond with ONLY a JSON array of query strings, nothing before or after it.",
        segment = segment.name,
        client = profile.client_name,
        geo = segment.geographic_focus,
        keywords = segment.search_keywords.join(", "),
    );
    let execute = format!(
        "Below are raw web search results gathered for the '{segment}' segment. Select the \
         most relevant sources for US-based companies in this segment, preferring pages that \
         list multiple companies, and discard results that are clearly off-segment or \
         non-US.\n\
         Your final output MUST be ONLY a list of unique URL strings, starting with '[' and \
         ending with ']', with no text before or after it. Provide up to 10 URLs.",
        segment = segment.name,
    );
    SearchTaskSet { plan, execute }
}

pub fn extraction_task(profile: &ClientProfile, url: &str) -> String {
    format!(
        "Analyze the content of the page at {url} and identify the companies it mentions. \
         These companies are potential leads for {client}. For each company, determine its \
         official name and primary website URL, extracting only factual information from the \
         page. Return ONLY a list of objects with 'name' and 'website' keys, for example: \
         [{{'name': 'Acme Corp', 'website': 'https://www.acme.com'}}]. Return an empty list \
         if no companies are found.",
        client = profile.client_name,
    )
}

pub fn analysis_task(
    profile: &ClientProfile,
    segment: &SegmentProfile,
    candidate: &CandidateRecord,
) -> String {
    format!(
        "Analyze the company '{name}' (website: {website}), a potential client for {client} \
         in the '{segment}' segment.\n\
         {client} key strengths: {strengths}.\n\
         This segment's likely needs: {focus}. Typical challenges in this segment: {hints}.\n\
         Identify exactly 3 to 5 specific, distinct business pain points or unmet needs for \
         '{name}' that {client} can directly solve. Avoid generic business advice; each point \
         must be a practical, operational, or quality-control problem that {client}'s \
         products and services address.\n\
         Format your response as:\n\
         Contact Email: <email found on their site, or 'Email not found.'>\n\
         Pain Points:\n\
         followed by the numbered list of 3-5 pain points.",
        name = candidate.name,
        website = candidate.website,
        client = profile.client_name,
        segment = segment.name,
        strengths = profile.strengths_summary(),
        focus = segment.product_focus,
        hints = segment.pain_hints_summary(),
    )
}

pub fn review_task(
    profile: &ClientProfile,
    segment: &SegmentProfile,
    candidate: &CandidateRecord,
    initial_pain_points: &str,
) -> String {
    let formatted: String = initial_pain_points
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| format!("  - {}\n", line.trim()))
        .collect();
    let formatted = if formatted.is_empty() {
        "  - No specific initial pain points were provided.\n".to_string()
    } else {
        formatted
    };
    format!(
        "Review the draft pain points below for '{name}' (website: {website}), a '{segment}' \
         prospect for {client}. {client} specializes in: {strengths}. Typical segment \
         challenges {client} addresses: {hints}.\n\n\
         Draft pain points:\n{formatted}\n\
         Scrutinize each point: it must be concrete, relevant to a '{segment}' company, and \
         clearly solvable by {client}'s offering. Refine vague points into specific, \
         compelling problems; reject and replace points that are irrelevant or unfixably \
         generic.\n\
         Produce ONLY a numbered list of 3-5 final, high-quality pain points, starting \
         directly with '1.'. No reasoning, headers, or any other text.",
        name = candidate.name,
        website = candidate.website,
        segment = segment.name,
        client = profile.client_name,
        strengths = profile.strengths_summary(),
        hints = segment.pain_hints_summary(),
    )
}
