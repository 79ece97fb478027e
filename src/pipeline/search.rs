//! Turns one segment definition into a list of candidate source URLs: the
//! completion collaborator plans queries, the search collaborator runs them,
//! the parsing cascade recovers URLs, and a ccTLD denylist drops sources
//! that cannot be domestic companies.

use url::Url;

use crate::domain::profile::{ClientProfile, SegmentProfile};
use crate::parsing::parse_url_list;
use crate::pipeline::tasks::{self, RESEARCH_ROLE};
use crate::services::collaborators::{TextCompletion, WebSearch};

/// Country-code TLDs filtered out of search results. `.us`, `.com`, `.org`
/// and the other generic TLDs are absent and therefore allowed.
const DISALLOWED_COUNTRY_TLDS: &[&str] = &[
    ".ac", ".ad", ".ae", ".af", ".ag", ".ai", ".al", ".am", ".an", ".ao", ".aq", ".ar", ".as",
    ".at", ".au", ".aw", ".ax", ".az", ".ba", ".bb", ".bd", ".be", ".bf", ".bg", ".bh", ".bi",
    ".bj", ".bm", ".bn", ".bo", ".br", ".bs", ".bt", ".bv", ".bw", ".by", ".bz", ".ca", ".cc",
    ".cd", ".cf", ".cg", ".ch", ".ci", ".ck", ".cl", ".cm", ".cn", ".co", ".cr", ".cu", ".cv",
    ".cx", ".cy", ".cz", ".de", ".dj", ".dk", ".dm", ".do", ".dz", ".ec", ".ee", ".eg", ".er",
    ".es", ".et", ".eu", ".fi", ".fj", ".fk", ".fm", ".fo", ".fr", ".ga", ".gb", ".gd", ".ge",
    ".gf", ".gg", ".gh", ".gi", ".gl", ".gm", ".gn", ".gp", ".gq", ".gr", ".gs", ".gt", ".gu",
    ".gw", ".gy", ".hk", ".hm", ".hn", ".hr", ".ht", ".hu", ".id", ".ie", ".il", ".im", ".in",
    ".io", ".iq", ".ir", ".is", ".it", ".je", ".jm", ".jo", ".jp", ".ke", ".kg", ".kh", ".ki",
    ".km", ".kn", ".kp", ".kr", ".kw", ".ky", ".kz", ".la", ".lb", ".lc", ".li", ".lk", ".lr",
    ".ls", ".lt", ".lu", ".lv", ".ly", ".ma", ".mc", ".md", ".me", ".mg", ".mh", ".mk", ".ml",
    ".mm", ".mn", ".mo", ".mp", ".mq", ".mr", ".ms", ".mt", ".mu", ".mv", ".mw", ".mx", ".my",
    ".mz", ".na", ".nc", ".ne", ".nf", ".ng", ".ni", ".nl", ".no", ".np", ".nr", ".nu", ".nz",
    ".om", ".pa", ".pe", ".pf", ".pg", ".ph", ".pk", ".pl", ".pm", ".pn", ".pr", ".ps", ".pt",
    ".pw", ".py", ".qa", ".re", ".ro", ".rs", ".ru", ".rw", ".sa", ".sb", ".sc", ".sd", ".se",
    ".sg", ".sh", ".si", ".sj", ".sk", ".sl", ".sm", ".sn", ".so", ".sr", ".st", ".sv", ".sy",
    ".sz", ".tc", ".td", ".tf", ".tg", ".th", ".tj", ".tk", ".tl", ".tm", ".tn", ".to", ".tp",
    ".tr", ".tt", ".tv", ".tw", ".tz", ".ua", ".ug", ".uk", ".uy", ".uz", ".va", ".vc", ".ve",
    ".vg", ".vi", ".vn", ".vu", ".wf", ".ws", ".ye", ".yt", ".za", ".zm", ".zw",
];

/// A URL is rejected when its hostname's final label, or final two labels
/// for compound suffixes like `.co.uk`, appears on the denylist. URLs whose
/// hostname cannot be parsed are conservatively kept.
fn has_disallowed_tld(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_lowercase();
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let last = format!(".{}", labels[labels.len() - 1]);
    if DISALLOWED_COUNTRY_TLDS.contains(&last.as_str()) {
        return true;
    }
    if labels.len() >= 3 {
        let last_two = format!(".{}.{}", labels[labels.len() - 2], labels[labels.len() - 1]);
        if DISALLOWED_COUNTRY_TLDS.contains(&last_two.as_str()) {
            return true;
        }
    }
    false
}

fn filter_by_tld(urls: Vec<String>) -> Vec<String> {
    let before = urls.len();
    let kept: Vec<String> = urls
        .into_iter()
        .filter(|url| {
            let disallowed = has_disallowed_tld(url);
            if disallowed {
                log::debug!("Dropping {} (disallowed country TLD)", url);
            }
            !disallowed
        })
        .collect();
    if kept.len() < before {
        log::info!(
            "TLD filter dropped {} of {} candidate URLs",
            before - kept.len(),
            before
        );
    }
    kept
}

/// Pulls 3-5 query strings out of the planning response: a JSON string
/// array when the collaborator complied, otherwise non-empty lines with
/// list markers stripped.
fn parse_queries(output: &str) -> Vec<String> {
    let trimmed = output.trim();
    if let Ok(parsed) = serde_json::from_str::<Vec<String>>(trimmed) {
        return parsed
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();
    }
    trimmed
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(['-', '*', '['])
                .trim_end_matches([']', ','])
                .trim()
                .trim_matches(['"', '\''])
                .to_string()
        })
        .filter(|line| line.len() > 3)
        .take(5)
        .collect()
}

/// Search pass for one segment. Every failure is logged and surfaces as an
/// empty list so one segment cannot abort the run.
pub async fn find_source_urls(
    completion: &dyn TextCompletion,
    search: &dyn WebSearch,
    profile: &ClientProfile,
    segment: &SegmentProfile,
) -> Vec<String> {
    let task_set = tasks::search_tasks(profile, segment);

    let queries = match completion.complete(RESEARCH_ROLE, &task_set.plan, None).await {
        Ok(plan) => {
            let queries = parse_queries(&plan);
            if queries.is_empty() {
                log::warn!(
                    "No queries recovered from plan for segment '{}', using profile keywords",
                    segment.name
                );
                segment.search_keywords.clone()
            } else {
                queries
            }
        }
        Err(e) => {
            log::error!(
                "Query planning failed for segment '{}': {:#}, using profile keywords",
                segment.name,
                e
            );
            segment.search_keywords.clone()
        }
    };
    if queries.is_empty() {
        log::warn!("Segment '{}' has no usable search queries", segment.name);
        return Vec::new();
    }

    let results_text = match search.search(&queries).await {
        Ok(text) => text,
        Err(e) => {
            log::error!("Web search failed for segment '{}': {:#}", segment.name, e);
            return Vec::new();
        }
    };

    // Let the collaborator pick the best sources; fall back to scanning the
    // raw search results when it fails or returns nothing parseable.
    let urls = match completion
        .complete(RESEARCH_ROLE, &task_set.execute, Some(&results_text))
        .await
    {
        Ok(selection) => {
            let urls = parse_url_list(&selection);
            if urls.is_empty() {
                parse_url_list(&results_text)
            } else {
                urls
            }
        }
        Err(e) => {
            log::warn!(
                "Source selection failed for segment '{}': {:#}, scanning raw results",
                segment.name,
                e
            );
            parse_url_list(&results_text)
        }
    };

    log::info!(
        "Segment '{}': {} candidate URLs before TLD filter",
        segment.name,
        urls.len()
    );
    filter_by_tld(urls)
}
