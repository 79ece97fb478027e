use itertools::Itertools;
use regex::Regex;
use serde_json::Value;

use crate::domain::lead::CandidateRecord;

/// First-class failure value for the pain-points field. Downstream code must
/// treat this as "analysis produced nothing", never as content.
pub const NO_PAIN_POINTS: &str = "No specific pain points identified";

/// Recognizes every failure-shaped pain-points value the pipeline can emit.
pub fn is_failure_narrative(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty()
        || trimmed == NO_PAIN_POINTS
        || trimmed.starts_with("Analysis failed")
        || trimmed.starts_with("Analysis skipped")
        || trimmed.starts_with("Error")
}

/// Generated output sometimes arrives wrapped in a "FINAL ANSWER:" preamble.
fn strip_final_answer(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.to_uppercase().starts_with("FINAL ANSWER:") {
        match trimmed.split_once(':') {
            Some((_, rest)) => rest.trim(),
            None => trimmed,
        }
    } else {
        trimmed
    }
}

fn strip_code_fences(text: &str) -> &str {
    text.trim()
        .trim_start_matches("```python")
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Parses a bracketed list of quoted strings (`['a', "b"]`), the shape a
/// python-literal-minded generator tends to produce. Returns None when the
/// text is not exactly a flat string list.
fn parse_literal_string_list(text: &str) -> Option<Vec<String>> {
    let trimmed = text.trim();
    let inner = trimmed.strip_prefix('[')?.strip_suffix(']')?;

    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            '\'' | '"' => {
                let quote = c;
                chars.next();
                let mut item = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => {
                            if let Some(escaped) = chars.next() {
                                item.push(escaped);
                            }
                        }
                        Some(ch) if ch == quote => break,
                        Some(ch) => item.push(ch),
                        None => return None,
                    }
                }
                items.push(item);
            }
            ',' | ' ' | '\n' | '\r' | '\t' => {
                chars.next();
            }
            _ => return None,
        }
    }
    Some(items)
}

/// JSON parse with a second chance for python-style single quotes. The quote
/// swap is only attempted when the text carries no double quotes to mangle.
fn parse_json_relaxed(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }
    if !text.contains('"') && text.contains('\'') {
        return serde_json::from_str::<Value>(&text.replace('\'', "\"")).ok();
    }
    None
}

const ASSET_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".css", ".js", ".svg", ".webp",
];

fn is_asset_url(url: &str) -> bool {
    let lowered = url.to_lowercase();
    ASSET_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext))
}

fn string_array_urls(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| s.starts_with("http"))
            .collect(),
        _ => Vec::new(),
    }
}

/// Recovers a URL list from free text. Strategies in fixed priority order:
/// JSON string array, literal list, URL-shaped regex scan. All failures
/// degrade to an empty list, never an error.
pub fn parse_url_list(output: &str) -> Vec<String> {
    let cleaned = strip_code_fences(strip_final_answer(output));

    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        let urls = string_array_urls(&value);
        if !urls.is_empty() {
            log::info!("Extracted {} URLs via JSON parsing", urls.len());
            return urls;
        }
    }

    if let Some(items) = parse_literal_string_list(cleaned) {
        let urls: Vec<String> = items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| s.starts_with("http"))
            .collect();
        if !urls.is_empty() {
            log::info!("Extracted {} URLs via literal list parsing", urls.len());
            return urls;
        }
    }

    let url_re = Regex::new(r#"https?://[^\s"'<>\[\]]+"#).unwrap();
    let urls: Vec<String> = url_re
        .find_iter(cleaned)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ')', '(', '"', '\'']).to_string())
        .filter(|url| !is_asset_url(url))
        .unique()
        .collect();
    log::info!("Extracted {} URLs via regex scan", urls.len());
    urls
}

/// Name must be a plausible company name, website must carry a scheme.
fn valid_candidate(name: &str, website: &str) -> bool {
    let len = name.chars().count();
    len > 1 && len < 60 && website.starts_with("http")
}

fn candidates_from_json(value: &Value) -> Vec<CandidateRecord> {
    let mut companies: Vec<CandidateRecord> = Vec::new();
    if let Value::Array(items) = value {
        for item in items {
            let (Some(name), Some(website)) = (
                item.get("name").and_then(Value::as_str),
                item.get("website").and_then(Value::as_str),
            ) else {
                continue;
            };
            let name = name.trim();
            let website = website.trim();
            if valid_candidate(name, website)
                && !companies.iter().any(|c| c.name.eq_ignore_ascii_case(name))
            {
                companies.push(CandidateRecord {
                    name: name.to_string(),
                    website: website.to_string(),
                });
            }
        }
    }
    companies
}

/// Recovers {name, website} candidates from free text. Strategies in fixed
/// priority order: JSON object array, relaxed (single-quoted) literal array,
/// labeled regex patterns. A valid JSON value of the wrong shape falls
/// through to the next strategy.
pub fn parse_company_list(output: &str) -> Vec<CandidateRecord> {
    let cleaned = strip_code_fences(strip_final_answer(output));

    if let Some(value) = parse_json_relaxed(cleaned) {
        let companies = candidates_from_json(&value);
        if !companies.is_empty() {
            log::info!("Extracted {} companies via structured parsing", companies.len());
            return companies;
        }
    }

    let patterns = [
        // name: Acme Corp, website: https://acme.com
        r#"(?im)(?:company|name)\s*[:=]\s*"?([^",\n]{2,60}?)"?\s*[,;]?\s*(?:website|url)\s*[:=]\s*"?(https?://[^\s",\n]+)"?"#,
        // "Acme Corp" - https://acme.com  (also ':' and '|')
        r#"(?im)^\s*"?([^",\n]{2,60}?)"?\s*[-:|]\s*"?(https?://[^\s",\n]+)"?"#,
    ];

    let mut companies: Vec<CandidateRecord> = Vec::new();
    for pattern in patterns {
        let re = Regex::new(pattern).unwrap();
        for caps in re.captures_iter(cleaned) {
            let name = caps[1].trim().to_string();
            let website = caps[2].trim().to_string();
            if valid_candidate(&name, &website)
                && !companies.iter().any(|c| c.name.eq_ignore_ascii_case(&name))
            {
                companies.push(CandidateRecord { name, website });
            }
        }
    }

    if companies.is_empty() {
        log::warn!("All parsing strategies failed to extract company data");
    } else {
        log::info!("Extracted {} companies via regex patterns", companies.len());
    }
    companies
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub email: String,
    pub pain_points: String,
}

/// Placeholder addresses a generator invents when it finds nothing real.
const EMAIL_DENYLIST: &[&str] = &[
    "example.com",
    "test",
    "error",
    "your",
    "domain.com",
    "email@",
    "user@",
];

fn first_plausible_email(text: &str) -> String {
    let email_re = Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap();
    let found = email_re
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .find(|email| {
            let lowered = email.to_lowercase();
            !EMAIL_DENYLIST.iter().any(|bad| lowered.contains(bad))
        });
    found.unwrap_or_default()
}

/// Strips leading list markers (`-`, `*`, `1.`, `2)`) from each line and
/// drops blank lines.
fn strip_list_markers(text: &str) -> String {
    text.lines()
        .map(|line| {
            let trimmed = line.trim();
            let without_digits = trimmed.trim_start_matches(|c: char| c.is_ascii_digit());
            let stripped = if without_digits.len() < trimmed.len() {
                without_digits.trim_start_matches(['.', ')'])
            } else {
                trimmed.trim_start_matches(['-', '*'])
            };
            stripped.trim()
        })
        .filter(|line| !line.is_empty())
        .join("\n")
}

/// Recovers {email, pain_points} from enrichment output. Never errors: the
/// worst case is an empty email and the NO_PAIN_POINTS sentinel.
pub fn parse_analysis(result: &str) -> AnalysisResult {
    let trimmed = result.trim();

    // Occasionally the generator answers with a clean JSON object.
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
            if let (Some(email), Some(pain_points)) = (
                map.get("email").and_then(Value::as_str),
                map.get("pain_points").and_then(Value::as_str),
            ) {
                let email = email.trim().to_string();
                let pain_points = pain_points.trim().to_string();
                let pain_points = if pain_points.is_empty() || pain_points == email {
                    NO_PAIN_POINTS.to_string()
                } else {
                    pain_points
                };
                return AnalysisResult { email, pain_points };
            }
        }
    }

    let cleaned = strip_final_answer(result);
    let email = first_plausible_email(cleaned);

    let section_patterns = [
        r"(?is)(?:pain\s*points?|challenges?|issues?)\s*:(.*?)(?:contact email|conclusion|$)",
        r"(?is)potential pain\s*points?\s*:(.*?)(?:contact email|conclusion|$)",
    ];

    let mut pain_points = String::new();
    for pattern in section_patterns {
        let re = Regex::new(pattern).unwrap();
        if let Some(caps) = re.captures(cleaned) {
            pain_points = caps[1].trim().to_string();
            if !pain_points.is_empty() {
                break;
            }
        }
    }

    if pain_points.is_empty() {
        // Unlabeled but numbered content.
        let numbered_re = Regex::new(r"(?s)(?:\d+[.)]\s*[^\d]+)+").unwrap();
        if let Some(m) = numbered_re.find(cleaned) {
            pain_points = m.as_str().trim().to_string();
        }
    }

    if pain_points.is_empty() && !email.is_empty() {
        if let Some((_, after)) = cleaned.split_once(email.as_str()) {
            pain_points = after.trim().to_string();
        }
    }

    if pain_points.is_empty() {
        pain_points = cleaned.trim().to_string();
    }

    let pain_points = strip_list_markers(&pain_points);
    let pain_points = if pain_points.is_empty() || pain_points == email {
        NO_PAIN_POINTS.to_string()
    } else {
        pain_points
    };

    AnalysisResult { email, pain_points }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_list_from_json_array() {
        let output = r#"["https://example-directory.com/list", "https://another.org/article"]"#;
        assert_eq!(
            parse_url_list(output),
            vec![
                "https://example-directory.com/list",
                "https://another.org/article"
            ]
        );
    }

    #[test]
    fn url_list_from_python_literal_with_final_answer_prefix() {
        let output =
            "FINAL ANSWER: ['https://millworkdirectory.com/md', 'https://awinet.org/members']";
        assert_eq!(
            parse_url_list(output),
            vec![
                "https://millworkdirectory.com/md",
                "https://awinet.org/members"
            ]
        );
    }

    #[test]
    fn url_list_regex_strips_punctuation_and_assets_and_dedupes() {
        let output = "See (https://acme.com/list). Also https://acme.com/logo.png and \
                      https://acme.com/list again, plus https://other.net/dir.";
        assert_eq!(
            parse_url_list(output),
            vec!["https://acme.com/list", "https://other.net/dir"]
        );
    }

    #[test]
    fn url_list_wrong_shape_json_falls_through_to_regex() {
        let output = r#"{"urls": "https://acme.com/list"}"#;
        assert_eq!(parse_url_list(output), vec!["https://acme.com/list"]);
    }

    #[test]
    fn url_list_from_prose_without_urls_is_empty() {
        assert!(parse_url_list("I could not find any relevant sources.").is_empty());
    }

    #[test]
    fn company_list_from_json_array() {
        let output = r#"[{"name":"Acme Corp","website":"https://acme.com"}]"#;
        let companies = parse_company_list(output);
        assert_eq!(
            companies,
            vec![CandidateRecord {
                name: "Acme Corp".to_string(),
                website: "https://acme.com".to_string()
            }]
        );
    }

    #[test]
    fn company_list_from_single_quoted_literal() {
        let output = "```python\n[{'name': 'Chesapeake Casework', 'website': 'https://chesapeakecasework.com'}]\n```";
        let companies = parse_company_list(output);
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].name, "Chesapeake Casework");
    }

    #[test]
    fn company_list_from_labeled_lines() {
        let output = "name: Acme Corp, website: https://acme.com\n\
                      name: Beta Mills, website: https://betamills.com";
        let companies = parse_company_list(output);
        assert_eq!(companies.len(), 2);
        assert_eq!(companies[1].website, "https://betamills.com");
    }

    #[test]
    fn company_list_from_dash_separated_lines() {
        let output = "\"Acme Corp\" - https://acme.com\n\"Beta Mills\" - https://betamills.com";
        let companies = parse_company_list(output);
        assert_eq!(companies.len(), 2);
        assert_eq!(companies[0].name, "Acme Corp");
    }

    #[test]
    fn company_list_rejects_bad_names_and_schemes() {
        let output = r#"[
            {"name": "A", "website": "https://a.com"},
            {"name": "No Scheme Co", "website": "noscheme.com"},
            {"name": "Acme Corp", "website": "https://acme.com"}
        ]"#;
        let companies = parse_company_list(output);
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].name, "Acme Corp");
    }

    #[test]
    fn company_list_dedupes_names_case_insensitively() {
        let output = r#"[
            {"name": "Acme Corp", "website": "https://acme.com"},
            {"name": "ACME CORP", "website": "https://acme.us"}
        ]"#;
        assert_eq!(parse_company_list(output).len(), 1);
    }

    #[test]
    fn company_list_from_prose_is_empty() {
        assert!(parse_company_list("The page discusses veneer trends in 2025.").is_empty());
    }

    #[test]
    fn analysis_with_labeled_email_and_numbered_pain_points() {
        let output = "Contact Email: info@acme.com\nPain Points:\n1. X\n2. Y";
        let parsed = parse_analysis(output);
        assert_eq!(parsed.email, "info@acme.com");
        assert_eq!(parsed.pain_points, "X\nY");
    }

    #[test]
    fn analysis_from_json_object() {
        let output = r#"{"email": "sales@acme.com", "pain_points": "Long veneer lead times."}"#;
        let parsed = parse_analysis(output);
        assert_eq!(parsed.email, "sales@acme.com");
        assert_eq!(parsed.pain_points, "Long veneer lead times.");
    }

    #[test]
    fn first_plausible_email_skips_denylisted_matches_in_order() {
        let text = "Try test@acme.com or your@email.com first, then office@acmemillwork.com.";
        assert_eq!(first_plausible_email(text), "office@acmemillwork.com");
        assert_eq!(first_plausible_email("no addresses here"), "");
    }

    #[test]
    fn analysis_from_json_object_with_empty_pain_points_yields_sentinel() {
        let output = r#"{"email": "a@b.com", "pain_points": ""}"#;
        let parsed = parse_analysis(output);
        assert_eq!(parsed.email, "a@b.com");
        assert_eq!(parsed.pain_points, NO_PAIN_POINTS);

        let echoed = r#"{"email": "a@b.com", "pain_points": "a@b.com"}"#;
        assert_eq!(parse_analysis(echoed).pain_points, NO_PAIN_POINTS);
    }

    #[test]
    fn analysis_skips_placeholder_emails() {
        let output = "Maybe info@example.com, but the real address is office@acmemillwork.com.\n\
                      Pain Points:\n- Inconsistent veneer grading from current suppliers";
        let parsed = parse_analysis(output);
        assert_eq!(parsed.email, "office@acmemillwork.com");
        assert_eq!(
            parsed.pain_points,
            "Inconsistent veneer grading from current suppliers"
        );
    }

    #[test]
    fn analysis_without_email_uses_whole_text() {
        let output = "Challenges: relies on out-of-state suppliers with long lead times";
        let parsed = parse_analysis(output);
        assert_eq!(parsed.email, "");
        assert_eq!(
            parsed.pain_points,
            "relies on out-of-state suppliers with long lead times"
        );
    }

    #[test]
    fn analysis_of_empty_text_yields_sentinel() {
        let parsed = parse_analysis("   ");
        assert_eq!(parsed.email, "");
        assert_eq!(parsed.pain_points, NO_PAIN_POINTS);
        assert!(is_failure_narrative(&parsed.pain_points));
    }

    #[test]
    fn analysis_equal_to_email_yields_sentinel() {
        let parsed = parse_analysis("FINAL ANSWER: info@acmemillwork.com");
        assert_eq!(parsed.email, "info@acmemillwork.com");
        assert_eq!(parsed.pain_points, NO_PAIN_POINTS);
    }

    #[test]
    fn failure_narratives_are_recognized() {
        assert!(is_failure_narrative(NO_PAIN_POINTS));
        assert!(is_failure_narrative("Analysis failed for segment Millwork"));
        assert!(is_failure_narrative(""));
        assert!(!is_failure_narrative("1. Difficulty sourcing AWI veneers"));
    }
}
