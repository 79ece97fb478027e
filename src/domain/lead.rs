use serde::{Deserialize, Serialize};

/// An unverified {name, website} pair pulled out of a source page.
/// The website may be empty when the structural fallback produced the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub name: String,
    pub website: String,
}

/// A fully enriched candidate, the pipeline's final output unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub name: String,
    pub website: String,
    pub contact_email: String,
    pub pain_points: String,
    pub source_url: String,
    pub segment_name: String,
    pub category: String,
}

/// Names that an extraction pass sometimes hands back instead of a company.
const GENERIC_COMPANY_NAMES: &[&str] = &[
    "company",
    "organization",
    "the firm",
    "client",
    "example",
    "test",
    "none",
    "n/a",
    "website",
    "url",
];

/// Rows whose name or website contains one of these are navigation chrome or
/// policy boilerplate, not leads.
const JUNK_SUBSTRINGS: &[&str] = &[
    "wikimedia",
    "wikipedia",
    "privacy policy",
    "terms of use",
    "cookie statement",
    "donate",
    "edit links",
    "policy",
    "code of conduct",
    "statistics",
];

/// Canonical form used for run-scoped deduplication: lower-cased, `www.`
/// prefix stripped, trailing slash stripped. Idempotent.
pub fn normalize_website(website: &str) -> String {
    let lowered = website.trim().to_lowercase();
    let stripped = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);
    let stripped = stripped.strip_prefix("www.").unwrap_or(stripped);
    stripped.trim_end_matches('/').to_string()
}

pub fn is_generic_name(name: &str) -> bool {
    let lowered = name.trim().to_lowercase();
    GENERIC_COMPANY_NAMES.contains(&lowered.as_str())
}

/// Final validity pass over accumulated leads.
pub fn filter_valid_leads(leads: Vec<LeadRecord>) -> Vec<LeadRecord> {
    let before = leads.len();
    let cleaned: Vec<LeadRecord> = leads
        .into_iter()
        .filter(|lead| {
            let name = lead.name.to_lowercase();
            let site = lead.website.to_lowercase();
            !JUNK_SUBSTRINGS
                .iter()
                .any(|bad| name.contains(bad) || site.contains(bad))
        })
        .collect();
    if cleaned.len() < before {
        log::info!("Validity filter trimmed {} -> {} leads", before, cleaned.len());
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_scheme_www_and_trailing_slash() {
        assert_eq!(normalize_website("https://WWW.Foo.com/"), "foo.com");
        assert_eq!(normalize_website("WWW.Foo.com/"), "foo.com");
        assert_eq!(normalize_website("http://acme.com"), "acme.com");
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = [
            "https://www.Acme.com/",
            "acme.com",
            "WWW.Foo.com/",
            "https://sub.domain.co/path/",
        ];
        for input in inputs {
            let once = normalize_website(input);
            assert_eq!(normalize_website(&once), once, "not idempotent for {input}");
        }
    }

    #[test]
    fn generic_names_detected_case_insensitively() {
        assert!(is_generic_name("Company"));
        assert!(is_generic_name(" N/A "));
        assert!(!is_generic_name("Acme Corp"));
    }

    #[test]
    fn validity_filter_drops_navigation_rows() {
        let lead = |name: &str, website: &str| LeadRecord {
            name: name.to_string(),
            website: website.to_string(),
            contact_email: String::new(),
            pain_points: String::new(),
            source_url: String::new(),
            segment_name: String::new(),
            category: String::new(),
        };
        let leads = vec![
            lead("Acme Corp", "https://acme.com"),
            lead("Privacy Policy", ""),
            lead("Edit links", ""),
            lead("Baltimore Millwork", "https://en.wikipedia.org/wiki/Millwork"),
        ];
        let cleaned = filter_valid_leads(leads);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].name, "Acme Corp");
    }
}
