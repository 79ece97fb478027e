use regex::Regex;
use scraper::{Html, Selector};

use crate::domain::lead::CandidateRecord;

/// Last-resort extraction straight from page markup, used when the text
/// cascade produced zero company candidates. Two heuristics in order:
/// directory-style table rows, then plain list items that look like proper
/// names. Never errors; an unparseable page yields an empty list.
pub fn extract_companies_from_html(html: &str) -> Vec<CandidateRecord> {
    let document = Html::parse_document(html);

    let companies = companies_from_tables(&document);
    if !companies.is_empty() {
        log::info!("Structural fallback found {} companies in tables", companies.len());
        return companies;
    }

    let companies = companies_from_list_items(&document);
    if !companies.is_empty() {
        log::info!(
            "Structural fallback found {} companies in list items",
            companies.len()
        );
    }
    companies
}

/// Directory tables are commonly "rank | name | ..." shaped, so the second
/// cell is the name column. Single-word cells are headers or ticker noise.
fn companies_from_tables(document: &Html) -> Vec<CandidateRecord> {
    let row_selector = Selector::parse("table tr").unwrap();
    let cell_selector = Selector::parse("td, th").unwrap();

    let mut companies: Vec<CandidateRecord> = Vec::new();
    for row in document.select(&row_selector) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();
        if cells.len() < 2 {
            continue;
        }
        let name = &cells[1];
        if name.split_whitespace().count() > 1
            && !companies.iter().any(|c| c.name.eq_ignore_ascii_case(name))
        {
            companies.push(CandidateRecord {
                name: name.clone(),
                website: String::new(),
            });
        }
    }
    companies
}

fn companies_from_list_items(document: &Html) -> Vec<CandidateRecord> {
    let item_selector = Selector::parse("li").unwrap();

    let mut companies: Vec<CandidateRecord> = Vec::new();
    for item in document.select(&item_selector) {
        let text = item.text().collect::<String>().trim().to_string();
        if looks_like_company_name(&text)
            && !companies.iter().any(|c| c.name.eq_ignore_ascii_case(&text))
        {
            companies.push(CandidateRecord {
                name: text,
                website: String::new(),
            });
        }
    }
    companies
}

/// Conservative proper-name gate: starts with a letter, 5-80 chars, a
/// restricted punctuation set, mixed case rather than shouting or numeric.
fn looks_like_company_name(text: &str) -> bool {
    let shape_re = Regex::new(r"^[A-Za-z][A-Za-z0-9&.,'()\- ]{4,79}$").unwrap();
    shape_re.is_match(text)
        && text.chars().any(|c| c.is_lowercase())
        && text.chars().any(|c| c.is_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wikitable_rows_yield_second_cell_names() {
        let html = r#"
            <table class="wikitable">
              <tr><th>Rank</th><th>Name</th><th>Revenue</th></tr>
              <tr><td>1</td><td>Acme Corp</td><td>$1B</td></tr>
              <tr><td>2</td><td>Beta Millwork Group</td><td>$500M</td></tr>
            </table>"#;
        let companies = extract_companies_from_html(html);
        assert_eq!(companies.len(), 2);
        assert_eq!(
            companies[0],
            CandidateRecord {
                name: "Acme Corp".to_string(),
                website: String::new()
            }
        );
        assert_eq!(companies[1].name, "Beta Millwork Group");
    }

    #[test]
    fn single_word_second_cells_are_skipped() {
        let html = "<table><tr><td>1</td><td>Acme</td><td>x</td></tr></table>";
        assert!(extract_companies_from_html(html).is_empty());
    }

    #[test]
    fn list_items_that_look_like_names_are_taken() {
        let html = r#"
            <ul>
              <li>Acme Veneer Co.</li>
              <li>HOME</li>
              <li>2024</li>
              <li>Chesapeake Casework &amp; Millwork</li>
            </ul>"#;
        let companies = extract_companies_from_html(html);
        let names: Vec<&str> = companies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Acme Veneer Co.", "Chesapeake Casework & Millwork"]);
    }

    #[test]
    fn tables_take_priority_over_lists() {
        let html = r#"
            <table><tr><td>1</td><td>Table Name Inc</td></tr></table>
            <ul><li>List Name Corp</li></ul>"#;
        let companies = extract_companies_from_html(html);
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].name, "Table Name Inc");
    }

    #[test]
    fn garbage_markup_yields_empty_list() {
        assert!(extract_companies_from_html("<<<not html>>>").is_empty());
        assert!(extract_companies_from_html("").is_empty());
    }
}
