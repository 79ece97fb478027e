//! CSV serialization of a finished run. One row per lead, with an
//! in-batch duplicate-name flag so reviewers can spot repeats without
//! re-sorting the sheet.

use std::collections::HashSet;

use chrono::Local;

use crate::domain::lead::{is_generic_name, LeadRecord};

const HEADER: &[&str] = &[
    "Company Name",
    "Website",
    "Potential Pain Points",
    "Contact Email",
    "Source URL",
    "Date Added",
    "Is Duplicate",
    "Lead Category",
];

/// Renders leads to CSV text. Rows with empty or generic names are
/// skipped rather than written half-filled.
pub fn leads_to_csv(leads: &[LeadRecord]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;

    let today = Local::now().date_naive().to_string();
    let mut names_in_batch: HashSet<String> = HashSet::new();
    let mut rows_written = 0usize;
    let mut skipped = 0usize;

    for lead in leads {
        let name = lead.name.trim();
        if name.is_empty() || is_generic_name(name) {
            skipped += 1;
            continue;
        }
        let is_duplicate = !names_in_batch.insert(name.to_lowercase());
        writer.write_record([
            name,
            &lead.website,
            &lead.pain_points,
            &lead.contact_email,
            &lead.source_url,
            &today,
            if is_duplicate { "True" } else { "False" },
            &lead.category,
        ])?;
        rows_written += 1;
    }

    log::info!(
        "Serialized {} lead rows to CSV ({} skipped)",
        rows_written,
        skipped
    );
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Finalizing CSV buffer failed: {e}"))?;
    Ok(String::from_utf8(bytes)?)
}
