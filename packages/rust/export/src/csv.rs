//! Flattened CSV rendering of the contribution set.
//!
//! One row per contribution in discovery order; list-valued fields are
//! joined with `"; "` so the file opens cleanly in spreadsheet tools.

use indicoharvest_shared::{ContributionRecord, HarvestError, Person, Result};

use crate::render::{strip_html, truncate_chars};

/// Column order of the CSV output.
const HEADER: [&str; 17] = [
    "id",
    "friendly_id",
    "title",
    "type",
    "start_date",
    "start_time",
    "duration",
    "speakers",
    "primary_authors",
    "coauthors",
    "affiliations",
    "description",
    "attachment_count",
    "url",
    "session",
    "location",
    "room",
];

/// List-field join delimiter.
const LIST_SEP: &str = "; ";

/// Description cell length bound.
const DESCRIPTION_MAX: usize = 500;

/// Render all contributions as a CSV document (header + one row each).
pub fn contributions_csv(records: &[ContributionRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(HEADER)
        .map_err(|e| HarvestError::validation(format!("CSV header: {e}")))?;

    for record in records {
        writer
            .write_record(row(record))
            .map_err(|e| HarvestError::validation(format!("CSV row for {}: {e}", record.id)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| HarvestError::validation(format!("CSV flush: {e}")))?;
    String::from_utf8(bytes).map_err(|e| HarvestError::validation(format!("CSV encoding: {e}")))
}

fn row(record: &ContributionRecord) -> Vec<String> {
    vec![
        record.id.to_string(),
        record.friendly_id.clone(),
        record.title.clone(),
        record.type_name.clone(),
        record
            .start_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        record
            .start_time
            .map(|t| t.to_string())
            .unwrap_or_default(),
        record.duration_minutes.to_string(),
        join_names(&record.speakers),
        join_names(&record.primary_authors),
        join_names(&record.coauthors),
        record.affiliations().join(LIST_SEP),
        truncate_chars(&strip_html(&record.description), DESCRIPTION_MAX),
        record.attachment_count.to_string(),
        record.url.clone(),
        record.session.clone().unwrap_or_default(),
        record.location.clone(),
        record.room.clone(),
    ]
}

fn join_names(people: &[Person]) -> String {
    people
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(LIST_SEP)
}
