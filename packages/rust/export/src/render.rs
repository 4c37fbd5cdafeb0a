//! Plain-text report rendering.
//!
//! Pure string builders; all filesystem work lives in `reports`.

use indicoharvest_shared::{ContributionRecord, ContributionType, EventInfo, Person, RunStats};

const RULE_HEAVY: &str =
    "================================================================================";
const RULE_LIGHT: &str =
    "--------------------------------------------------------------------------------";

/// Maximum description length in the summary blocks.
const SUMMARY_DESCRIPTION_MAX: usize = 200;

/// Strip HTML tags from a description and collapse whitespace to one line.
pub fn strip_html(input: &str) -> String {
    let text = if input.contains('<') {
        let fragment = scraper::Html::parse_fragment(input);
        fragment.root_element().text().collect::<Vec<_>>().join(" ")
    } else {
        input.to_string()
    };
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max` characters of `s` (char-boundary safe), no ellipsis.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

fn join_names(people: &[Person], sep: &str) -> String {
    people
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(sep)
}

/// One numbered contribution entry for the text summaries.
pub fn contribution_block(index: usize, record: &ContributionRecord) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{index}. [{}] {}\n",
        record.display_id(),
        record.title
    ));
    let type_label = if record.type_name.is_empty() {
        "N/A"
    } else {
        &record.type_name
    };
    out.push_str(&format!("   Type: {type_label}\n"));

    let date = record
        .start_date
        .map(|d| d.to_string())
        .unwrap_or_default();
    let time = record
        .start_time
        .map(|t| t.to_string())
        .unwrap_or_default();
    out.push_str(&format!(
        "   Date/Time: {date} {time} ({} min)\n",
        record.duration_minutes
    ));

    if !record.speakers.is_empty() {
        out.push_str(&format!("   Speakers: {}\n", join_names(&record.speakers, ", ")));
    }
    if !record.primary_authors.is_empty() {
        out.push_str(&format!(
            "   Primary Authors: {}\n",
            join_names(&record.primary_authors, ", ")
        ));
    }
    if !record.coauthors.is_empty() {
        out.push_str(&format!(
            "   Co-authors: {}\n",
            join_names(&record.coauthors, ", ")
        ));
    }

    if !record.attachments.is_empty() {
        out.push_str(&format!("   Attachments ({}):\n", record.attachment_count));
        for attachment in &record.attachments {
            out.push_str(&format!(
                "     - {} ({} bytes)\n",
                attachment.filename, attachment.size
            ));
        }
    }

    out.push_str(&format!("   URL: {}\n", record.url));

    let description = strip_html(&record.description);
    if !description.is_empty() {
        let mut shown = truncate_chars(&description, SUMMARY_DESCRIPTION_MAX);
        if shown.len() < description.len() {
            shown.push_str("...");
        }
        out.push_str(&format!("   Description: {shown}\n"));
    }

    out.push('\n');
    out
}

/// The overall `<prefix>_Summary.txt` report.
pub fn overall_summary(
    event: &EventInfo,
    records: &[ContributionRecord],
    stats: &RunStats,
    generated_at: &str,
) -> String {
    let mut out = String::new();

    out.push_str("Conference Extraction Report\n");
    out.push_str(RULE_HEAVY);
    out.push('\n');
    out.push_str(&format!("Event: {}\n", event.title));
    out.push_str(&format!("Event ID: {}\n", event.id));
    out.push_str(&format!("URL: {}\n", event.url));
    out.push_str(&format!("Generated: {generated_at}\n\n"));

    out.push_str("Statistics:\n");
    out.push_str(&format!(
        "  Total contributions: {}\n",
        stats.total_contributions
    ));
    out.push_str(&format!(
        "  Oral presentations: {}\n",
        stats.oral_presentations
    ));
    out.push_str(&format!("  Posters: {}\n", stats.posters));
    out.push_str(&format!("  Others: {}\n", stats.others));
    out.push_str(&format!("  Sessions: {}\n", stats.sessions));
    out.push_str(&format!(
        "  Attachments found: {}\n",
        stats.attachments_found
    ));
    out.push_str(&format!(
        "  Downloads attempted: {}\n",
        stats.downloaded_files + stats.download_failures
    ));
    out.push_str(&format!("  Downloaded files: {}\n", stats.downloaded_files));
    out.push_str(&format!(
        "  Skipped (already present): {}\n",
        stats.skipped_existing
    ));
    out.push_str(&format!(
        "  Failed downloads: {}\n",
        stats.download_failures
    ));
    out.push_str(&format!("  Errors: {}\n", stats.errors()));
    out.push_str(RULE_HEAVY);
    out.push_str("\n\n");

    for kind in [
        ContributionType::Oral,
        ContributionType::Poster,
        ContributionType::Other,
    ] {
        let group: Vec<&ContributionRecord> =
            records.iter().filter(|r| r.kind == kind).collect();
        if group.is_empty() {
            continue;
        }
        out.push_str(kind.heading());
        out.push('\n');
        out.push_str(RULE_LIGHT);
        out.push('\n');
        for (i, record) in group.iter().enumerate() {
            out.push_str(&contribution_block(i + 1, record));
        }
        out.push('\n');
    }

    out
}

/// The per-date `<date>_summary.txt` report.
pub fn date_summary(date_label: &str, records: &[&ContributionRecord]) -> String {
    let mut out = String::new();

    out.push_str(&format!("Contributions on {date_label}\n"));
    out.push_str(RULE_HEAVY);
    out.push('\n');
    out.push_str(&format!("Total contributions: {}\n\n", records.len()));

    for (i, record) in records.iter().enumerate() {
        out.push_str(&contribution_block(i + 1, record));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use indicoharvest_shared::AttachmentRecord;

    fn record(id: i64, kind: ContributionType) -> ContributionRecord {
        ContributionRecord {
            id,
            friendly_id: String::new(),
            title: format!("Contribution {id}"),
            type_name: "Oral Presentation".into(),
            kind,
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2025, 10, 13),
            start_time: NaiveTime::from_hms_opt(9, 30, 0),
            end_date: None,
            end_time: None,
            duration_minutes: 20,
            location: String::new(),
            room: String::new(),
            url: "https://example.org/c/1".into(),
            session: None,
            session_id: None,
            track: None,
            board_number: String::new(),
            code: String::new(),
            speakers: vec![Person {
                name: "Jane Doe".into(),
                ..Person::default()
            }],
            primary_authors: vec![],
            coauthors: vec![],
            keywords: vec![],
            attachments: vec![],
            attachment_count: 0,
        }
    }

    #[test]
    fn strip_html_removes_tags_and_collapses_whitespace() {
        assert_eq!(
            strip_html("<p>Hello <b>world</b></p>\n<p>again</p>"),
            "Hello world again"
        );
        assert_eq!(strip_html("plain   text\n\twrapped"), "plain text wrapped");
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn block_contains_id_speakers_and_times() {
        let block = contribution_block(1, &record(5, ContributionType::Oral));
        assert!(block.starts_with("1. [5] Contribution 5\n"));
        assert!(block.contains("Type: Oral Presentation"));
        assert!(block.contains("Date/Time: 2025-10-13 09:30:00 (20 min)"));
        assert!(block.contains("Speakers: Jane Doe"));
    }

    #[test]
    fn block_lists_attachments() {
        let mut r = record(6, ContributionType::Poster);
        r.attachments = vec![AttachmentRecord {
            contribution_id: 6,
            title: String::new(),
            filename: "poster.pdf".into(),
            download_url: String::new(),
            content_type: String::new(),
            size: 512,
            modified: String::new(),
            is_protected: false,
            outcome: Default::default(),
        }];
        r.attachment_count = 1;
        let block = contribution_block(1, &r);
        assert!(block.contains("Attachments (1):"));
        assert!(block.contains("- poster.pdf (512 bytes)"));
    }

    #[test]
    fn long_descriptions_are_truncated_with_ellipsis() {
        let mut r = record(7, ContributionType::Oral);
        r.description = "x".repeat(300);
        let block = contribution_block(1, &r);
        assert!(block.contains(&format!("Description: {}...", "x".repeat(200))));
    }

    #[test]
    fn summary_reports_counts_per_type() {
        let records = vec![
            record(1, ContributionType::Oral),
            record(2, ContributionType::Poster),
        ];
        let mut stats = RunStats::default();
        stats.record(ContributionType::Oral);
        stats.record(ContributionType::Poster);

        let event = EventInfo {
            id: "939".into(),
            title: "LLRF Workshop 2025".into(),
            ..EventInfo::default()
        };
        let summary = overall_summary(&event, &records, &stats, "2025-10-20 12:00:00");

        assert!(summary.contains("Event: LLRF Workshop 2025"));
        assert!(summary.contains("Oral presentations: 1"));
        assert!(summary.contains("Posters: 1"));
        assert!(summary.contains("ORAL PRESENTATIONS"));
        assert!(summary.contains("POSTERS"));
        assert!(!summary.contains("OTHER CONTRIBUTIONS"));
    }

    #[test]
    fn date_summary_counts_entries() {
        let a = record(1, ContributionType::Oral);
        let b = record(2, ContributionType::Poster);
        let summary = date_summary("2025-10-13", &[&a, &b]);
        assert!(summary.starts_with("Contributions on 2025-10-13\n"));
        assert!(summary.contains("Total contributions: 2"));
        assert!(summary.contains("2. [2] Contribution 2"));
    }
}
