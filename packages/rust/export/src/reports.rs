//! Aggregate report writing with per-artifact error isolation.
//!
//! Every artifact is attempted even when earlier ones fail; the outcome
//! records which writes succeeded and which did not.

use std::path::Path;

use serde_json::json;
use tracing::{info, warn};

use indicoharvest_shared::{ContributionRecord, EventInfo, Result, RunStats, SessionRecord};

use crate::csv::contributions_csv;
use crate::organize::{group_by_date, write_json, write_text};
use crate::render::{date_summary, overall_summary};

/// Which artifacts were written and which failed, by output-relative path.
#[derive(Debug, Clone, Default)]
pub struct ReportOutcome {
    pub written: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl ReportOutcome {
    fn attempt(&mut self, name: &str, result: Result<()>) {
        match result {
            Ok(()) => self.written.push(name.to_string()),
            Err(e) => {
                warn!(artifact = name, error = %e, "artifact write failed");
                self.failed.push((name.to_string(), e.to_string()));
            }
        }
    }
}

/// Write session files, date groupings, and the three aggregate outputs.
///
/// `generated_at` is a preformatted timestamp for the summary header.
pub fn write_outputs(
    output_dir: &Path,
    event: &EventInfo,
    records: &[ContributionRecord],
    sessions: &[SessionRecord],
    stats: &RunStats,
    generated_at: &str,
) -> ReportOutcome {
    let mut outcome = ReportOutcome::default();

    for session in sessions {
        let rel = format!("Sessions/session_{}.json", session.id);
        outcome.attempt(&rel, write_json(&output_dir.join(&rel), session));
    }

    for (date_key, group) in group_by_date(records) {
        let (dir_rel, label) = if date_key.is_empty() {
            // No start date: files land directly under By_Date/ with a bare
            // underscore prefix.
            ("By_Date".to_string(), "unknown date".to_string())
        } else {
            (format!("By_Date/{date_key}"), date_key.clone())
        };

        let json_rel = format!("{dir_rel}/{date_key}_contributions.json");
        let payload = json!({
            "date": date_key,
            "count": group.len(),
            "contributions": group,
        });
        outcome.attempt(&json_rel, write_json(&output_dir.join(&json_rel), &payload));

        let txt_rel = format!("{dir_rel}/{date_key}_summary.txt");
        outcome.attempt(
            &txt_rel,
            write_text(&output_dir.join(&txt_rel), &date_summary(&label, &group)),
        );
    }

    let prefix = output_dir
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());

    let all_json = format!("{prefix}_All_Contributions.json");
    outcome.attempt(&all_json, write_json(&output_dir.join(&all_json), &records));

    let all_csv = format!("{prefix}_All_Contributions.csv");
    outcome.attempt(
        &all_csv,
        contributions_csv(records)
            .and_then(|content| write_text(&output_dir.join(&all_csv), &content)),
    );

    let summary = format!("{prefix}_Summary.txt");
    outcome.attempt(
        &summary,
        write_text(
            &output_dir.join(&summary),
            &overall_summary(event, records, stats, generated_at),
        ),
    );

    info!(
        written = outcome.written.len(),
        failed = outcome.failed.len(),
        "report writing finished"
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use indicoharvest_shared::ContributionType;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("ih-reports-test-{}", uuid::Uuid::now_v7()))
    }

    fn record(id: i64, kind: ContributionType, date: Option<&str>) -> ContributionRecord {
        ContributionRecord {
            id,
            friendly_id: String::new(),
            title: format!("Title {id}"),
            type_name: String::new(),
            kind,
            description: String::new(),
            start_date: date.and_then(|d| d.parse().ok()),
            start_time: None,
            end_date: None,
            end_time: None,
            duration_minutes: 0,
            location: String::new(),
            room: String::new(),
            url: String::new(),
            session: Some("Main".into()),
            session_id: None,
            track: None,
            board_number: String::new(),
            code: String::new(),
            speakers: vec![],
            primary_authors: vec![],
            coauthors: vec![],
            keywords: vec![],
            attachments: vec![],
            attachment_count: 0,
        }
    }

    #[test]
    fn writes_all_artifact_kinds() {
        let out = temp_dir().join("MyEvent_Data");
        let records = vec![
            record(1, ContributionType::Oral, Some("2025-10-13")),
            record(2, ContributionType::Poster, Some("2025-10-14")),
        ];
        let sessions = crate::organize::derive_sessions(&records);
        let stats = RunStats::default();

        let outcome = write_outputs(
            &out,
            &EventInfo::default(),
            &records,
            &sessions,
            &stats,
            "now",
        );

        assert!(outcome.failed.is_empty(), "failures: {:?}", outcome.failed);
        assert!(out.join("Sessions/session_1.json").exists());
        assert!(out
            .join("By_Date/2025-10-13/2025-10-13_contributions.json")
            .exists());
        assert!(out.join("By_Date/2025-10-14/2025-10-14_summary.txt").exists());
        assert!(out.join("MyEvent_Data_All_Contributions.json").exists());
        assert!(out.join("MyEvent_Data_All_Contributions.csv").exists());
        assert!(out.join("MyEvent_Data_Summary.txt").exists());

        // Combined JSON is a flat array in discovery order.
        let combined: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(out.join("MyEvent_Data_All_Contributions.json")).unwrap(),
        )
        .unwrap();
        let ids: Vec<i64> = combined
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2]);

        let _ = std::fs::remove_dir_all(out.parent().unwrap());
    }

    #[test]
    fn csv_rows_match_combined_json_length() {
        let out = temp_dir().join("Ev");
        let records = vec![
            record(1, ContributionType::Oral, Some("2025-10-13")),
            record(2, ContributionType::Poster, None),
            record(3, ContributionType::Other, Some("2025-10-13")),
        ];
        let outcome = write_outputs(
            &out,
            &EventInfo::default(),
            &records,
            &[],
            &RunStats::default(),
            "now",
        );
        assert!(outcome.failed.is_empty());

        let combined: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(out.join("Ev_All_Contributions.json")).unwrap(),
        )
        .unwrap();
        let csv_content = std::fs::read_to_string(out.join("Ev_All_Contributions.csv")).unwrap();
        assert_eq!(
            csv_content.lines().count() - 1,
            combined.as_array().unwrap().len()
        );

        let _ = std::fs::remove_dir_all(out.parent().unwrap());
    }

    #[test]
    fn dateless_records_use_underscore_prefixed_files() {
        let out = temp_dir().join("Ev");
        let records = vec![record(4, ContributionType::Other, None)];
        let outcome = write_outputs(
            &out,
            &EventInfo::default(),
            &records,
            &[],
            &RunStats::default(),
            "now",
        );
        assert!(outcome.failed.is_empty());
        assert!(out.join("By_Date/_contributions.json").exists());
        assert!(out.join("By_Date/_summary.txt").exists());

        let _ = std::fs::remove_dir_all(out.parent().unwrap());
    }

    #[test]
    fn one_failed_artifact_does_not_stop_the_rest() {
        let out = temp_dir().join("Ev");
        std::fs::create_dir_all(&out).unwrap();
        // A directory where the combined JSON file should go forces that
        // single write to fail.
        std::fs::create_dir_all(out.join("Ev_All_Contributions.json")).unwrap();

        let records = vec![record(1, ContributionType::Oral, Some("2025-10-13"))];
        let outcome = write_outputs(
            &out,
            &EventInfo::default(),
            &records,
            &[],
            &RunStats::default(),
            "now",
        );

        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0, "Ev_All_Contributions.json");
        assert!(out.join("Ev_All_Contributions.csv").exists());
        assert!(out.join("Ev_Summary.txt").exists());

        let _ = std::fs::remove_dir_all(out.parent().unwrap());
    }
}
