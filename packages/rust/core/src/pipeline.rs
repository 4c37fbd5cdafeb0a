//! End-to-end extraction pipeline:
//! listing → detail parse → attachment downloads → organize/report.
//!
//! Execution is strictly sequential. The only ordering guarantee the
//! pipeline maintains is that a contribution's `contribution.json` is
//! written after every one of its attachment download attempts has
//! resolved, so the recorded outcomes match what is on disk.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};
use uuid::Uuid;

use indicoharvest_client::{IndicoClient, list_contributions, parse_contribution};
use indicoharvest_download::Downloader;
use indicoharvest_export::{
    ReportOutcome, contribution_dir, create_layout, derive_sessions, write_contribution_json,
    write_outputs,
};
use indicoharvest_shared::{
    ContributionRecord, DownloadOutcome, EventInfo, HarvestConfig, Result, RunStats,
};

/// Result of one extraction run.
#[derive(Debug)]
pub struct HarvestResult {
    /// Identifier for this run (time-sortable).
    pub run_id: Uuid,
    /// Event metadata from the listing.
    pub event: EventInfo,
    /// Output directory the tree was written to.
    pub output_dir: PathBuf,
    /// Aggregate counters.
    pub stats: RunStats,
    /// Which report artifacts were written and which failed.
    pub reports: ReportOutcome,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called for each contribution as it is processed.
    fn contribution(&self, current: usize, total: usize, label: &str);
    /// Called when the pipeline completes.
    fn done(&self, result: &HarvestResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn contribution(&self, _current: usize, _total: usize, _label: &str) {}
    fn done(&self, _result: &HarvestResult) {}
}

/// Run the full extraction.
///
/// 1. Fetch the event listing (fatal on failure)
/// 2. Per contribution: parse detail, download attachments, write record
/// 3. Derive sessions and date groups
/// 4. Write aggregate reports
#[instrument(skip_all, fields(event_id = %config.event_id))]
pub async fn run_harvest(
    config: &HarvestConfig,
    progress: &dyn ProgressReporter,
) -> Result<HarvestResult> {
    let start = Instant::now();
    let run_id = Uuid::now_v7();

    info!(%run_id, base_url = %config.base_url, "starting extraction");

    let client = IndicoClient::new(config)?;
    let downloader = Downloader::new(&client);

    // --- Phase 1: Listing (fatal on failure) ---
    progress.phase("Fetching event listing");
    let listing =
        list_contributions(&client, &config.event_id, config.max_contributions).await?;

    create_layout(&config.output_dir)?;

    let mut stats = RunStats::default();
    stats.parse_failures += listing.skipped;

    // --- Phase 2: Contributions ---
    progress.phase("Processing contributions");
    let total = listing.stubs.len();
    let mut records: Vec<ContributionRecord> = Vec::with_capacity(total);

    for (i, stub) in listing.stubs.iter().enumerate() {
        progress.contribution(i + 1, total, &stub.title);

        let mut record = match parse_contribution(stub) {
            Ok(record) => record,
            Err(e) => {
                warn!(id = stub.id, error = %e, "skipping malformed contribution");
                stats.parse_failures += 1;
                continue;
            }
        };

        stats.record(record.kind);
        stats.attachments_found += record.attachment_count;

        let dir = contribution_dir(&config.output_dir, &record);

        // Resolve every download before the record is written, so
        // contribution.json reflects what is actually on disk.
        for attachment in &mut record.attachments {
            match downloader.fetch(attachment, &dir).await {
                Ok(outcome) => {
                    match outcome {
                        DownloadOutcome::Downloaded { .. } => stats.downloaded_files += 1,
                        DownloadOutcome::SkippedExisting => stats.skipped_existing += 1,
                        _ => {}
                    }
                    attachment.outcome = outcome;
                }
                Err(e) => {
                    warn!(
                        id = record.id,
                        file = %attachment.filename,
                        error = %e,
                        "attachment download failed"
                    );
                    stats.download_failures += 1;
                    attachment.outcome = DownloadOutcome::Failed {
                        message: e.to_string(),
                    };
                }
            }
        }

        if let Err(e) = write_contribution_json(&dir, &record) {
            warn!(id = record.id, error = %e, "failed to write contribution record");
            stats.artifact_failures += 1;
        }

        records.push(record);
    }

    // --- Phase 3: Sessions, date groups, aggregates ---
    progress.phase("Writing reports");
    let sessions = derive_sessions(&records);
    stats.sessions = sessions.len();

    let generated_at = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let reports = write_outputs(
        &config.output_dir,
        &listing.event,
        &records,
        &sessions,
        &stats,
        &generated_at,
    );
    stats.artifacts_written += reports.written.len();
    stats.artifact_failures += reports.failed.len();

    let result = HarvestResult {
        run_id,
        event: listing.event,
        output_dir: config.output_dir.clone(),
        stats,
        reports,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        %run_id,
        contributions = result.stats.total_contributions,
        downloaded = result.stats.downloaded_files,
        skipped = result.stats.skipped_existing,
        errors = result.stats.errors(),
        elapsed_ms = result.elapsed.as_millis(),
        "extraction complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use serde_json::{Value, json};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use indicoharvest_shared::{AppConfig, RetryPolicy};

    fn test_config(base_url: &str, output_dir: &Path) -> HarvestConfig {
        let mut config = HarvestConfig::from(&AppConfig::default());
        config.base_url = base_url.to_string();
        config.output_dir = output_dir.to_path_buf();
        config.request_delay = Duration::ZERO;
        config.retry = RetryPolicy {
            max_attempts: 1,
            backoff: Duration::from_millis(1),
        };
        config
    }

    fn temp_output() -> PathBuf {
        std::env::temp_dir()
            .join(format!("ih-pipeline-test-{}", Uuid::now_v7()))
            .join("Event_Data")
    }

    /// Two contributions: one Oral with an attachment, one Poster without.
    fn sample_event() -> Value {
        json!({
            "count": 1,
            "results": [{
                "id": "939",
                "title": "Test Workshop",
                "url": "https://indico.example.org/event/939/",
                "startDate": {"date": "2025-10-13", "time": "08:00:00"},
                "endDate": {"date": "2025-10-14", "time": "18:00:00"},
                "location": "Test Hall",
                "contributions": [
                    {
                        "id": 1,
                        "friendly_id": 1,
                        "title": "An Oral Talk",
                        "type": "Oral Presentation",
                        "startDate": {"date": "2025-10-13", "time": "09:00:00"},
                        "duration": 20,
                        "session": "Opening",
                        "speakers": [{"fullName": "Jane Doe", "affiliation": "JLab"}],
                        "folders": [{"attachments": [{
                            "title": "Slides",
                            "filename": "slides.pdf",
                            "download_url": "/files/slides.pdf",
                            "content_type": "application/pdf",
                            "size": 4
                        }]}]
                    },
                    {
                        "id": 2,
                        "friendly_id": 2,
                        "title": "A Poster",
                        "type": "Poster",
                        "startDate": {"date": "2025-10-14", "time": "14:00:00"},
                        "session": "Posters"
                    }
                ]
            }]
        })
    }

    async fn mount_listing(server: &MockServer, body: Value) {
        Mock::given(method("GET"))
            .and(path("/export/event/939.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn full_run_produces_documented_tree() {
        let server = MockServer::start().await;
        mount_listing(&server, sample_event()).await;
        Mock::given(method("GET"))
            .and(path("/files/slides.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pdf!".to_vec()))
            .mount(&server)
            .await;

        let out = temp_output();
        let config = test_config(&server.uri(), &out);
        let result = run_harvest(&config, &SilentProgress).await.unwrap();

        assert_eq!(result.stats.total_contributions, 2);
        assert_eq!(result.stats.oral_presentations, 1);
        assert_eq!(result.stats.posters, 1);
        assert_eq!(result.stats.downloaded_files, 1);
        assert_eq!(result.stats.errors(), 0);

        // Type folders with per-contribution dirs.
        let oral_dir = out.join("Oral_Presentations/1 - An Oral Talk");
        assert!(oral_dir.join("contribution.json").exists());
        assert!(oral_dir.join("slides.pdf").exists());
        assert!(out.join("Posters/2 - A Poster/contribution.json").exists());

        // Date folders, one contribution each.
        for (date, id) in [("2025-10-13", 1), ("2025-10-14", 2)] {
            let day_json: Value = serde_json::from_str(
                &std::fs::read_to_string(
                    out.join(format!("By_Date/{date}/{date}_contributions.json")),
                )
                .unwrap(),
            )
            .unwrap();
            assert_eq!(day_json["count"], 1);
            assert_eq!(day_json["contributions"][0]["id"], id);
        }

        // Sessions derived from session names.
        assert!(out.join("Sessions/session_1.json").exists());
        assert!(out.join("Sessions/session_2.json").exists());

        // Combined JSON: 2 entries, discovery order, each id exactly once.
        let combined: Value = serde_json::from_str(
            &std::fs::read_to_string(out.join("Event_Data_All_Contributions.json")).unwrap(),
        )
        .unwrap();
        let ids: Vec<i64> = combined
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2]);

        // CSV row count equals combined JSON length.
        let csv_content =
            std::fs::read_to_string(out.join("Event_Data_All_Contributions.csv")).unwrap();
        assert_eq!(csv_content.lines().count() - 1, ids.len());

        // Summary reports the per-type counts.
        let summary = std::fs::read_to_string(out.join("Event_Data_Summary.txt")).unwrap();
        assert!(summary.contains("Oral presentations: 1"));
        assert!(summary.contains("Posters: 1"));

        let _ = std::fs::remove_dir_all(out.parent().unwrap());
    }

    #[tokio::test]
    async fn attachment_failure_does_not_abort_the_run() {
        let server = MockServer::start().await;
        mount_listing(&server, sample_event()).await;
        Mock::given(method("GET"))
            .and(path("/files/slides.pdf"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let out = temp_output();
        let config = test_config(&server.uri(), &out);
        let result = run_harvest(&config, &SilentProgress).await.unwrap();

        assert_eq!(result.stats.download_failures, 1);
        assert_eq!(result.stats.errors(), 1);
        assert_eq!(result.stats.total_contributions, 2);

        // contribution.json is still written, with the enumerated count and
        // the failure recorded.
        let record: Value = serde_json::from_str(
            &std::fs::read_to_string(
                out.join("Oral_Presentations/1 - An Oral Talk/contribution.json"),
            )
            .unwrap(),
        )
        .unwrap();
        assert_eq!(record["attachment_count"], 1);
        assert_eq!(record["attachments"][0]["outcome"]["status"], "failed");
        assert!(!out
            .join("Oral_Presentations/1 - An Oral Talk/slides.pdf")
            .exists());

        let _ = std::fs::remove_dir_all(out.parent().unwrap());
    }

    #[tokio::test]
    async fn rerun_skips_existing_downloads() {
        let server = MockServer::start().await;
        mount_listing(&server, sample_event()).await;
        // The attachment must be requested exactly once across both runs.
        Mock::given(method("GET"))
            .and(path("/files/slides.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pdf!".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let out = temp_output();
        let config = test_config(&server.uri(), &out);

        let first = run_harvest(&config, &SilentProgress).await.unwrap();
        assert_eq!(first.stats.downloaded_files, 1);
        assert_eq!(first.stats.skipped_existing, 0);

        let second = run_harvest(&config, &SilentProgress).await.unwrap();
        assert_eq!(second.stats.downloaded_files, 0);
        assert_eq!(second.stats.skipped_existing, 1);

        let _ = std::fs::remove_dir_all(out.parent().unwrap());
    }

    #[tokio::test]
    async fn malformed_listing_aborts_the_run() {
        let server = MockServer::start().await;
        mount_listing(&server, json!({"count": 0, "results": []})).await;

        let out = temp_output();
        let config = test_config(&server.uri(), &out);
        let err = run_harvest(&config, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, indicoharvest_shared::HarvestError::Fetch(_)));
        assert!(!out.exists());

        let _ = std::fs::remove_dir_all(out.parent().unwrap());
    }

    #[tokio::test]
    async fn contribution_cap_limits_processing() {
        let server = MockServer::start().await;
        mount_listing(&server, sample_event()).await;
        Mock::given(method("GET"))
            .and(path("/files/slides.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pdf!".to_vec()))
            .mount(&server)
            .await;

        let out = temp_output();
        let mut config = test_config(&server.uri(), &out);
        config.max_contributions = Some(1);

        let result = run_harvest(&config, &SilentProgress).await.unwrap();
        assert_eq!(result.stats.total_contributions, 1);
        assert!(!out.join("Posters/2 - A Poster").exists());

        let _ = std::fs::remove_dir_all(out.parent().unwrap());
    }
}
