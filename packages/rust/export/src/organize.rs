//! Directory layout, type/date grouping, and JSON materialization.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use tracing::debug;

use indicoharvest_shared::{
    ContributionRecord, HarvestError, Result, SessionRecord, safe_filename_with_limit,
};

/// Bound on the sanitized-title part of a contribution folder name.
pub const FOLDER_TITLE_MAX: usize = 80;

/// Create the top-level output directory structure.
pub fn create_layout(output_dir: &Path) -> Result<()> {
    let dirs = [
        output_dir.to_path_buf(),
        output_dir.join("Oral_Presentations"),
        output_dir.join("Posters"),
        output_dir.join("Attachments"),
        output_dir.join("Sessions"),
        output_dir.join("By_Date"),
    ];

    for dir in &dirs {
        std::fs::create_dir_all(dir).map_err(|e| HarvestError::io(dir, e))?;
    }

    debug!(path = %output_dir.display(), "output directory structure created");
    Ok(())
}

/// Folder a contribution's files live in:
/// `<type dir>/<display id> - <sanitized bounded title>/`.
pub fn contribution_dir(output_dir: &Path, record: &ContributionRecord) -> PathBuf {
    let title = safe_filename_with_limit(&record.title, FOLDER_TITLE_MAX);
    output_dir
        .join(record.kind.folder_name())
        .join(format!("{} - {}", record.display_id(), title))
}

/// Write `contribution.json` for a record into its folder.
pub fn write_contribution_json(dir: &Path, record: &ContributionRecord) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| HarvestError::io(dir, e))?;
    write_json(&dir.join("contribution.json"), record)
}

/// Write a JSON file (pretty-printed), creating parent directories.
pub fn write_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| HarvestError::validation(format!("JSON serialization failed: {e}")))?;
    ensure_parent(path)?;
    std::fs::write(path, json).map_err(|e| HarvestError::io(path, e))?;
    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}

/// Write a plain-text file, creating parent directories.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, content).map_err(|e| HarvestError::io(path, e))?;
    debug!(path = %path.display(), "wrote text file");
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| HarvestError::io(parent, e))?;
    }
    Ok(())
}

/// Group records by start date. The key is the ISO date, or empty for
/// records with no start date (those land directly under `By_Date/`).
/// Each group is ordered by start time, ties broken by id.
pub fn group_by_date(records: &[ContributionRecord]) -> BTreeMap<String, Vec<&ContributionRecord>> {
    let mut groups: BTreeMap<String, Vec<&ContributionRecord>> = BTreeMap::new();
    for record in records {
        let key = record
            .start_date
            .map(|d| d.to_string())
            .unwrap_or_default();
        groups.entry(key).or_default().push(record);
    }
    for group in groups.values_mut() {
        group.sort_by_key(|r| (r.start_time.unwrap_or(NaiveTime::MIN), r.id));
    }
    groups
}

/// Derive session records by grouping contributions on session name.
///
/// The session id is the source-provided numeric id when present, else the
/// 1-based first-appearance ordinal, so re-runs produce identical files.
pub fn derive_sessions(records: &[ContributionRecord]) -> Vec<SessionRecord> {
    let mut sessions: Vec<SessionRecord> = Vec::new();
    let mut index_by_name: BTreeMap<String, usize> = BTreeMap::new();

    for record in records {
        let Some(name) = record.session.as_deref().filter(|s| !s.is_empty()) else {
            continue;
        };

        let idx = match index_by_name.get(name) {
            Some(&idx) => idx,
            None => {
                let ordinal = sessions.len() as i64 + 1;
                sessions.push(SessionRecord {
                    id: record.session_id.unwrap_or(ordinal),
                    name: name.to_string(),
                    date: None,
                    contribution_ids: Vec::new(),
                });
                index_by_name.insert(name.to_string(), sessions.len() - 1);
                sessions.len() - 1
            }
        };

        let session = &mut sessions[idx];
        session.contribution_ids.push(record.id);
        if let Some(id) = record.session_id {
            session.id = id;
        }
        session.date = match (session.date, record.start_date) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
    }

    sessions
}
