//! Core domain types for extracted conference data.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ContributionType
// ---------------------------------------------------------------------------

/// Classified contribution grouping, used for the top-level type folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContributionType {
    Oral,
    Poster,
    Other,
}

impl ContributionType {
    /// Classify a source type label. Case-insensitive; unrecognized labels
    /// fall into [`ContributionType::Other`].
    pub fn classify(raw: &str) -> Self {
        let t = raw.to_lowercase();
        if t.contains("oral") || t.contains("talk") {
            Self::Oral
        } else if t.contains("poster") {
            Self::Poster
        } else {
            Self::Other
        }
    }

    /// Top-level folder a contribution of this type is filed under.
    pub fn folder_name(&self) -> &'static str {
        match self {
            Self::Oral => "Oral_Presentations",
            Self::Poster => "Posters",
            Self::Other => "Attachments",
        }
    }

    /// Section heading used in the plain-text summary.
    pub fn heading(&self) -> &'static str {
        match self {
            Self::Oral => "ORAL PRESENTATIONS",
            Self::Poster => "POSTERS",
            Self::Other => "OTHER CONTRIBUTIONS",
        }
    }
}

impl std::fmt::Display for ContributionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Oral => "Oral",
            Self::Poster => "Poster",
            Self::Other => "Other",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Person
// ---------------------------------------------------------------------------

/// A speaker or author attached to a contribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Full display name.
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub affiliation: String,
}

// ---------------------------------------------------------------------------
// AttachmentRecord
// ---------------------------------------------------------------------------

/// Resolved result of one attachment download attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadOutcome {
    /// No attempt has been made yet.
    #[default]
    Pending,
    /// Fetched and written to disk this run.
    Downloaded { bytes: u64, sha256: String },
    /// A non-empty file was already present at the target path.
    SkippedExisting,
    /// The transfer or write failed; the file may be absent or partial.
    Failed { message: String },
}

/// One downloadable file tied to a contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRecord {
    /// Owning contribution id.
    pub contribution_id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Filesystem-safe filename, collision-resolved within the contribution.
    pub filename: String,
    pub download_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_type: String,
    /// Size in bytes as reported by the source.
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub modified: String,
    #[serde(default)]
    pub is_protected: bool,
    #[serde(default)]
    pub outcome: DownloadOutcome,
}

// ---------------------------------------------------------------------------
// ContributionRecord
// ---------------------------------------------------------------------------

/// One conference talk or poster, fully populated from the event export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionRecord {
    /// Source-assigned id, unique across the run.
    pub id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub friendly_id: String,
    pub title: String,
    /// Type label as reported by the source (e.g. "Oral Presentation").
    #[serde(rename = "type", default)]
    pub type_name: String,
    /// Grouping derived from `type_name`.
    pub kind: ContributionType,
    #[serde(default)]
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_date: Option<NaiveDate>,
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub room: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub board_number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,
    #[serde(default)]
    pub speakers: Vec<Person>,
    #[serde(default)]
    pub primary_authors: Vec<Person>,
    #[serde(default)]
    pub coauthors: Vec<Person>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRecord>,
    /// Number of enumerated attachments. Always equals `attachments.len()`,
    /// independent of download success.
    pub attachment_count: usize,
}

impl ContributionRecord {
    /// Identifier used in folder names and summaries: the friendly id when
    /// present, else the numeric id.
    pub fn display_id(&self) -> String {
        if self.friendly_id.is_empty() {
            self.id.to_string()
        } else {
            self.friendly_id.clone()
        }
    }

    /// Sorted, deduplicated affiliations across speakers and authors.
    pub fn affiliations(&self) -> Vec<String> {
        let mut set: Vec<String> = self
            .speakers
            .iter()
            .chain(&self.primary_authors)
            .chain(&self.coauthors)
            .filter(|p| !p.affiliation.is_empty())
            .map(|p| p.affiliation.clone())
            .collect();
        set.sort();
        set.dedup();
        set
    }
}

// ---------------------------------------------------------------------------
// SessionRecord
// ---------------------------------------------------------------------------

/// Secondary grouping of contributions by conference session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub name: String,
    /// Earliest start date among the member contributions.
    pub date: Option<NaiveDate>,
    pub contribution_ids: Vec<i64>,
}

// ---------------------------------------------------------------------------
// EventInfo
// ---------------------------------------------------------------------------

/// Event-level metadata from the export payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
}

// ---------------------------------------------------------------------------
// RunStats
// ---------------------------------------------------------------------------

/// Aggregate counters for one extraction run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub total_contributions: usize,
    pub oral_presentations: usize,
    pub posters: usize,
    pub others: usize,
    pub sessions: usize,
    pub attachments_found: usize,
    pub downloaded_files: usize,
    pub skipped_existing: usize,
    pub download_failures: usize,
    pub parse_failures: usize,
    pub artifacts_written: usize,
    pub artifact_failures: usize,
}

impl RunStats {
    /// Count one classified contribution.
    pub fn record(&mut self, kind: ContributionType) {
        self.total_contributions += 1;
        match kind {
            ContributionType::Oral => self.oral_presentations += 1,
            ContributionType::Poster => self.posters += 1,
            ContributionType::Other => self.others += 1,
        }
    }

    /// Total error count across all stages.
    pub fn errors(&self) -> usize {
        self.parse_failures + self.download_failures + self.artifact_failures
    }
}
