//! Organizer/Writer: classify contributions, materialize the output tree,
//! and emit the aggregate JSON/CSV/summary reports.
//!
//! This crate provides:
//! - [`organize`] — directory layout, type/date grouping, JSON writing
//! - [`render`] — plain-text summary generators
//! - [`csv`] — flattened CSV rendering
//! - [`reports`] — aggregate writers with per-artifact error isolation

pub mod csv;
pub mod organize;
pub mod render;
pub mod reports;

pub use self::csv::contributions_csv;
pub use organize::{
    FOLDER_TITLE_MAX, contribution_dir, create_layout, derive_sessions, group_by_date,
    write_contribution_json, write_json, write_text,
};
pub use render::{contribution_block, date_summary, overall_summary, strip_html};
pub use reports::{ReportOutcome, write_outputs};
