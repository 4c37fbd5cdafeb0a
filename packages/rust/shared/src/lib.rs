//! Shared types, error model, and configuration for indicoharvest.
//!
//! This crate is the foundation depended on by all other indicoharvest
//! crates. It provides:
//! - [`HarvestError`] — the unified error type
//! - Domain types ([`ContributionRecord`], [`AttachmentRecord`],
//!   [`SessionRecord`], [`EventInfo`], [`RunStats`])
//! - Configuration ([`AppConfig`], [`HarvestConfig`], config loading)
//! - Filename sanitization ([`safe_filename`])

pub mod config;
pub mod error;
pub mod sanitize;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, EventConfig, FetchConfig, HarvestConfig, LimitsConfig, RetryPolicy, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{HarvestError, Result};
pub use sanitize::{MAX_FILENAME_LEN, safe_filename, safe_filename_with_limit, with_counter_suffix};
pub use types::{
    AttachmentRecord, ContributionRecord, ContributionType, DownloadOutcome, EventInfo, Person,
    RunStats, SessionRecord,
};
