//! Pipeline orchestration for indicoharvest.
//!
//! Ties the listing client, detail parser, attachment downloader, and
//! organizer/writer together into the end-to-end `run_harvest` workflow.

pub mod pipeline;

pub use pipeline::{HarvestResult, ProgressReporter, SilentProgress, run_harvest};
