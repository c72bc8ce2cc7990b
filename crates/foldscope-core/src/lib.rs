//! Core types for foldscope.
//!
//! This crate provides the data model shared by the analysis and scanning
//! crates: scan limits, per-file records, the running aggregate, lifecycle
//! stages, and error/warning types.

mod aggregate;
mod config;
mod error;
mod handle;
mod record;
mod stage;

pub use aggregate::{Aggregate, ProjectType, ScanReport, TOP_N};
pub use config::{
    DEFAULT_CLOUD_MAX_FILE_BYTES, DEFAULT_MAX_DURATION, DEFAULT_MAX_FILES, DEFAULT_MAX_TOTAL_BYTES,
    ScanLimits, ScanLimitsBuilder,
};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use handle::ScanHandle;
pub use record::{ConfigPurpose, ContentAnalysis, FileRecord, TextStats, Timestamps, format_size};
pub use stage::Stage;
