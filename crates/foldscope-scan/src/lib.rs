//! Bounded directory scanning engine for foldscope.
//!
//! # Overview
//!
//! `foldscope-scan` walks a directory tree under hard resource ceilings and
//! folds every admitted file into an [`Aggregate`]:
//!
//! - **Resource guard** - symlink, readability, cloud-storage and total-size
//!   checks per candidate file
//! - **Project detection** - marker files at the root
//! - **Traversal engine** - depth-first enumeration, then sequential
//!   classification and grouping of each candidate
//! - **Progress** - pollable snapshots plus broadcast updates
//! - **Registry** - handle-keyed background scans with a single admission slot
//!
//! # Example
//!
//! ```rust,no_run
//! use foldscope_scan::{ScanLimits, TraversalEngine};
//!
//! let engine = TraversalEngine::new("/path/to/scan", ScanLimits::default()).unwrap();
//! let report = engine.run();
//!
//! println!("Total files: {}", report.aggregate.total_files);
//! println!("Stage: {}", report.stage);
//! ```
//!
//! # Background scans
//!
//! ```rust,no_run
//! use foldscope_scan::{ScanLimits, ScanRegistry};
//!
//! let registry = ScanRegistry::new();
//! let handle = registry.start_scan("/path/to/scan", ScanLimits::default()).unwrap();
//!
//! let progress = registry.poll(handle).unwrap();
//! println!("{} ({:.0}%)", progress.stage, progress.percentage());
//!
//! let report = registry.wait(handle).unwrap();
//! println!("{} files", report.aggregate.total_files);
//! ```

mod guard;
mod progress;
mod project;
mod registry;
mod scanner;

pub use guard::{Admission, CLOUD_STORAGE_INDICATORS, ResourceGuard, is_cloud_storage};
pub use progress::{ProgressSnapshot, ProgressTracker};
pub use project::{PROJECT_SIGNATURES, detect_project_type};
pub use registry::ScanRegistry;
pub use scanner::TraversalEngine;

// Re-export core types for convenience
pub use foldscope_core::{
    Aggregate, FileRecord, ProjectType, ScanError, ScanHandle, ScanLimits, ScanReport,
    ScanWarning, Stage, WarningKind,
};
