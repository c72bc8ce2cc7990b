//! Scan ceilings.

use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default maximum number of files admitted into one scan.
pub const DEFAULT_MAX_FILES: u64 = 10_000;

/// Default maximum total bytes admitted into one scan (50 GiB).
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 50 * 1024 * 1024 * 1024;

/// Default wall-clock budget for one scan (15 minutes).
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(900);

/// Default per-file ceiling when the root lives on synced cloud storage (10 MiB).
pub const DEFAULT_CLOUD_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Hard resource ceilings for a scan.
///
/// Hitting a ceiling stops admission of further files; the scan itself still
/// completes with whatever was admitted so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanLimits {
    /// Maximum number of candidate files.
    #[builder(default = "DEFAULT_MAX_FILES")]
    #[serde(default = "default_max_files")]
    pub max_files: u64,

    /// Maximum sum of admitted file sizes, in bytes.
    #[builder(default = "DEFAULT_MAX_TOTAL_BYTES")]
    #[serde(default = "default_max_total_bytes")]
    pub max_total_bytes: u64,

    /// Maximum wall-clock time spent enumerating and analyzing.
    #[builder(default = "DEFAULT_MAX_DURATION")]
    #[serde(default = "default_max_duration")]
    pub max_duration: Duration,

    /// Maximum size of a single file when the root is on cloud storage.
    #[builder(default = "DEFAULT_CLOUD_MAX_FILE_BYTES")]
    #[serde(default = "default_cloud_max_file_bytes")]
    pub cloud_max_file_bytes: u64,
}

fn default_max_files() -> u64 {
    DEFAULT_MAX_FILES
}

fn default_max_total_bytes() -> u64 {
    DEFAULT_MAX_TOTAL_BYTES
}

fn default_max_duration() -> Duration {
    DEFAULT_MAX_DURATION
}

fn default_cloud_max_file_bytes() -> u64 {
    DEFAULT_CLOUD_MAX_FILE_BYTES
}

impl ScanLimitsBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.max_files == Some(0) {
            return Err("max_files must be positive".to_string());
        }
        if self.max_total_bytes == Some(0) {
            return Err("max_total_bytes must be positive".to_string());
        }
        if self.max_duration == Some(Duration::ZERO) {
            return Err("max_duration must be positive".to_string());
        }
        if self.cloud_max_file_bytes == Some(0) {
            return Err("cloud_max_file_bytes must be positive".to_string());
        }
        Ok(())
    }
}

impl ScanLimits {
    /// Create a new limits builder.
    pub fn builder() -> ScanLimitsBuilder {
        ScanLimitsBuilder::default()
    }

    /// Check that every ceiling is positive.
    ///
    /// Limits built through [`ScanLimits::builder`] are already validated;
    /// this covers values deserialized or constructed literally.
    pub fn validate(&self) -> Result<(), String> {
        ScanLimitsBuilder {
            max_files: Some(self.max_files),
            max_total_bytes: Some(self.max_total_bytes),
            max_duration: Some(self.max_duration),
            cloud_max_file_bytes: Some(self.cloud_max_file_bytes),
        }
        .validate()
    }
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            max_duration: DEFAULT_MAX_DURATION,
            cloud_max_file_bytes: DEFAULT_CLOUD_MAX_FILE_BYTES,
        }
    }
}
