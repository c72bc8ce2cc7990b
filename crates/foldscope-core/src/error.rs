//! Error and warning types for scanning operations.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::handle::ScanHandle;

/// Errors that can occur when starting or querying a scan.
///
/// Only root validation is fatal for a scan itself; everything that goes
/// wrong with individual files is reported as a [`ScanWarning`].
#[derive(Debug, Error)]
pub enum ScanError {
    /// Root path is missing or not a directory.
    #[error("Invalid scan root {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    /// Invalid scan limits.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Another scan holds the admission slot.
    #[error("A scan is already running ({active})")]
    ScanInProgress { active: ScanHandle },

    /// Handle is unknown to the registry.
    #[error("No active scan for {handle}")]
    NoActiveScan { handle: ScanHandle },

    /// Scan has not reached a terminal stage yet.
    #[error("Scan {handle} has not finished")]
    NotReady { handle: ScanHandle },

    /// Background worker could not be started.
    #[error("Failed to start scan worker: {source}")]
    WorkerSpawn {
        #[source]
        source: std::io::Error,
    },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Create an invalid-root error from an I/O failure.
    pub fn invalid_root(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        let reason = match source.kind() {
            std::io::ErrorKind::NotFound => "path does not exist".to_string(),
            std::io::ErrorKind::PermissionDenied => "permission denied".to_string(),
            _ => source.to_string(),
        };
        Self::InvalidRoot {
            path: path.into(),
            reason,
        }
    }

    /// Create a not-a-directory error.
    pub fn not_a_directory(path: impl Into<PathBuf>) -> Self {
        Self::InvalidRoot {
            path: path.into(),
            reason: "not a directory".to_string(),
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// Symbolic link skipped.
    Symlink,
    /// Entry missing or not readable.
    Unreadable,
    /// Size could not be determined.
    MetadataError,
    /// File exceeds the per-file ceiling on cloud storage.
    CloudFileTooLarge,
    /// Global size ceiling reached.
    SizeLimit,
    /// File-count ceiling reached.
    FileLimit,
    /// Time ceiling reached.
    Timeout,
    /// Root lives on synced cloud storage.
    CloudStorage,
    /// Directory could not be read during enumeration.
    ReadError,
    /// Unexpected failure while deciding admission.
    AdmissionError,
}

/// Non-fatal warning encountered during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred (the root for scan-wide warnings).
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a skipped-symlink warning.
    pub fn symlink(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Skipping symbolic link: {}", path.display()),
            path,
            kind: WarningKind::Symlink,
        }
    }

    /// Create an unreadable-entry warning.
    pub fn unreadable(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        Self {
            message: format!("Cannot read file: {} ({error})", path.display()),
            path,
            kind: WarningKind::Unreadable,
        }
    }

    /// Create a stat-failure warning.
    pub fn metadata_error(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Cannot access file: {}", path.display()),
            path,
            kind: WarningKind::MetadataError,
        }
    }

    /// Create a read error warning.
    pub fn read_error(path: impl Into<PathBuf>, error: impl fmt::Display) -> Self {
        let path = path.into();
        Self {
            message: format!("Read error at {}: {error}", path.display()),
            path,
            kind: WarningKind::ReadError,
        }
    }

    /// Create a generic admission failure warning.
    pub fn admission_error(path: impl Into<PathBuf>, error: impl fmt::Display) -> Self {
        let path = path.into();
        Self {
            message: format!("Error accessing {}: {error}", path.display()),
            path,
            kind: WarningKind::AdmissionError,
        }
    }
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
