//! Per-file admission under scan-wide resource ceilings.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use foldscope_core::{ScanLimits, ScanWarning, Timestamps, WarningKind, format_size};

/// Path fragments that identify a synced cloud-storage folder.
pub const CLOUD_STORAGE_INDICATORS: &[&str] =
    &["OneDrive", "Dropbox", "Google Drive", "iCloudDrive", "Box"];

/// Check if a root path lives inside a synced cloud-storage folder.
///
/// Case-insensitive substring match, so any path segment containing a
/// provider name counts (including `sandbox` for `Box`).
pub fn is_cloud_storage(root: &Path) -> bool {
    let root = root.to_string_lossy().to_lowercase();
    CLOUD_STORAGE_INDICATORS
        .iter()
        .any(|indicator| root.contains(&indicator.to_lowercase()))
}

/// Outcome of running one candidate through the guard.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// The file is in; its size has been charged to the running total.
    Admit { size: u64, timestamps: Timestamps },
    /// The file is out. `warning` is `None` when the reason was already
    /// reported earlier in the scan.
    Skip {
        reason: WarningKind,
        warning: Option<ScanWarning>,
    },
}

impl Admission {
    fn skip(warning: ScanWarning) -> Self {
        Admission::Skip {
            reason: warning.kind,
            warning: Some(warning),
        }
    }

    /// Check if the candidate was admitted.
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admit { .. })
    }
}

/// Decides skip-or-admit for each candidate and tracks admitted bytes.
#[derive(Debug)]
pub struct ResourceGuard {
    limits: ScanLimits,
    cloud_storage: bool,
    admitted_bytes: u64,
    size_limit_reported: bool,
}

impl ResourceGuard {
    pub fn new(limits: ScanLimits, cloud_storage: bool) -> Self {
        Self {
            limits,
            cloud_storage,
            admitted_bytes: 0,
            size_limit_reported: false,
        }
    }

    /// Bytes admitted so far.
    pub fn admitted_bytes(&self) -> u64 {
        self.admitted_bytes
    }

    pub fn is_cloud_storage(&self) -> bool {
        self.cloud_storage
    }

    /// Run the admission checks for one path, in order, stopping at the
    /// first that fails.
    pub fn admit(&mut self, path: &Path) -> Admission {
        let link_metadata = match std::fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                return Admission::skip(ScanWarning::unreadable(path, &err));
            }
            Err(err) => return Admission::skip(ScanWarning::admission_error(path, err)),
        };

        if link_metadata.file_type().is_symlink() {
            return Admission::skip(ScanWarning::symlink(path));
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(err) => return Admission::skip(ScanWarning::unreadable(path, &err)),
        };

        let metadata = match file.metadata() {
            Ok(m) => m,
            Err(_) => return Admission::skip(ScanWarning::metadata_error(path)),
        };
        let size = metadata.len();

        if self.cloud_storage && size > self.limits.cloud_max_file_bytes {
            return Admission::skip(ScanWarning::new(
                path,
                format!(
                    "Skipping large cloud file ({}): {}",
                    format_size(size),
                    path.display()
                ),
                WarningKind::CloudFileTooLarge,
            ));
        }

        if self.admitted_bytes.saturating_add(size) > self.limits.max_total_bytes {
            let warning = (!self.size_limit_reported).then(|| {
                self.size_limit_reported = true;
                ScanWarning::new(
                    path,
                    format!(
                        "Size limit reached ({})",
                        format_size(self.limits.max_total_bytes)
                    ),
                    WarningKind::SizeLimit,
                )
            });
            return Admission::Skip {
                reason: WarningKind::SizeLimit,
                warning,
            };
        }

        self.admitted_bytes += size;
        Admission::Admit {
            size,
            timestamps: Timestamps::new(
                metadata.modified().unwrap_or(std::time::UNIX_EPOCH),
                metadata.created().ok(),
            ),
        }
    }
}
