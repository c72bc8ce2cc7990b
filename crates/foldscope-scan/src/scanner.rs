//! Bounded depth-first traversal engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use jwalk::{Parallelism, WalkDir};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use foldscope_analyze::{ContentClassifier, RelationGrouper, media};
use foldscope_core::{
    Aggregate, FileRecord, ScanError, ScanLimits, ScanReport, ScanWarning, Stage, Timestamps,
    WarningKind, format_size,
};

use crate::guard::{Admission, ResourceGuard, is_cloud_storage};
use crate::progress::{ProgressSnapshot, ProgressTracker};
use crate::project::detect_project_type;

/// A file that passed the resource guard and awaits analysis.
#[derive(Debug)]
struct Candidate {
    path: PathBuf,
    size: u64,
    timestamps: Timestamps,
}

/// Walks a root directory, admitting files through a [`ResourceGuard`] and
/// folding each admitted file into an [`Aggregate`].
///
/// One engine runs one scan. Files are processed sequentially on the calling
/// thread; progress and cancellation are shared through
/// [`TraversalEngine::progress`] and [`TraversalEngine::cancel_token`].
#[derive(Debug)]
pub struct TraversalEngine {
    root: PathBuf,
    limits: ScanLimits,
    cloud_storage: bool,
    classifier: ContentClassifier,
    grouper: RelationGrouper,
    progress: Arc<ProgressTracker>,
    cancel: CancellationToken,
}

impl TraversalEngine {
    /// Prepare a scan of `root`.
    ///
    /// Fails if the limits are invalid or the root is missing or not a
    /// directory. Cloud-storage detection runs here, once.
    pub fn new(root: impl AsRef<Path>, limits: ScanLimits) -> Result<Self, ScanError> {
        limits
            .validate()
            .map_err(|message| ScanError::InvalidConfig { message })?;

        let root = root.as_ref();
        let root = root
            .canonicalize()
            .map_err(|e| ScanError::invalid_root(root, &e))?;
        if !root.is_dir() {
            return Err(ScanError::not_a_directory(root));
        }

        let cloud_storage = is_cloud_storage(&root);
        Ok(Self {
            root,
            limits,
            cloud_storage,
            classifier: ContentClassifier::new(),
            grouper: RelationGrouper::new(),
            progress: Arc::new(ProgressTracker::new()),
            cancel: CancellationToken::new(),
        })
    }

    /// Use a custom classifier.
    pub fn with_classifier(mut self, classifier: ContentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Use a custom relation grouper.
    pub fn with_grouper(mut self, grouper: RelationGrouper) -> Self {
        self.grouper = grouper;
        self
    }

    /// Canonical scan root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn limits(&self) -> &ScanLimits {
        &self.limits
    }

    pub fn is_cloud_storage(&self) -> bool {
        self.cloud_storage
    }

    /// Shared progress state for this scan.
    pub fn progress(&self) -> Arc<ProgressTracker> {
        Arc::clone(&self.progress)
    }

    /// Subscribe to progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressSnapshot> {
        self.progress.subscribe()
    }

    /// Token that stops the scan at the next check point when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the scan to a terminal stage.
    ///
    /// Never fails: per-file problems and hit ceilings become warnings, and
    /// cancellation yields the partial aggregate built so far.
    pub fn run(self) -> ScanReport {
        let started_at = SystemTime::now();
        let start = Instant::now();
        tracing::debug!(root = %self.root.display(), cloud = self.cloud_storage, "scan started");

        if self.cloud_storage {
            self.warn(ScanWarning::new(
                &self.root,
                format!(
                    "Analyzing cloud storage folder. Files larger than {} will be skipped to prevent long downloads.",
                    format_size(self.limits.cloud_max_file_bytes)
                ),
                WarningKind::CloudStorage,
            ));
        }

        self.enter(Stage::DetectingProjectType);
        let project_type = detect_project_type(&self.root);
        tracing::debug!(%project_type, "project type detected");

        self.enter(Stage::CountingFiles);
        let mut timed_out = false;
        let candidates = self.collect_candidates(start, &mut timed_out);

        let mut aggregate = Aggregate::new(project_type);
        let total = candidates.len() as u64;
        let mut processed = 0u64;
        let mut cancelled = self.cancel.is_cancelled();

        if !cancelled {
            tracing::debug!(candidates = total, "analyzing files");
            self.progress.begin_analysis(total);

            for candidate in candidates {
                if self.cancel.is_cancelled() {
                    cancelled = true;
                    break;
                }
                if self.check_timeout(start, &mut timed_out) {
                    break;
                }

                let relative = self.relative_path(&candidate.path);
                self.progress.set_current(processed + 1, &relative);
                let record = self.analyze(candidate, relative, &mut aggregate);
                aggregate.record(record);
                processed += 1;
            }
        }

        let stage = if cancelled {
            self.progress.finish(Stage::Cancelled, processed, total);
            Stage::Cancelled
        } else {
            let stage = Stage::finished(self.progress.has_warnings());
            self.progress.finish(stage, processed, processed);
            stage
        };

        let warnings = self.progress.warnings();
        tracing::info!(
            root = %self.root.display(),
            %stage,
            files = aggregate.total_files,
            bytes = aggregate.total_bytes,
            warnings = warnings.len(),
            "scan finished"
        );

        ScanReport {
            root_path: self.root,
            started_at,
            completed_at: SystemTime::now(),
            duration: start.elapsed(),
            stage,
            limits: self.limits,
            cloud_storage: self.cloud_storage,
            warnings,
            aggregate,
        }
    }

    /// Enumerate regular files depth-first and run each through the guard.
    fn collect_candidates(&self, start: Instant, timed_out: &mut bool) -> Vec<Candidate> {
        let walker = WalkDir::new(&self.root)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(false)
            .follow_links(false);

        let mut guard = ResourceGuard::new(self.limits, self.cloud_storage);
        let mut candidates = Vec::new();

        for entry_result in walker {
            if self.cancel.is_cancelled() || self.check_timeout(start, timed_out) {
                break;
            }

            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    self.warn(ScanWarning::read_error(path, &err));
                    continue;
                }
            };

            let file_type = entry.file_type();
            if !file_type.is_file() && !file_type.is_symlink() {
                continue;
            }

            let path = entry.path();
            let relative = self.relative_path(&path);
            match guard.admit(&path) {
                Admission::Admit { size, timestamps } => candidates.push(Candidate {
                    path,
                    size,
                    timestamps,
                }),
                Admission::Skip { reason, warning } => {
                    tracing::debug!(path = %path.display(), ?reason, "skipped");
                    if let Some(warning) = warning {
                        if reason == WarningKind::SizeLimit {
                            tracing::warn!(max_bytes = self.limits.max_total_bytes, "size limit reached");
                        }
                        self.warn(warning);
                    }
                }
            }
            // Total stays 0 until analysis begins.
            self.progress.set_current(candidates.len() as u64, &relative);

            if candidates.len() as u64 >= self.limits.max_files {
                tracing::warn!(max_files = self.limits.max_files, "file limit reached");
                self.warn(ScanWarning::new(
                    &self.root,
                    format!("File limit reached ({} files)", self.limits.max_files),
                    WarningKind::FileLimit,
                ));
                break;
            }
        }

        candidates
    }

    fn analyze(&self, candidate: Candidate, relative: String, aggregate: &mut Aggregate) -> FileRecord {
        let media_type = media::detect(&candidate.path);
        let analysis = self.classifier.classify(&candidate.path, &media_type);
        self.grouper.group(&mut aggregate.related_files, &relative);

        FileRecord::new(
            relative,
            candidate.path,
            candidate.size,
            candidate.timestamps,
            media_type,
            analysis,
        )
    }

    /// Check the wall-clock ceiling, recording the timeout warning once.
    fn check_timeout(&self, start: Instant, timed_out: &mut bool) -> bool {
        if start.elapsed() <= self.limits.max_duration {
            return false;
        }
        if !*timed_out {
            *timed_out = true;
            let secs = self.limits.max_duration.as_secs();
            tracing::warn!(secs, "scan timed out");
            self.warn(ScanWarning::new(
                &self.root,
                format!("Analysis timeout after {secs} seconds"),
                WarningKind::Timeout,
            ));
        }
        true
    }

    fn relative_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }

    fn enter(&self, stage: Stage) {
        tracing::debug!(%stage, "stage");
        self.progress.set_stage(stage);
    }

    fn warn(&self, warning: ScanWarning) {
        tracing::debug!(kind = ?warning.kind, "{}", warning.message);
        self.progress.warn(warning);
    }
}
