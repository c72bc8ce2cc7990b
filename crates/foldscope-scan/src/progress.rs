//! Scan progress reporting.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::broadcast;

use foldscope_core::{ScanWarning, Stage};

/// Capacity of the progress broadcast channel.
const PROGRESS_CHANNEL_SIZE: usize = 100;

/// Point-in-time view of a scan's progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    /// Current lifecycle stage.
    pub stage: Stage,
    /// Candidates admitted so far while counting, index of the file being
    /// analyzed (1-based) during analysis, or files processed once finished.
    pub current: u64,
    /// Number of candidate files.
    pub total: u64,
    /// Root-relative path of the file in flight.
    pub current_file: String,
    /// Time since the scan started; stops at a terminal stage.
    pub elapsed: Duration,
    /// Warnings recorded so far, oldest first.
    pub warnings: Vec<ScanWarning>,
}

impl ProgressSnapshot {
    /// Completion percentage, 0 when the total is not yet known.
    pub fn percentage(&self) -> f64 {
        if self.total > 0 {
            self.current as f64 / self.total as f64 * 100.0
        } else {
            0.0
        }
    }

    pub fn is_finished(&self) -> bool {
        self.stage.is_terminal()
    }
}

#[derive(Debug)]
struct ProgressState {
    stage: Stage,
    current: u64,
    total: u64,
    current_file: String,
    started: Instant,
    frozen_elapsed: Option<Duration>,
    warnings: Vec<ScanWarning>,
}

impl ProgressState {
    fn elapsed(&self) -> Duration {
        self.frozen_elapsed.unwrap_or_else(|| self.started.elapsed())
    }

    fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            stage: self.stage,
            current: self.current,
            total: self.total,
            current_file: self.current_file.clone(),
            elapsed: self.elapsed(),
            warnings: self.warnings.clone(),
        }
    }
}

/// Shared progress state for one scan.
///
/// The traversal engine is the only writer; any number of threads may read
/// snapshots or subscribe to pushed updates. Once a terminal stage is set the
/// tracker is frozen and further updates are ignored.
#[derive(Debug)]
pub struct ProgressTracker {
    state: RwLock<ProgressState>,
    progress_tx: broadcast::Sender<ProgressSnapshot>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(PROGRESS_CHANNEL_SIZE);
        Self {
            state: RwLock::new(ProgressState {
                stage: Stage::Initializing,
                current: 0,
                total: 0,
                current_file: String::new(),
                started: Instant::now(),
                frozen_elapsed: None,
                warnings: Vec::new(),
            }),
            progress_tx,
        }
    }

    /// Subscribe to progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressSnapshot> {
        self.progress_tx.subscribe()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.read().snapshot()
    }

    pub fn stage(&self) -> Stage {
        self.read().stage
    }

    /// All warnings recorded so far.
    pub fn warnings(&self) -> Vec<ScanWarning> {
        self.read().warnings.clone()
    }

    pub fn has_warnings(&self) -> bool {
        !self.read().warnings.is_empty()
    }

    /// Move to a non-terminal stage.
    pub fn set_stage(&self, stage: Stage) {
        self.update(|state| state.stage = stage);
    }

    /// Enter the analysis stage with the number of candidates.
    pub fn begin_analysis(&self, total: u64) {
        self.update(|state| {
            state.stage = Stage::AnalyzingFiles;
            state.current = 0;
            state.total = total;
        });
    }

    /// Record the file about to be analyzed.
    pub fn set_current(&self, current: u64, file: &str) {
        self.update(|state| {
            state.current = current;
            state.current_file.clear();
            state.current_file.push_str(file);
        });
    }

    /// Append a warning.
    pub fn warn(&self, warning: ScanWarning) {
        self.update(|state| state.warnings.push(warning));
    }

    /// Enter a terminal stage with final counts and freeze the tracker.
    pub fn finish(&self, stage: Stage, current: u64, total: u64) {
        self.update(|state| {
            state.stage = stage;
            state.current = current;
            state.total = total;
            state.current_file.clear();
            state.frozen_elapsed = Some(state.started.elapsed());
        });
    }

    fn update(&self, apply: impl FnOnce(&mut ProgressState)) {
        let snapshot = {
            let mut state = self.write();
            if state.stage.is_terminal() {
                return;
            }
            apply(&mut state);
            (self.progress_tx.receiver_count() > 0).then(|| state.snapshot())
        };

        if let Some(snapshot) = snapshot {
            let _ = self.progress_tx.send(snapshot);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ProgressState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ProgressState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
