//! Handle-keyed registry of scans with a single admission slot.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, JoinHandle};

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use foldscope_core::{ScanError, ScanHandle, ScanLimits, ScanReport};

use crate::progress::{ProgressSnapshot, ProgressTracker};
use crate::scanner::TraversalEngine;

/// Bookkeeping for one registered scan.
#[derive(Debug)]
struct ScanEntry {
    root: PathBuf,
    progress: Arc<ProgressTracker>,
    cancel: CancellationToken,
    report: OnceLock<Arc<ScanReport>>,
    exited: Mutex<bool>,
    exit_signal: Condvar,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ScanEntry {
    fn new(root: PathBuf, progress: Arc<ProgressTracker>, cancel: CancellationToken) -> Self {
        Self {
            root,
            progress,
            cancel,
            report: OnceLock::new(),
            exited: Mutex::new(false),
            exit_signal: Condvar::new(),
            worker: Mutex::new(None),
        }
    }

    fn mark_exited(&self) {
        *lock(&self.exited) = true;
        self.exit_signal.notify_all();
    }

    /// Block until the worker has stored its report or died trying.
    fn wait_exited(&self) {
        let mut exited = lock(&self.exited);
        while !*exited {
            exited = self
                .exit_signal
                .wait(exited)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Frees the admission slot and signals waiters when the worker exits,
/// even by panic.
struct WorkerExit {
    slot: Arc<Mutex<Option<ScanHandle>>>,
    handle: ScanHandle,
    entry: Arc<ScanEntry>,
}

impl Drop for WorkerExit {
    fn drop(&mut self) {
        {
            let mut active = lock(&self.slot);
            if *active == Some(self.handle) {
                *active = None;
            }
        }
        self.entry.mark_exited();
    }
}

/// Runs scans on background threads and tracks them by handle.
///
/// At most one scan is active at a time; a second [`ScanRegistry::start_scan`]
/// while one runs is rejected with [`ScanError::ScanInProgress`] and it is up
/// to the caller to retry or queue. Finished scans stay queryable until
/// [`ScanRegistry::forget`] is called.
#[derive(Debug, Default)]
pub struct ScanRegistry {
    scans: DashMap<ScanHandle, Arc<ScanEntry>>,
    active: Arc<Mutex<Option<ScanHandle>>>,
    next_id: AtomicU64,
}

impl ScanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `root` and start scanning it on a background thread.
    pub fn start_scan(
        &self,
        root: impl AsRef<Path>,
        limits: ScanLimits,
    ) -> Result<ScanHandle, ScanError> {
        let engine = TraversalEngine::new(root, limits)?;

        let handle = {
            let mut active = lock(&self.active);
            if let Some(active) = *active {
                return Err(ScanError::ScanInProgress { active });
            }
            let handle = ScanHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
            *active = Some(handle);
            handle
        };

        let entry = Arc::new(ScanEntry::new(
            engine.root().to_path_buf(),
            engine.progress(),
            engine.cancel_token(),
        ));
        self.scans.insert(handle, Arc::clone(&entry));

        // Dropping the closure on spawn failure releases the slot.
        let exit = WorkerExit {
            slot: Arc::clone(&self.active),
            handle,
            entry: Arc::clone(&entry),
        };
        let spawned = thread::Builder::new()
            .name(format!("foldscope-scan-{}", handle.0))
            .spawn(move || {
                let report = engine.run();
                let _ = exit.entry.report.set(Arc::new(report));
                drop(exit);
            });

        let worker = match spawned {
            Ok(worker) => worker,
            Err(source) => {
                self.scans.remove(&handle);
                return Err(ScanError::WorkerSpawn { source });
            }
        };
        *lock(&entry.worker) = Some(worker);

        tracing::debug!(%handle, "scan registered");
        Ok(handle)
    }

    /// Current progress of a scan.
    ///
    /// A terminal snapshot is only returned once the report is available
    /// through [`ScanRegistry::result`].
    pub fn poll(&self, handle: ScanHandle) -> Result<ProgressSnapshot, ScanError> {
        let entry = self.entry(handle)?;
        let snapshot = entry.progress.snapshot();
        if snapshot.is_finished() {
            entry.wait_exited();
        }
        Ok(snapshot)
    }

    /// Subscribe to pushed progress updates for a scan.
    pub fn subscribe(
        &self,
        handle: ScanHandle,
    ) -> Result<broadcast::Receiver<ProgressSnapshot>, ScanError> {
        Ok(self.entry(handle)?.progress.subscribe())
    }

    /// Request cancellation. Idempotent; a no-op once the scan has finished.
    pub fn cancel(&self, handle: ScanHandle) -> Result<(), ScanError> {
        let entry = self.entry(handle)?;
        if entry.report.get().is_none() {
            tracing::debug!(%handle, "cancellation requested");
            entry.cancel.cancel();
        }
        Ok(())
    }

    /// Final report of a finished scan.
    pub fn result(&self, handle: ScanHandle) -> Result<Arc<ScanReport>, ScanError> {
        self.entry(handle)?
            .report
            .get()
            .cloned()
            .ok_or(ScanError::NotReady { handle })
    }

    /// Block until the scan's worker exits, then return its report.
    ///
    /// Safe to call from several threads; only the first joins the worker.
    pub fn wait(&self, handle: ScanHandle) -> Result<Arc<ScanReport>, ScanError> {
        let entry = self.entry(handle)?;

        let worker = lock(&entry.worker).take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                tracing::error!(%handle, root = %entry.root.display(), "scan worker panicked");
            }
        }
        entry.wait_exited();

        entry
            .report
            .get()
            .cloned()
            .ok_or(ScanError::NotReady { handle })
    }

    /// Drop a finished scan and hand back its report.
    pub fn forget(&self, handle: ScanHandle) -> Result<Arc<ScanReport>, ScanError> {
        let report = self.result(handle)?;
        self.scans.remove(&handle);
        Ok(report)
    }

    /// Handle of the scan currently holding the admission slot.
    pub fn active(&self) -> Option<ScanHandle> {
        *lock(&self.active)
    }

    /// Canonical root of a registered scan.
    pub fn root(&self, handle: ScanHandle) -> Result<PathBuf, ScanError> {
        Ok(self.entry(handle)?.root.clone())
    }

    fn entry(&self, handle: ScanHandle) -> Result<Arc<ScanEntry>, ScanError> {
        self.scans
            .get(&handle)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(ScanError::NoActiveScan { handle })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
