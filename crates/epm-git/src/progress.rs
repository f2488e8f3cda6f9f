use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A single transfer-progress snapshot, as handed to the caller's
/// progress callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitProgress {
    pub received_bytes: usize,
    pub total_objects: usize,
    pub indexed_objects: usize,
    pub received_objects: usize,
    pub local_objects: usize,
    pub total_deltas: usize,
    pub indexed_deltas: usize,
}

impl From<git2::Progress<'_>> for GitProgress {
    fn from(p: git2::Progress<'_>) -> Self {
        Self {
            received_bytes: p.received_bytes(),
            total_objects: p.total_objects(),
            indexed_objects: p.indexed_objects(),
            received_objects: p.received_objects(),
            local_objects: p.local_objects(),
            total_deltas: p.total_deltas(),
            indexed_deltas: p.indexed_deltas(),
        }
    }
}

/// Shared state between a fetch running on a worker thread and the
/// driving coroutine that samples it. The worker writes a snapshot and
/// flips `progress_update`; the driver swaps it back to `false` when it
/// consumes one. `complete` is set exactly once, after the worker thread
/// has finished and stashed its final result.
#[derive(Debug, Default)]
pub struct GitFetchContext {
    progress: Mutex<GitProgress>,
    progress_update: AtomicBool,
    complete: AtomicBool,
}

impl GitFetchContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, progress: GitProgress) {
        *self.progress.lock().unwrap_or_else(|e| e.into_inner()) = progress;
        self.progress_update.store(true, Ordering::Release);
    }

    /// Take the latest snapshot if the worker has posted one since the
    /// last call, clearing the flag. `None` means nothing new to report.
    pub fn take_if_updated(&self) -> Option<GitProgress> {
        if self.progress_update.swap(false, Ordering::AcqRel) {
            Some(*self.progress.lock().unwrap_or_else(|e| e.into_inner()))
        } else {
            None
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    pub(crate) fn mark_complete(&self) {
        self.complete.store(true, Ordering::Release);
    }
}
