// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded worker pool.
//
// Jobs run on a dedicated rayon pool of a fixed size, one spawned task per
// job, and each result is sent back on a completion channel. The pool is
// consumed as an iterator that yields results in completion order. Dropping
// it (exhausted or not) cancels every job that has not started yet and waits
// for the running ones, so no job outlives the pool.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, unbounded};
use folio_core::error::{FolioError, Result};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, warn};

pub struct WorkerPool<T> {
    results: Receiver<T>,
    threads: ThreadPool,
    cancelled: Arc<AtomicBool>,
    total: usize,
    remaining: usize,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Start up to `size` workers running `job` over `items`.
    pub fn spawn<I, F>(size: usize, items: Vec<I>, job: F) -> Result<Self>
    where
        I: Send + 'static,
        F: Fn(I) -> T + Send + Sync + 'static,
    {
        if size == 0 {
            return Err(FolioError::InvalidConfig(
                "worker pool needs at least one worker".into(),
            ));
        }

        let total = items.len();
        let threads = ThreadPoolBuilder::new()
            .num_threads(size.min(total).max(1))
            .thread_name(|index| format!("folio-worker-{index}"))
            .panic_handler(|_| warn!("Worker panicked"))
            .build()
            .map_err(|err| FolioError::WorkerPool(format!("failed to build worker pool: {err}")))?;

        let (result_tx, results) = unbounded();
        let cancelled = Arc::new(AtomicBool::new(false));
        let job = Arc::new(job);
        for item in items {
            let result_tx = result_tx.clone();
            let cancelled = Arc::clone(&cancelled);
            let job = Arc::clone(&job);
            threads.spawn(move || {
                if cancelled.load(Ordering::Acquire) {
                    return;
                }
                let _ = result_tx.send(job(item));
            });
        }

        debug!(workers = threads.current_num_threads(), jobs = total, "Worker pool started");
        Ok(Self {
            results,
            threads,
            cancelled,
            total,
            remaining: total,
        })
    }
}

impl<T> WorkerPool<T> {
    /// Number of jobs submitted.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Jobs whose result has not been observed yet.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Number of jobs that may run at once.
    pub fn size(&self) -> usize {
        self.threads.current_num_threads()
    }
}

impl<T> Iterator for WorkerPool<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        match self.results.recv() {
            Ok(result) => {
                self.remaining -= 1;
                Some(Ok(result))
            }
            // Every task has finished with results still owed: one of them panicked.
            Err(_) => {
                let lost = std::mem::take(&mut self.remaining);
                Some(Err(FolioError::WorkerPool(format!(
                    "a worker stopped unexpectedly, {lost} job(s) did not complete"
                ))))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl<T> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        // Each task holds a sender until it returns; the channel disconnects
        // once the running ones finish and the cancelled ones are discarded.
        while self.results.recv().is_ok() {}
        debug!("Worker pool stopped");
    }
}
